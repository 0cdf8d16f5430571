use std::collections::HashSet;
use std::sync::OnceLock;

use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

/// Facility tiles on a datacenters.com locations index page
pub const LISTING_TILE_SELECTOR: &str = ".LocationsIndex__tiles__Sc6sW > div > a";

fn tile_selector() -> &'static Selector {
    static TILE: OnceLock<Selector> = OnceLock::new();
    TILE.get_or_init(|| Selector::parse(LISTING_TILE_SELECTOR).expect("static tile selector parses"))
}

/// Extract facility detail URLs from one listing page
///
/// Relative links are resolved against `page_url`. Duplicates keep their first position.
#[instrument(skip(html), fields(html_size = html.len(), page_url = %page_url))]
pub fn parse_listing(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for tile in document.select(tile_selector()) {
        let Some(href) = tile.value().attr("href").map(str::trim) else {
            debug!("Tile without href, skipping");
            continue;
        };
        if href.is_empty() {
            continue;
        }

        match page_url.join(href) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
            Err(e) => warn!("Skipping unparseable facility link '{}': {}", href, e),
        }
    }

    debug!("Found {} facility URLs", urls.len());
    urls
}
