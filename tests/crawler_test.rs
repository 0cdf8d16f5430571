// End-to-end tests for DataCenterCrawler against a mocked locations site
// Uses mockito for HTTP mocking

use std::path::Path;

use datacenter_emissions::config::{CrawlerConfig, PageRange};
use datacenter_emissions::crawler::{CrawlError, DataCenterCrawler};
use mockito::{Matcher, Server, ServerGuard};

fn listing_page(links: &[&str]) -> String {
    let tiles: String = links
        .iter()
        .map(|href| format!(r#"<div class="tile"><a href="{href}">facility</a></div>"#))
        .collect();
    format!(
        r#"<html><body><main><div class="LocationsIndex__tiles__Sc6sW">{tiles}</div></main></body></html>"#
    )
}

fn facility_page(location_json: &str) -> String {
    format!(
        r#"<html><body>
<div class="page-wrapper">
<header>h</header><nav>n</nav><section>s</section><article>a</article><footer>f</footer>
<script type="application/json">{location_json}</script>
</div>
<script type="application/json" class="js-react-on-rails-component">{{"resources": [{{"id": 1, "created_at": "2021-05-06T07:08:09.000Z", "updated_at": "2024-01-02T03:04:05.000Z"}}]}}</script>
</body></html>"#
    )
}

fn config_for(server: &ServerGuard) -> CrawlerConfig {
    CrawlerConfig {
        listing_url: format!("{}/locations", server.url()),
        request_delay_ms: 0,
        timeout_secs: 5,
        ..CrawlerConfig::default()
    }
}

async fn mock_listing(server: &mut ServerGuard, page: &str, status: usize, body: String) -> mockito::Mock {
    server
        .mock("GET", "/locations")
        .match_query(Matcher::UrlEncoded("page".into(), page.into()))
        .with_status(status)
        .with_body(body)
        .create_async()
        .await
}

async fn mock_facility(server: &mut ServerGuard, path: &str, status: usize, body: String) -> mockito::Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_body(body)
        .create_async()
        .await
}

fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

async fn mock_site(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    vec![
        mock_listing(server, "1", 200, listing_page(&["/equinix-dc1", "/edge-7", "/broken"])).await,
        mock_listing(server, "2", 404, String::new()).await,
        mock_listing(server, "3", 200, listing_page(&["/equinix-dc1", "/cyrus-one"])).await,
        mock_facility(
            server,
            "/equinix-dc1",
            200,
            facility_page(
                r#"{"location": {"id": 1, "name": "Equinix DC1", "fullAddress": "21715 Filigree Ct, Ashburn, VA", "providerName": "Equinix", "totalPower": "36 MW", "city": "Ashburn"}}"#,
            ),
        )
        .await,
        mock_facility(
            server,
            "/edge-7",
            200,
            facility_page(r#"{"location": {"id": 2, "name": "Edge 7", "fullAddress": "Lagos, NG"}}"#),
        )
        .await,
        mock_facility(server, "/broken", 500, String::new()).await,
        mock_facility(
            server,
            "/cyrus-one",
            200,
            facility_page(
                r#"{"location": {"id": 3, "name": "CyrusOne Frankfurt", "fullAddress": "Frankfurt, DE", "providerName": "CyrusOne", "country": "Germany"}}"#,
            ),
        )
        .await,
    ]
}

#[tokio::test]
async fn test_crawl_writes_range_and_final_files() {
    let mut server = Server::new_async().await;
    let _mocks = mock_site(&mut server).await;

    let dir = tempfile::tempdir().unwrap();
    let crawler = DataCenterCrawler::new(&config_for(&server)).unwrap();
    let ranges = [PageRange::new(1, 2).unwrap(), PageRange::new(3, 3).unwrap()];

    let summary = crawler.crawl(&ranges, dir.path()).await.unwrap();

    assert_eq!(summary.records, 4);
    assert_eq!(summary.pages_ok, 2);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.facilities_failed, 1);
    assert_eq!(
        summary.files_written,
        vec![
            dir.path().join("data_page_1_to_2.csv"),
            dir.path().join("data_page_3_to_3.csv"),
            dir.path().join("final.csv"),
        ]
    );

    let first_range = read_csv(&dir.path().join("data_page_1_to_2.csv"));
    assert_eq!(first_range.len(), 3);
    let header = &first_range[0];
    assert_eq!(header.last().map(String::as_str), Some("city"));

    let col = |name: &str| header.iter().position(|h| h == name).unwrap();
    let dc1 = &first_range[1];
    assert_eq!(dc1[col("name")], "Equinix DC1");
    assert_eq!(dc1[col("location")], "21715 Filigree Ct, Ashburn, VA");
    assert_eq!(dc1[col("operator")], "Equinix");
    assert_eq!(dc1[col("capacity")], "36 MW");
    assert_eq!(dc1[col("created_at")], "2021-05-06");
    assert_eq!(dc1[col("updated_at")], "2024-01-02");
    assert_eq!(dc1[col("city")], "Ashburn");

    // Missing optional fields become empty cells
    let edge = &first_range[2];
    assert_eq!(edge[col("name")], "Edge 7");
    assert_eq!(edge[col("operator")], "");
    assert_eq!(edge[col("capacity")], "");
    assert_eq!(edge[col("city")], "");

    let merged = read_csv(&dir.path().join("final.csv"));
    assert_eq!(merged.len(), 5);
    let header = &merged[0];
    assert_eq!(&header[header.len() - 2..], &["city", "country"]);
    let names: Vec<&str> = merged[1..].iter().map(|r| r[1].as_str()).collect();
    assert_eq!(
        names,
        vec!["Equinix DC1", "Edge 7", "Equinix DC1", "CyrusOne Frankfurt"]
    );
}

#[tokio::test]
async fn test_crawl_output_is_reproducible() {
    let mut server = Server::new_async().await;
    let _mocks = mock_site(&mut server).await;
    let crawler = DataCenterCrawler::new(&config_for(&server)).unwrap();
    let ranges = [PageRange::new(1, 3).unwrap()];

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    crawler.crawl(&ranges, first.path()).await.unwrap();
    crawler.crawl(&ranges, second.path()).await.unwrap();

    assert_eq!(
        std::fs::read(first.path().join("final.csv")).unwrap(),
        std::fs::read(second.path().join("final.csv")).unwrap()
    );
}

#[tokio::test]
async fn test_range_without_reachable_pages_is_not_written() {
    let mut server = Server::new_async().await;
    let _mocks = mock_site(&mut server).await;
    let crawler = DataCenterCrawler::new(&config_for(&server)).unwrap();
    let ranges = [PageRange::new(2, 2).unwrap(), PageRange::new(3, 3).unwrap()];

    let dir = tempfile::tempdir().unwrap();
    let summary = crawler.crawl(&ranges, dir.path()).await.unwrap();

    assert!(!dir.path().join("data_page_2_to_2.csv").exists());
    assert!(dir.path().join("data_page_3_to_3.csv").exists());
    assert_eq!(summary.records, 2);
}

#[tokio::test]
async fn test_unreachable_target_is_fatal() {
    let config = CrawlerConfig {
        listing_url: "http://127.0.0.1:9/locations".to_string(),
        request_delay_ms: 0,
        timeout_secs: 2,
        ..CrawlerConfig::default()
    };
    let crawler = DataCenterCrawler::new(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let result = crawler
        .crawl(&[PageRange::new(1, 2).unwrap()], dir.path())
        .await;

    assert!(matches!(result, Err(CrawlError::SourceUnavailable { .. })));
    assert!(!dir.path().join("final.csv").exists());
}

#[tokio::test]
async fn test_fetch_listing_page_resolves_links() {
    let mut server = Server::new_async().await;
    let _mocks = mock_site(&mut server).await;
    let crawler = DataCenterCrawler::new(&config_for(&server)).unwrap();

    let urls = crawler.fetch_listing_page(3).await.unwrap();
    let expected = vec![
        format!("{}/equinix-dc1", server.url()),
        format!("{}/cyrus-one", server.url()),
    ];
    let got: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
    assert_eq!(got, expected);
}
