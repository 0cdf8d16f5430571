use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, instrument};

use crate::emissions::map::ChoroplethMap;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const PLOT_DIV_ID: &str = "emissions-map";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to render: no rows mapped to a known state within the year range")]
    NoData,

    #[error("Failed to serialize figure: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Page title; derived from the first and last year when unset
    pub title: Option<String>,
    pub colorscale: String,
    pub colorbar_title: String,
    pub plotly_src: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: None,
            colorscale: "Reds".to_string(),
            colorbar_title: "Emissions".to_string(),
            plotly_src: PLOTLY_CDN.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Figure<'a> {
    pub data: Vec<ChoroplethTrace<'a>>,
    pub layout: Layout,
}

#[derive(Debug, Serialize)]
pub struct ChoroplethTrace<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub locations: Vec<&'a str>,
    pub z: Vec<f64>,
    pub text: Vec<&'a str>,
    pub locationmode: &'static str,
    pub colorscale: String,
    pub zmin: f64,
    pub zmax: f64,
    pub colorbar: ColorBar,
    pub hoverinfo: &'static str,
    pub visible: bool,
}

#[derive(Debug, Serialize)]
pub struct ColorBar {
    pub title: Title,
}

#[derive(Debug, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Layout {
    pub title: Title,
    pub geo: Geo,
    pub sliders: Vec<Slider>,
}

#[derive(Debug, Serialize)]
pub struct Geo {
    pub scope: &'static str,
    pub projection: Projection,
    pub showframe: bool,
    pub showcoastlines: bool,
}

#[derive(Debug, Serialize)]
pub struct Projection {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Slider {
    pub active: usize,
    pub currentvalue: Value,
    pub pad: Value,
    pub steps: Vec<SliderStep>,
}

#[derive(Debug, Serialize)]
pub struct SliderStep {
    pub method: &'static str,
    pub label: String,
    /// `[trace restyle, layout relayout]` as Plotly's `update` method expects
    pub args: [Value; 2],
}

pub fn year_title(year: i32) -> String {
    format!("State-Level Emissions in the U.S. - Year {year}")
}

/// Build the Plotly figure: one hidden trace per year, first year visible, slider to switch
pub fn build_figure<'a>(map: &'a ChoroplethMap, options: &RenderOptions) -> Result<Figure<'a>, RenderError> {
    let (Some(zmin), Some(zmax)) = (map.zmin, map.zmax) else {
        return Err(RenderError::NoData);
    };
    let years = map.years();
    let (Some(first), Some(last)) = (years.first().copied(), years.last().copied()) else {
        return Err(RenderError::NoData);
    };

    let data = map
        .layers
        .iter()
        .enumerate()
        .map(|(idx, (year, layer))| ChoroplethTrace {
            kind: "choropleth",
            name: year.to_string(),
            locations: layer.entries.iter().map(|e| e.code).collect(),
            z: layer.entries.iter().map(|e| e.value).collect(),
            text: layer.entries.iter().map(|e| e.name).collect(),
            locationmode: "USA-states",
            colorscale: options.colorscale.clone(),
            zmin,
            zmax,
            colorbar: ColorBar {
                title: Title {
                    text: options.colorbar_title.clone(),
                },
            },
            hoverinfo: "location+z+text",
            visible: idx == 0,
        })
        .collect::<Vec<_>>();

    let steps = years
        .iter()
        .enumerate()
        .map(|(idx, year)| {
            let visible: Vec<bool> = (0..years.len()).map(|i| i == idx).collect();
            SliderStep {
                method: "update",
                label: year.to_string(),
                args: [
                    json!({ "visible": visible }),
                    json!({ "title.text": year_title(*year) }),
                ],
            }
        })
        .collect();

    let title = options.title.clone().unwrap_or_else(|| {
        format!("Interactive State-Level Emissions in the U.S. ({first}\u{2013}{last})")
    });

    Ok(Figure {
        data,
        layout: Layout {
            title: Title { text: title },
            geo: Geo {
                scope: "usa",
                projection: Projection { kind: "albers usa" },
                showframe: false,
                showcoastlines: true,
            },
            sliders: vec![Slider {
                active: 0,
                currentvalue: json!({ "prefix": "Year: " }),
                pad: json!({ "t": 50 }),
                steps,
            }],
        },
    })
}

/// Render a standalone HTML page embedding the figure
pub fn render_html(map: &ChoroplethMap, options: &RenderOptions) -> Result<String, RenderError> {
    let figure = build_figure(map, options)?;
    // "</" inside an inline script would close the tag early
    let figure_json = serde_json::to_string(&figure)?.replace("</", "<\\/");

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{src}" charset="utf-8"></script>
</head>
<body>
<div id="{div}" style="width:100%;height:90vh;"></div>
<script>
const figure = {figure_json};
Plotly.newPlot("{div}", figure.data, figure.layout, {{"responsive": true}});
</script>
</body>
</html>
"#,
        title = escape_html(&figure.layout.title.text),
        src = escape_html(&options.plotly_src),
        div = PLOT_DIV_ID,
    ))
}

/// Render and write the HTML page to `path`
#[instrument(skip(map, options), fields(path = %path.display()))]
pub fn write_html(path: &Path, map: &ChoroplethMap, options: &RenderOptions) -> Result<(), RenderError> {
    let html = render_html(map, options)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;

    info!(
        "Visualization has been saved to {}. Open this file in a browser to view the interactive map.",
        path.display()
    );
    Ok(())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
