// Emissions map renderer
//
// Reads EIA commercial-sector CO2 emissions per state and year from a workbook
// and renders a Plotly choropleth with one selectable layer per year.

pub mod downloader;
pub mod map;
pub mod model;
pub mod render;
pub mod spreadsheet;
pub mod states;

pub use downloader::{DownloadError, SpreadsheetDownloader};
pub use map::{ChoroplethMap, RenderReport};
pub use model::{EmissionsRow, ExcludedRow, ExclusionReason};
pub use render::{render_html, write_html, RenderError, RenderOptions};
pub use spreadsheet::{SheetData, SpreadsheetError, SpreadsheetLoader};
