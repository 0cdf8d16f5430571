pub mod config;
pub mod crawler;
pub mod emissions;
pub mod fetch_error;
pub mod logging;
pub mod utils;
