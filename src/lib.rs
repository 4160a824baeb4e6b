#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod driver;
pub mod extract;
pub mod formats;
pub mod http_driver;
pub mod logging;
pub mod numeral;
pub mod patterns;
pub mod reading;
pub mod sectors;
pub mod snapshot;
pub mod snapshot_driver;
pub mod snapshot_log;
pub mod static_page;
