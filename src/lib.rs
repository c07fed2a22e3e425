pub mod aggregate;
pub mod config;
pub mod config_file;
pub mod figures;
pub mod get_terminal_width;
pub mod ingest;
pub mod monitor;
pub mod render;
pub mod stats;
pub mod style;
pub mod utillib;
