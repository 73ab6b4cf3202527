//! # docrule-cli
//!
//! Command-line and HTTP front ends for docrule.
//!
//! - `docrule check` evaluates rules against a local PDF or text file
//! - `docrule serve` exposes `POST /api/check` for uploads

pub mod config;
pub mod extract;
pub mod output;
pub mod server;

pub use config::ServerConfig;
pub use extract::{ExtractError, ExtractedText, PdftotextExtractor, TextExtractor};
pub use output::{CheckReport, OutputFormat};
pub use server::{build_router, AppState, HttpServer};
