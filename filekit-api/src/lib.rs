//! # filekit-api
//!
//! REST API server for the filekit conversion tools
//!

mod api;
mod config;
mod error;

pub use api::{
    app, health_check, AppState, FormatRequest, FormatResponse, ToolResponse, UploadForm,
    UploadedFile,
};
pub use config::ServerConfig;
pub use error::{AppError, ErrorResponse};
