pub mod app;
pub mod config;
pub mod error;
pub mod services;
pub mod startup;
pub mod util;

pub use app::{AppConfig, AppState};
pub use config::{ConfigLoad, TrackerConfig, load_or_create};
pub use error::{AppError, Result};
pub use services::{AppServices, BootstrapStatus, BootstrapSummary};
pub use startup::{AppPaths, default_app_data_dir, ensure_app_data_dir};
pub use util::time::{format_timestamp_ms, format_window};
