pub mod types;
pub mod config;
pub mod error;

pub use types::*;
pub use config::{AnalysisConfig, AspectMethod, InferenceConfig, ScraperConfig, ServiceConfig};
pub use error::{ReviewRadarError, Result};
