pub mod app_config;
pub mod config;
pub mod observation;
pub mod products;
pub mod site;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use observation::{format_price, ExtractionResult, PageFacts, NOT_AVAILABLE};
pub use products::{load_products, slugify, ProductDescriptor, ProductsFile};
pub use site::SiteId;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read products file {path}: {source}")]
    ProductsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse products file: {0}")]
    ProductsFileParse(#[from] serde_yaml::Error),

    #[error("products config validation failed: {0}")]
    Validation(String),
}
