pub mod config;
pub mod logging;
pub mod token_store;

pub use config::{Config, ConfigError, CorsConfig, RetrievalConfig, ServerConfig};
pub use logging::init_tracing;
pub use token_store::InMemoryTokenStore;
