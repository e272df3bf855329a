pub mod config;
pub mod error;
pub mod time;
pub mod types;

pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, Result};
pub use time::GameTime;
