pub mod cipher;
pub mod config;
pub mod error;
pub mod file_config;
pub mod types;

pub use cipher::KeyCipher;
pub use config::AppConfig;
pub use error::{CipherError, CipherResult};
pub use file_config::{AssistantDefaults, FileConfig, ServerConfig};
pub use types::*;
