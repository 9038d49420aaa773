pub mod config;
pub mod types;

pub use config::{PersistConfig, StorageConfig};
pub use types::*;
