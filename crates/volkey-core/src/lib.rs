pub mod config;
pub mod error;
pub mod types;

pub use error::{VolkeyError, VolkeyResult};
pub use types::{ConfigDocument, ConfigValue, KeyMaterial};
