pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod report;

pub use config::Config;
pub use document::*;
pub use error::*;
pub use model::{ModelProfile, ModelRegistry};
pub use report::*;
