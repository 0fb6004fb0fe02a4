pub mod config;
pub mod diff;
pub mod error;
pub mod types;
pub mod value;

pub use config::*;
pub use diff::*;
pub use error::*;
pub use types::*;
pub use value::*;
