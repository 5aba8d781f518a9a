pub mod config;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{AgentwireError, Result};
pub use event::EventSink;
pub use traits::Tool;
pub use types::*;
