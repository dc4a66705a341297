pub mod errors;
pub mod id;
pub mod types;

pub use errors::{ConfigError, InvalidModeError};
pub use id::{new_correlation_id, new_id, SessionId};
pub use types::RoutingMode;
