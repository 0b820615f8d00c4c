pub mod auth;
pub mod config;
pub mod error;
pub mod module;
pub mod types;

pub use auth::{Anonymous, AuthSession, FixedUser, SessionProvider, SessionUser, Unavailable};
pub use config::ServiceConfig;
pub use error::ServiceError;
pub use module::Module;
pub use types::{format_timestamp, new_id, now_utc, ActionResult};
