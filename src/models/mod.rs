//! Data models

pub mod user;
pub mod audit_log;
pub mod routine;

pub use user::*;
pub use audit_log::*;
pub use routine::*;
