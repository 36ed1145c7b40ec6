//! HTTP handlers

pub mod health;
pub mod roles;
pub mod users;
pub mod logs;
pub mod routines;
