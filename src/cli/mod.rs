//! CLI command implementations

pub mod chat;
pub mod context;
pub mod history;
pub mod info;
