//! Shared configuration and logging for provisor

pub mod config;
pub mod observability;

pub use self::config::*;
pub use self::observability::*;
