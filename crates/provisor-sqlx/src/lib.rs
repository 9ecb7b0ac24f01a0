//! sqlx-backed database sessions for provisor

pub mod connection;

pub use connection::*;
