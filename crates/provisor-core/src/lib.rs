//! Identifier quoting and the account provisioning state machine

pub mod error;
pub mod ident;
pub mod plan;
pub mod report;
pub mod reserved;
pub mod sequencer;
pub mod session;

pub use error::*;
pub use ident::*;
pub use plan::*;
pub use report::*;
pub use reserved::*;
pub use sequencer::*;
pub use session::*;
