//! Database session capability consumed by the sequencer

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::error::SessionError;
use crate::ident::Identifier;

/// A result row with every column decoded as text.
pub type Row = Vec<String>;

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub principal: String,
    pub credential: String,
    pub host: String,
    pub service: String,
}

impl ConnectionDescriptor {
    pub fn new(
        principal: &Identifier,
        credential: impl Into<String>,
        host: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            principal: principal.rendered().to_string(),
            credential: credential.into(),
            host: host.into(),
            service: service.into(),
        }
    }

    /// Descriptor text with the credential masked.
    pub fn redacted(&self) -> String {
        format!("{}/***@{}/{}", self.principal, self.host, self.service)
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}/{}", self.principal, self.credential, self.host, self.service)
    }
}

/// Opens sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Session>, SessionError>;
}

/// A live connection. One statement is in flight at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Session: Send {
    /// Check the server is reachable, failing once `timeout` elapses.
    async fn ping(&mut self, timeout: Duration) -> Result<(), SessionError>;

    /// Run a read-only query and collect every row.
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, SessionError>;

    /// Run a statement that returns no rows.
    async fn execute(&mut self, sql: &str) -> Result<(), SessionError>;

    /// Release the connection. Further calls are no-ops.
    async fn close(&mut self) -> Result<(), SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_format() {
        let descriptor = ConnectionDescriptor::new(
            &Identifier::resolve("select"),
            "tiger",
            "db.local:1521",
            "FREEPDB1",
        );
        assert_eq!(descriptor.to_string(), "\"select\"/tiger@db.local:1521/FREEPDB1");
        assert_eq!(descriptor.redacted(), "\"select\"/***@db.local:1521/FREEPDB1");
    }
}
