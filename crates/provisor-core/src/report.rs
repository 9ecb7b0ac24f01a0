//! Operator-facing output
//!
//! Everything the operator reads goes through [`Reporter`]. Logs are
//! separate and go through `tracing`.

use std::fmt;
use std::io::{self, Write};
use tracing::warn;

use crate::ident::Identifier;
use crate::plan::Step;
use crate::session::ConnectionDescriptor;

/// One row of the product component listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductComponent {
    pub product: String,
    pub version: String,
    pub status: String,
}

/// Sink for operator-visible progress.
pub trait Reporter: Send {
    fn descriptor(&mut self, descriptor: &ConnectionDescriptor);
    fn reachable(&mut self);
    fn version_banner(&mut self, lines: &[String]);
    fn instance_version(&mut self, version: &str);
    fn product_components(&mut self, rows: &[ProductComponent]);
    fn already_provisioned(&mut self, account: &Identifier);
    fn step_started(&mut self, step: &Step);
    fn step_finished(&mut self, step: &Step);

    /// Final confirmation. This is the only place the account credential
    /// is shown.
    fn account_created(&mut self, account: &Identifier, credential: &str);
}

/// Writes plain text reports to any [`Write`] target.
pub struct WriterReporter<W> {
    out: W,
    redact_credentials: bool,
}

impl WriterReporter<io::Stdout> {
    pub fn stdout(redact_credentials: bool) -> Self {
        Self::new(io::stdout(), redact_credentials)
    }
}

impl<W: Write> WriterReporter<W> {
    pub fn new(out: W, redact_credentials: bool) -> Self {
        Self {
            out,
            redact_credentials,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(args).and_then(|_| self.out.write_all(b"\n")) {
            warn!(error = %e, "Failed to write report line");
        }
    }
}

impl<W: Write + Send> Reporter for WriterReporter<W> {
    fn descriptor(&mut self, descriptor: &ConnectionDescriptor) {
        if self.redact_credentials {
            self.line(format_args!("{}", descriptor.redacted()));
        } else {
            self.line(format_args!("{descriptor}"));
        }
    }

    fn reachable(&mut self) {
        self.line(format_args!("Database is reachable."));
    }

    fn version_banner(&mut self, lines: &[String]) {
        self.line(format_args!("\nDatabase Version Information:"));
        for banner in lines {
            self.line(format_args!("{banner}"));
        }
    }

    fn instance_version(&mut self, version: &str) {
        self.line(format_args!("\nConcise Instance Version: {version}"));
    }

    fn product_components(&mut self, rows: &[ProductComponent]) {
        self.line(format_args!("\nProduct Component Version:"));
        for row in rows {
            self.line(format_args!(
                "Product: {}\nVersion: {}\nStatus: {}",
                row.product, row.version, row.status
            ));
        }
    }

    fn already_provisioned(&mut self, account: &Identifier) {
        self.line(format_args!(
            "\nConnected as {account}; account is already provisioned, nothing to do."
        ));
    }

    fn step_started(&mut self, step: &Step) {
        self.line(format_args!("Attempting to {}...", step.description));
    }

    fn step_finished(&mut self, step: &Step) {
        self.line(format_args!("Completed: {}.", step.description));
    }

    fn account_created(&mut self, account: &Identifier, credential: &str) {
        let credential = if self.redact_credentials { "***" } else { credential };
        self.line(format_args!(
            "\nNew admin user '{account}' with password '{credential}' created successfully."
        ));
    }
}
