//! The provisioning state machine
//!
//! A run moves forward through [`State`] one step at a time. The first
//! failure ends the run; completed steps are never undone.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::error::{ProvisionError, Result, SessionError};
use crate::ident::Identifier;
use crate::plan::{
    ProvisioningPlan, StatementCatalog, StepKind, DEFAULT_ADMIN_ACCOUNT, DEFAULT_ADMIN_CREDENTIAL,
};
use crate::report::{ProductComponent, Reporter};
use crate::session::{ConnectionDescriptor, Connector, Row, Session};

/// How the DROP step treats an account that does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPolicy {
    /// Any DROP failure aborts the run
    #[default]
    Strict,
    /// A missing account counts as dropped
    Tolerant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    Connected,
    Pinged,
    VersionReported,
    InstanceReported,
    ProductReported,
    DroppedIfExists,
    Created,
    Granted,
    Done,
}

/// Successful end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Provisioned { account: Identifier },
    /// The connecting principal is already the admin account
    AlreadyProvisioned { account: Identifier },
}

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    /// Principal used to connect, quoted when required
    pub principal: String,
    pub credential: String,
    pub host: String,
    pub service: String,
    pub ping_timeout: Duration,
    /// Account to (re)create
    pub admin_account: String,
    /// Embedded verbatim in the CREATE statement
    pub admin_credential: String,
    pub drop_policy: DropPolicy,
    pub statements: StatementCatalog,
}

impl Default for ProvisionRequest {
    fn default() -> Self {
        Self {
            principal: String::new(),
            credential: String::new(),
            host: "localhost".to_string(),
            service: String::new(),
            ping_timeout: Duration::from_secs(5),
            admin_account: DEFAULT_ADMIN_ACCOUNT.to_string(),
            admin_credential: DEFAULT_ADMIN_CREDENTIAL.to_string(),
            drop_policy: DropPolicy::Strict,
            statements: StatementCatalog::default(),
        }
    }
}

pub struct Sequencer<C, R> {
    connector: C,
    reporter: R,
    request: ProvisionRequest,
    state: State,
}

impl<C: Connector, R: Reporter> Sequencer<C, R> {
    pub fn new(connector: C, reporter: R, request: ProvisionRequest) -> Self {
        Self {
            connector,
            reporter,
            request,
            state: State::Init,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Execute the whole run. The session, once opened, is closed exactly
    /// once whatever the outcome.
    #[instrument(skip(self), fields(host = %self.request.host, service = %self.request.service))]
    pub async fn run(&mut self) -> Result<Outcome> {
        let result = self.connect_and_drive().await;
        if let Err(e) = &result {
            error!(stage = e.stage(), state = ?self.state, error = %e, "Provisioning aborted");
        }
        result
    }

    async fn connect_and_drive(&mut self) -> Result<Outcome> {
        let principal = Identifier::resolve(self.request.principal.as_str());
        if principal.needs_quoting() {
            info!(raw = principal.raw(), quoted = %principal, "Connecting principal requires quoting");
        }

        let descriptor = ConnectionDescriptor::new(
            &principal,
            self.request.credential.as_str(),
            self.request.host.as_str(),
            self.request.service.as_str(),
        );
        self.reporter.descriptor(&descriptor);

        let mut session = self
            .connector
            .open(&descriptor)
            .await
            .map_err(ProvisionError::Connection)?;
        self.advance(State::Connected);

        let result = self.drive(session.as_mut(), &principal).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close session");
        }
        result
    }

    async fn drive(&mut self, session: &mut dyn Session, principal: &Identifier) -> Result<Outcome> {
        let statements = self.request.statements.clone();
        let timeout = self.request.ping_timeout;

        match tokio::time::timeout(timeout, session.ping(timeout)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ProvisionError::Liveness(e)),
            Err(_) => return Err(ProvisionError::Liveness(SessionError::Timeout(timeout))),
        }
        info!("Ping ok");
        self.reporter.reachable();
        self.advance(State::Pinged);

        let banner = fetch(session, "version", &statements.version_query)
            .await?
            .into_iter()
            .map(|row| scan::<1>("version", row).map(|[line]| line))
            .collect::<Result<Vec<_>>>()?;
        self.reporter.version_banner(&banner);
        self.advance(State::VersionReported);

        let [instance_version] = fetch(session, "instance_version", &statements.instance_version_query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProvisionError::Query {
                query: "instance_version",
                source: SessionError::Driver("no rows returned".to_string()),
            })
            .and_then(|row| scan::<1>("instance_version", row))?;
        self.reporter.instance_version(&instance_version);
        self.advance(State::InstanceReported);

        let components = fetch(session, "product_components", &statements.product_query)
            .await?
            .into_iter()
            .map(|row| {
                scan::<3>("product_components", row).map(|[product, version, status]| {
                    ProductComponent {
                        product,
                        version,
                        status,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.reporter.product_components(&components);
        self.advance(State::ProductReported);

        let account = Identifier::resolve(self.request.admin_account.as_str());
        if principal.same_principal(&account) {
            info!(account = %account, "Connected as the admin account, skipping provisioning");
            self.reporter.already_provisioned(&account);
            self.advance(State::Done);
            return Ok(Outcome::AlreadyProvisioned { account });
        }

        let plan = ProvisioningPlan::build(&statements, account, self.request.admin_credential.as_str());
        for step in plan.steps() {
            self.reporter.step_started(step);
            match session.execute(&step.statement).await {
                Ok(()) => {}
                Err(SessionError::ObjectNotFound(reason))
                    if step.kind == StepKind::Drop && self.request.drop_policy == DropPolicy::Tolerant =>
                {
                    info!(account = %plan.account(), %reason, "Account did not exist, nothing to drop");
                }
                Err(source) => {
                    error!(step = %step.kind, account = %plan.account(), error = %source, "Statement failed");
                    return Err(ProvisionError::Exec {
                        step: step.kind,
                        source,
                    });
                }
            }
            self.reporter.step_finished(step);
            self.advance(match step.kind {
                StepKind::Drop => State::DroppedIfExists,
                StepKind::Create => State::Created,
                StepKind::Grant => State::Granted,
            });
        }

        self.reporter.account_created(plan.account(), plan.credential());
        self.advance(State::Done);
        Ok(Outcome::Provisioned {
            account: plan.account().clone(),
        })
    }

    fn advance(&mut self, next: State) {
        info!(from = ?self.state, to = ?next, "State transition");
        self.state = next;
    }
}

async fn fetch(session: &mut dyn Session, query: &'static str, sql: &str) -> Result<Vec<Row>> {
    session
        .query(sql)
        .await
        .map_err(|source| ProvisionError::Query { query, source })
}

fn scan<const N: usize>(query: &'static str, row: Row) -> Result<[String; N]> {
    <[String; N]>::try_from(row).map_err(|row| ProvisionError::Query {
        query,
        source: SessionError::Driver(format!("expected {N} columns, got {}", row.len())),
    })
}
