//! Statement catalog and the provisioning plan

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ident::Identifier;

/// Account name the run provisions unless configured otherwise. A run whose
/// connecting principal already resolves to this name has nothing to do.
pub const DEFAULT_ADMIN_ACCOUNT: &str = "\"user[2]admin\"";

/// Credential paired with [`DEFAULT_ADMIN_ACCOUNT`]. Embedded verbatim.
pub const DEFAULT_ADMIN_CREDENTIAL: &str = "\"pass[2]special_char\"";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(account|credential)\}").expect("static placeholder pattern"));

/// SQL dialect a statement catalog targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Oracle,
    Mysql,
}

impl Dialect {
    pub fn catalog(&self) -> StatementCatalog {
        match self {
            Dialect::Oracle => StatementCatalog::oracle(),
            Dialect::Mysql => StatementCatalog::mysql(),
        }
    }
}

/// SQL text used by a run.
///
/// Statement templates accept `{account}` and `{credential}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementCatalog {
    /// Returns one banner line per row
    pub version_query: String,

    /// Returns a single row with the concise instance version
    pub instance_version_query: String,

    /// Returns `product, version, status` rows
    pub product_query: String,

    pub drop_account: String,
    pub create_account: String,
    pub grant_roles: String,
}

impl StatementCatalog {
    pub fn oracle() -> Self {
        Self {
            version_query: "SELECT banner FROM V$VERSION".to_string(),
            instance_version_query: "SELECT version FROM V$INSTANCE".to_string(),
            product_query: "SELECT product, version, status FROM PRODUCT_COMPONENT_VERSION \
                            WHERE product LIKE 'Oracle Database%'"
                .to_string(),
            drop_account: "DROP USER {account} CASCADE".to_string(),
            create_account: "CREATE USER {account} IDENTIFIED BY {credential}".to_string(),
            grant_roles: "GRANT CONNECT, RESOURCE, DBA TO {account}".to_string(),
        }
    }

    /// MySQL has no CASCADE on DROP USER and no predefined DBA role; the
    /// grant gives global privileges instead.
    pub fn mysql() -> Self {
        Self {
            version_query: "SELECT CONCAT(VARIABLE_NAME, ': ', VARIABLE_VALUE) \
                            FROM performance_schema.global_variables \
                            WHERE VARIABLE_NAME LIKE 'version%' ORDER BY VARIABLE_NAME"
                .to_string(),
            instance_version_query: "SELECT VERSION()".to_string(),
            product_query: "SELECT @@version_comment, VERSION(), 'VALID'".to_string(),
            drop_account: "DROP USER {account}".to_string(),
            create_account: "CREATE USER {account} IDENTIFIED BY {credential}".to_string(),
            grant_roles: "GRANT ALL PRIVILEGES ON *.* TO {account} WITH GRANT OPTION".to_string(),
        }
    }
}

impl Default for StatementCatalog {
    fn default() -> Self {
        Self::oracle()
    }
}

/// The mutating steps of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Drop,
    Create,
    Grant,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Drop => "drop",
            StepKind::Create => "create",
            StepKind::Grant => "grant",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statement of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub description: String,
    pub statement: String,
}

/// Ordered DROP, CREATE and GRANT statements for one account.
#[derive(Debug, Clone)]
pub struct ProvisioningPlan {
    account: Identifier,
    credential: String,
    steps: Vec<Step>,
}

impl ProvisioningPlan {
    /// Build the plan for `account`.
    ///
    /// `credential` is trusted as already formatted for the target
    /// database and is inserted as is.
    pub fn build(catalog: &StatementCatalog, account: Identifier, credential: impl Into<String>) -> Self {
        let credential = credential.into();

        let steps = vec![
            Step {
                kind: StepKind::Drop,
                description: format!("drop user {account} if it exists"),
                statement: render(&catalog.drop_account, &account, &credential),
            },
            Step {
                kind: StepKind::Create,
                description: format!("create user {account}"),
                statement: render(&catalog.create_account, &account, &credential),
            },
            Step {
                kind: StepKind::Grant,
                description: format!("grant roles and privileges to {account}"),
                statement: render(&catalog.grant_roles, &account, &credential),
            },
        ];

        Self {
            account,
            credential,
            steps,
        }
    }

    pub fn account(&self) -> &Identifier {
        &self.account
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

fn render(template: &str, account: &Identifier, credential: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "account" => account.rendered().to_string(),
            _ => credential.to_string(),
        })
        .into_owned()
}
