//! MySQL sessions over sqlx

use async_trait::async_trait;
use provisor_core::{strip_quotes, ConnectionDescriptor, Connector, Row, Session, SessionError};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError, MySqlRow};
use sqlx::{ConnectOptions, Connection, Executor, Row as _, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Port used when the descriptor host carries none.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// `ER_CANNOT_USER`, raised by DROP USER for an unknown account.
const ER_CANNOT_USER: u16 = 1396;

/// Opens one [`MySqlSession`] per call.
#[derive(Debug, Clone, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    pub fn new() -> Self {
        Self
    }

    /// Translate a descriptor into sqlx connect options.
    ///
    /// The handshake takes the bare account name, so any quotes added for
    /// SQL text are removed here.
    pub fn connect_options(descriptor: &ConnectionDescriptor) -> Result<MySqlConnectOptions, SessionError> {
        let (host, port) = split_host_port(&descriptor.host)?;
        let mut options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(strip_quotes(&descriptor.principal))
            .password(&descriptor.credential);
        if !descriptor.service.is_empty() {
            options = options.database(&descriptor.service);
        }
        Ok(options)
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    #[instrument(skip(self, descriptor), fields(host = %descriptor.host, service = %descriptor.service))]
    async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Session>, SessionError> {
        info!("Opening MySQL connection");

        let connection = Self::connect_options(descriptor)?
            .connect()
            .await
            .map_err(|e| SessionError::Open(e.to_string()))?;

        Ok(Box::new(MySqlSession {
            connection: Some(connection),
        }))
    }
}

/// A single MySQL connection.
pub struct MySqlSession {
    connection: Option<MySqlConnection>,
}

impl MySqlSession {
    fn connection(&mut self) -> Result<&mut MySqlConnection, SessionError> {
        self.connection
            .as_mut()
            .ok_or_else(|| SessionError::Driver("Session already closed".to_string()))
    }
}

#[async_trait]
impl Session for MySqlSession {
    async fn ping(&mut self, timeout: Duration) -> Result<(), SessionError> {
        let connection = self.connection()?;
        match tokio::time::timeout(timeout, connection.ping()).await {
            Ok(result) => result.map_err(classify),
            Err(_) => Err(SessionError::Timeout(timeout)),
        }
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, SessionError> {
        debug!(sql, "Running query");
        let rows = self.connection()?.fetch_all(sql).await.map_err(classify)?;
        rows.iter().map(row_text).collect()
    }

    async fn execute(&mut self, sql: &str) -> Result<(), SessionError> {
        let result = self.connection()?.execute(sql).await.map_err(classify)?;
        debug!(rows_affected = result.rows_affected(), "Statement executed");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        match self.connection.take() {
            Some(connection) => connection.close().await.map_err(classify),
            None => Ok(()),
        }
    }
}

fn split_host_port(host: &str) -> Result<(&str, u16), SessionError> {
    match host.rsplit_once(':') {
        Some((name, port)) => port
            .parse()
            .map(|port| (name, port))
            .map_err(|e| SessionError::Open(format!("Invalid port in `{host}`: {e}"))),
        None => Ok((host, DEFAULT_MYSQL_PORT)),
    }
}

fn row_text(row: &MySqlRow) -> Result<Row, SessionError> {
    (0..row.len()).map(|index| column_text(row, index)).collect()
}

/// Decode one column as text. NULL becomes an empty string.
fn column_text(row: &MySqlRow, index: usize) -> Result<String, SessionError> {
    let raw = row.try_get_raw(index).map_err(classify)?;
    if raw.is_null() {
        return Ok(String::new());
    }
    let type_name = raw.type_info().name().to_string();

    let text = match type_name.as_str() {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(index).map(|v| v.to_string())
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<u64, _>(index).map(|v| v.to_string()),
        "FLOAT" | "DOUBLE" => row.try_get::<f64, _>(index).map(|v| v.to_string()),
        _ => row.try_get::<String, _>(index),
    };
    text.map_err(|e| SessionError::Driver(format!("Cannot read column {index} ({type_name}) as text: {e}")))
}

fn classify(err: sqlx::Error) -> SessionError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(mysql) = db.try_downcast_ref::<MySqlDatabaseError>() {
            if mysql.number() == ER_CANNOT_USER && mysql.message().contains("DROP USER") {
                return SessionError::ObjectNotFound(mysql.message().to_string());
            }
        }
    }
    SessionError::Driver(err.to_string())
}
