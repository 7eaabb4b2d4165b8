//! 数据库连接提供者
//!
//! Opens one PostgreSQL connection per call and turns every failure to
//! connect into `AppError::DatabaseConnection`. The [`Connector`] and
//! [`DbSession`] traits are the seam between the query executor and the
//! driver.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection, Postgres, Row, TypeInfo, ValueRef};

use common::errors::{AppError, AppResult};
use common::models::{ConnectionConfig, FieldValue, QueryParams, Record};
use common::utils::{split_segments, SqlSegment};

/// Raw query output: column names in result-set order and one value vector
/// per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FieldValue>>,
}

impl ResultSet {
    /// Zips every row with the column names.
    pub fn into_records(self) -> AppResult<Vec<Record>> {
        let ResultSet { columns, rows } = self;
        rows.into_iter()
            .map(|row| Record::from_row(&columns, row))
            .collect()
    }
}

/// Opens database sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new session. No pooling: every call is a fresh connection.
    async fn connect(&self, config: &ConnectionConfig) -> AppResult<Box<dyn DbSession>>;
}

/// An open connection owned by the caller.
#[async_trait]
pub trait DbSession: Send {
    /// Runs `sql` with named bind parameters.
    async fn run(&mut self, sql: &str, params: &QueryParams) -> AppResult<ResultSet>;

    /// Closes the connection.
    async fn close(self: Box<Self>) -> AppResult<()>;
}

/// Opens a PostgreSQL connection.
///
/// A single attempt bounded by `timeout`. An unparsable port, a refused or
/// unreachable host, an authentication failure and an elapsed timeout all
/// surface as `AppError::DatabaseConnection` carrying the cause.
pub async fn get_db_connection(
    config: &ConnectionConfig,
    timeout: Duration,
) -> AppResult<PgConnection> {
    let port: u16 = config.port.trim().parse().map_err(|_| {
        AppError::DatabaseConnection(format!("invalid port `{}`", config.port))
    })?;

    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database);

    match tokio::time::timeout(timeout, options.connect()).await {
        Ok(Ok(conn)) => {
            tracing::debug!(host = %config.host, port, database = %config.database, "数据库连接已建立");
            Ok(conn)
        }
        Ok(Err(e)) => {
            tracing::warn!(host = %config.host, port, error = %e, "数据库连接失败");
            Err(AppError::DatabaseConnection(e.to_string()))
        }
        Err(_) => Err(AppError::DatabaseConnection(format!(
            "timed out after {}s connecting to {}:{}",
            timeout.as_secs(),
            config.host,
            port
        ))),
    }
}

/// [`Connector`] backed by sqlx's PostgreSQL driver.
pub struct PgConnector {
    timeout: Duration,
}

impl PgConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, config: &ConnectionConfig) -> AppResult<Box<dyn DbSession>> {
        let conn = get_db_connection(config, self.timeout).await?;
        Ok(Box::new(PgSession { conn }))
    }
}

struct PgSession {
    conn: PgConnection,
}

#[async_trait]
impl DbSession for PgSession {
    async fn run(&mut self, sql: &str, params: &QueryParams) -> AppResult<ResultSet> {
        let (statement, values) = bind_named(sql, params)?;

        let mut query = sqlx::query(&statement);
        for value in values {
            query = bind_value(query, value);
        }

        let rows = query
            .fetch_all(&mut self.conn)
            .await
            .map_err(query_error)?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let rows = rows.iter().map(decode_row).collect::<AppResult<Vec<_>>>()?;

        Ok(ResultSet { columns, rows })
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))
    }
}

/// Rewrites `:name` placeholders into PostgreSQL's positional `$n` form.
///
/// Returns the rewritten statement and the values in placeholder order. A
/// name used twice maps to the same position. `::type` casts, quoted
/// literals and identifiers, and comments are left alone. Values are never
/// spliced into the statement text.
pub fn bind_named(sql: &str, params: &QueryParams) -> AppResult<(String, Vec<FieldValue>)> {
    let mut statement = String::with_capacity(sql.len());
    let mut order: Vec<&str> = Vec::new();

    for segment in split_segments(sql) {
        match segment {
            SqlSegment::Code(code) => rewrite_placeholders(code, &mut statement, &mut order),
            SqlSegment::Quoted(text) | SqlSegment::Comment(text) => statement.push_str(text),
        }
    }

    if let Some((unused, _)) = params.iter().find(|(name, _)| !order.contains(name)) {
        return Err(AppError::Validation(format!(
            "bind parameter `{}` is not used by the query",
            unused
        )));
    }

    let values = order
        .iter()
        .map(|name| {
            params.get(name).cloned().ok_or_else(|| {
                AppError::Validation(format!("missing value for bind parameter `{}`", name))
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok((statement, values))
}

fn rewrite_placeholders<'a>(code: &'a str, statement: &mut String, order: &mut Vec<&'a str>) {
    let mut chars = code.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != ':' {
            statement.push(c);
            continue;
        }
        match chars.peek() {
            Some(&(_, ':')) => {
                chars.next();
                statement.push_str("::");
            }
            Some(&(_, n)) if n.is_ascii_alphabetic() || n == '_' => {
                let start = i + 1;
                let mut end = start;
                while let Some(&(j, n)) = chars.peek() {
                    if !(n.is_ascii_alphanumeric() || n == '_') {
                        break;
                    }
                    end = j + n.len_utf8();
                    chars.next();
                }
                let name = &code[start..end];
                let position = match order.iter().position(|known| *known == name) {
                    Some(index) => index + 1,
                    None => {
                        order.push(name);
                        order.len()
                    }
                };
                statement.push('$');
                statement.push_str(&position.to_string());
            }
            _ => statement.push(c),
        }
    }
}

fn bind_value(query: Query<'_, Postgres, PgArguments>, value: FieldValue) -> Query<'_, Postgres, PgArguments> {
    match value {
        FieldValue::Null => query.bind(None::<String>),
        FieldValue::Bool(v) => query.bind(v),
        FieldValue::Int(v) => query.bind(v),
        FieldValue::Float(v) => query.bind(v),
        FieldValue::Decimal(v) => query.bind(v),
        FieldValue::Text(v) => query.bind(v),
        FieldValue::Date(v) => query.bind(v),
        FieldValue::Timestamp(v) => query.bind(v),
        FieldValue::TimestampTz(v) => query.bind(v),
    }
}

fn decode_row(row: &PgRow) -> AppResult<Vec<FieldValue>> {
    (0..row.len()).map(|index| decode_field(row, index)).collect()
}

fn decode_field(row: &PgRow, index: usize) -> AppResult<FieldValue> {
    let raw = row.try_get_raw(index).map_err(query_error)?;
    if raw.is_null() {
        return Ok(FieldValue::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOL" => FieldValue::Bool(row.try_get(index).map_err(query_error)?),
        "INT2" => FieldValue::Int(row.try_get::<i16, _>(index).map_err(query_error)?.into()),
        "INT4" => FieldValue::Int(row.try_get::<i32, _>(index).map_err(query_error)?.into()),
        "INT8" => FieldValue::Int(row.try_get(index).map_err(query_error)?),
        "FLOAT4" => FieldValue::Float(row.try_get::<f32, _>(index).map_err(query_error)?.into()),
        "FLOAT8" => FieldValue::Float(row.try_get(index).map_err(query_error)?),
        "NUMERIC" => FieldValue::Decimal(row.try_get(index).map_err(query_error)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            FieldValue::Text(row.try_get(index).map_err(query_error)?)
        }
        "DATE" => FieldValue::Date(row.try_get(index).map_err(query_error)?),
        "TIMESTAMP" => FieldValue::Timestamp(row.try_get(index).map_err(query_error)?),
        "TIMESTAMPTZ" => FieldValue::TimestampTz(row.try_get(index).map_err(query_error)?),
        other => {
            return Err(AppError::DatabaseQuery(format!(
                "unsupported type {} in column `{}`",
                other,
                row.column(index).name()
            )))
        }
    };
    Ok(value)
}

fn query_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseQuery(e.to_string())
}
