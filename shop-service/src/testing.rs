//! In-memory connector for tests.
//!
//! Records every statement and parameter set that reaches the "driver" and
//! answers from a responder closure instead of a database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use common::errors::{AppError, AppResult};
use common::models::{ConnectionConfig, FieldValue, QueryCatalog, QueryParams};

use crate::connection::{Connector, DbSession, ResultSet};
use crate::queries;

type Responder = dyn Fn(&str, &QueryParams) -> AppResult<ResultSet> + Send + Sync;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub sql: String,
    pub params: QueryParams,
}

#[derive(Default)]
struct CallLog {
    calls: Vec<RecordedCall>,
    opened: usize,
    closed: usize,
}

#[derive(Clone)]
pub struct RecordingConnector {
    responder: Arc<Responder>,
    refuse_with: Option<String>,
    log: Arc<Mutex<CallLog>>,
}

impl RecordingConnector {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &QueryParams) -> AppResult<ResultSet> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            refuse_with: None,
            log: Arc::new(Mutex::new(CallLog::default())),
        }
    }

    /// Answers every query with `result`.
    pub fn returning(result: ResultSet) -> Self {
        Self::new(move |_, _| Ok(result.clone()))
    }

    /// Fails every connection attempt with `message`.
    pub fn refusing(message: &str) -> Self {
        Self {
            refuse_with: Some(message.to_string()),
            ..Self::returning(ResultSet::default())
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn connections_opened(&self) -> usize {
        self.log.lock().unwrap().opened
    }

    pub fn connections_closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self, _config: &ConnectionConfig) -> AppResult<Box<dyn DbSession>> {
        if let Some(message) = &self.refuse_with {
            return Err(AppError::DatabaseConnection(message.clone()));
        }
        self.log.lock().unwrap().opened += 1;
        Ok(Box::new(RecordingSession {
            responder: self.responder.clone(),
            log: self.log.clone(),
        }))
    }
}

struct RecordingSession {
    responder: Arc<Responder>,
    log: Arc<Mutex<CallLog>>,
}

#[async_trait]
impl DbSession for RecordingSession {
    async fn run(&mut self, sql: &str, params: &QueryParams) -> AppResult<ResultSet> {
        self.log.lock().unwrap().calls.push(RecordedCall {
            sql: sql.to_string(),
            params: params.clone(),
        });
        (self.responder)(sql, params)
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        self.log.lock().unwrap().closed += 1;
        Ok(())
    }
}

pub fn connection_config() -> ConnectionConfig {
    ConnectionConfig {
        host: "abc".to_string(),
        port: "5432".to_string(),
        user: "def".to_string(),
        password: "password".to_string(),
        database: "db".to_string(),
    }
}

pub fn result_set(columns: &[&str], rows: Vec<Vec<FieldValue>>) -> ResultSet {
    ResultSet {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

pub fn timestamp(date: (i32, u32, u32), time: (u32, u32, u32, u32)) -> FieldValue {
    let (y, m, d) = date;
    let (h, min, s, milli) = time;
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|day| day.and_hms_milli_opt(h, min, s, milli))
        .map(FieldValue::Timestamp)
        .unwrap()
}

pub fn categories() -> ResultSet {
    result_set(
        &["category_id", "category_name"],
        vec![
            vec![1.into(), "Garden".into()],
            vec![2.into(), "Toys".into()],
            vec![3.into(), "Kids".into()],
        ],
    )
}

pub fn products() -> ResultSet {
    result_set(
        &["product_id", "product_title", "product_description", "product_cost", "category"],
        vec![
            vec![
                3.into(),
                "Handcrafted Granite Chips".into(),
                "Ergonomic executive chair".into(),
                Decimal::new(133, 0).into(),
                "Toys".into(),
            ],
            vec![
                7.into(),
                "Bespoke Wooden Bike".into(),
                "Carbonite web goalkeeper gloves".into(),
                Decimal::new(393, 0).into(),
                "Garden".into(),
            ],
        ],
    )
}

pub fn users() -> ResultSet {
    result_set(
        &["user_id", "first_name", "last_name", "email"],
        vec![
            vec![1.into(), "Afton".into(), "Kuhn".into(), "afton@example.com".into()],
            vec![2.into(), "Rosalyn".into(), "Bergnaum".into(), "rosalyn@example.com".into()],
            vec![3.into(), "Kobe".into(), "Heller".into(), "kobe@example.com".into()],
            vec![7.into(), "Lempi".into(), "Schaden".into(), "lempi@example.com".into()],
        ],
    )
}

const SALE_COLUMNS: [&str; 9] = [
    "sales_id",
    "user_id",
    "first_name",
    "product_id",
    "product_title",
    "product_cost",
    "category",
    "num_items",
    "transaction_ts",
];

pub fn user_sales() -> ResultSet {
    result_set(
        &SALE_COLUMNS,
        vec![
            vec![
                408.into(),
                7.into(),
                "Lempi".into(),
                12.into(),
                "Refined Steel Sausages".into(),
                Decimal::new(5725, 2).into(),
                "Kids".into(),
                2.into(),
                timestamp((2022, 10, 3), (9, 12, 0, 0)),
            ],
            vec![
                373.into(),
                7.into(),
                "Lempi".into(),
                9.into(),
                "Bespoke Wooden Bike".into(),
                Decimal::new(393, 0).into(),
                "Garden".into(),
                1.into(),
                timestamp((2022, 10, 6), (11, 34, 50, 96)),
            ],
        ],
    )
}

/// Answers the default catalog's queries from the fixtures above, the way
/// the database would.
pub fn shop_fixture() -> RecordingConnector {
    let catalog = queries::build_catalog(None).unwrap();
    RecordingConnector::new(move |sql, params| fixture_rows(&catalog, sql, params))
}

fn fixture_rows(catalog: &QueryCatalog, sql: &str, params: &QueryParams) -> AppResult<ResultSet> {
    let is = |name: &str| catalog.get(name).map(|q| q == sql).unwrap_or(false);
    let id = |name: &str| params.get(name).and_then(FieldValue::as_i64);

    let result = if is(queries::CATEGORIES) {
        categories()
    } else if is(queries::PRODUCTS) {
        products()
    } else if is(queries::PRODUCT) {
        filter_by(products(), "product_id", id("product_id"))
    } else if is(queries::USERS) {
        users()
    } else if is(queries::USER) {
        let mut found = filter_by(users(), "user_id", id("user_id"));
        found.rows.iter_mut().for_each(|row| row.truncate(1));
        found.columns.truncate(1);
        found
    } else if is(queries::USER_SALES) || is(queries::USER_SALES_LATEST) {
        filter_by(user_sales(), "user_id", id("user_id"))
    } else {
        return Err(AppError::DatabaseQuery(format!("unexpected statement: {}", sql)));
    };
    Ok(result)
}

fn filter_by(mut set: ResultSet, column: &str, value: Option<i64>) -> ResultSet {
    let index = set
        .columns
        .iter()
        .position(|c| c == column)
        .expect("fixture column");
    set.rows.retain(|row| row[index].as_i64() == value);
    set
}
