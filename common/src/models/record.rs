//! Row records and bind parameters.
//!
//! The column set of a query is only known when the query is written, so rows
//! are kept as ordered `(column, value)` pairs rather than typed structs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::errors::{AppError, AppResult};

const SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const MICROS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A single scalar read from, or bound to, a query.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact `NUMERIC` value, scale preserved.
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl FieldValue {
    /// Numeric value as `f64`, for the numeric variants.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Decimal(v) => decimal_to_f64(v),
            _ => None,
        }
    }

    /// Numeric value as an exact decimal. Floats convert only when finite.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Int(v) => Some(Decimal::from(*v)),
            FieldValue::Float(v) => Decimal::from_f64(*v),
            FieldValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value, for the integer variant only.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Bool(v) => serializer.serialize_bool(*v),
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            FieldValue::Float(v) => serializer.serialize_f64(*v),
            // JSON numbers are doubles; the exact value stays in the record.
            FieldValue::Decimal(v) => match decimal_to_f64(v) {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.collect_str(v),
            },
            FieldValue::Text(v) => serializer.serialize_str(v),
            FieldValue::Date(v) => serializer.collect_str(&v.format("%Y-%m-%d")),
            FieldValue::Timestamp(v) => serializer.serialize_str(&isoformat(v)),
            FieldValue::TimestampTz(v) => {
                serializer.serialize_str(&format!("{}+00:00", isoformat(&v.naive_utc())))
            }
        }
    }
}

/// The double closest to `value`.
///
/// Goes through the decimal text: `ToPrimitive::to_f64` adds the integral
/// and fractional parts separately and can land one ulp away.
pub fn decimal_to_f64(value: &Decimal) -> Option<f64> {
    value.to_string().parse().ok()
}

/// ISO 8601 without a zone; the fraction is printed as microseconds and
/// omitted entirely when zero.
fn isoformat(ts: &NaiveDateTime) -> String {
    let format = if ts.nanosecond() == 0 {
        SECONDS_FORMAT
    } else {
        MICROS_FORMAT
    };
    ts.format(format).to_string()
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        FieldValue::Decimal(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::TimestampTz(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// One decoded row: column names paired with values, in result-set order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Zips a row's values with the result-set column names.
    ///
    /// # Errors
    /// Returns `AppError::DatabaseQuery` if the row width differs from the
    /// number of columns.
    pub fn from_row(columns: &[String], values: Vec<FieldValue>) -> AppResult<Self> {
        if columns.len() != values.len() {
            return Err(AppError::DatabaseQuery(format!(
                "row has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }
        Ok(Self {
            fields: columns.iter().cloned().zip(values).collect(),
        })
    }

    /// Value of `column`, if present.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A copy of this record without `column`.
    pub fn without(&self, column: &str) -> Record {
        self.fields
            .iter()
            .filter(|(name, _)| name != column)
            .cloned()
            .collect()
    }

    /// A new record holding exactly `columns`, in that order.
    ///
    /// # Errors
    /// Returns `AppError::MalformedRecord` naming the first missing column.
    pub fn project(&self, columns: &[&str]) -> AppResult<Record> {
        columns
            .iter()
            .map(|column| {
                self.get(column)
                    .map(|value| (column.to_string(), value.clone()))
                    .ok_or_else(|| {
                        AppError::MalformedRecord(format!("missing column `{}`", column))
                    })
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Named bind parameters, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(Vec<(String, FieldValue)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name`, replacing an earlier value of the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
