//! Graph store adapter
//!
//! Movies, people, genres and keywords live as node tables keyed by their
//! TMDB identifier, with one edge table per relationship type. Callers speak
//! to the store through [`GraphStore`]: a named query template plus a map of
//! named parameters in, an ordered list of JSON records out. The adapter does
//! not interpret what comes back.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, query::Query, types::Json, PgPool, Postgres, Row};
use tracing::instrument;

use crate::error::{AppError, AppResult};

/// One result row, as a mapping from column name to value
pub type Record = Map<String, Value>;

/// A query template with `$name` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQuery {
    name: &'static str,
    template: Cow<'static, str>,
}

impl GraphQuery {
    pub const fn new(name: &'static str, template: &'static str) -> Self {
        Self {
            name,
            template: Cow::Borrowed(template),
        }
    }

    /// Builds a query whose text is assembled at runtime (e.g. a chosen sort order)
    pub fn dynamic(name: &'static str, template: String) -> Self {
        Self {
            name,
            template: Cow::Owned(template),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

/// A single named parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
    NullableText(Option<String>),
    IntList(Vec<i64>),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<Option<String>> for ParamValue {
    fn from(value: Option<String>) -> Self {
        ParamValue::NullableText(value)
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(value: Vec<i64>) -> Self {
        ParamValue::IntList(value)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(value: DateTime<Utc>) -> Self {
        ParamValue::Timestamp(value)
    }
}

/// Named query parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a parameter, builder style
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Query interface over the movie graph
///
/// Implementations must not hold a connection across calls: each call
/// acquires its own session and releases it before returning, whether the
/// query succeeded or not.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    /// Runs a read query and returns its rows in store order
    async fn fetch_all(&self, query: &GraphQuery, params: &Params) -> AppResult<Vec<Record>>;

    /// Runs a write statement and returns the number of affected rows
    async fn execute(&self, query: &GraphQuery, params: &Params) -> AppResult<u64>;
}

/// Deserializes one record into a typed row
///
/// Failures name the query so a schema drift is easy to trace.
pub fn decode_record<T: DeserializeOwned>(query: &GraphQuery, record: Record) -> AppResult<T> {
    serde_json::from_value(Value::Object(record))
        .map_err(|e| AppError::MalformedRecord(format!("{}: {}", query.name(), e)))
}

/// A template rewritten to Postgres positional placeholders
#[derive(Debug, PartialEq)]
pub(crate) struct PositionalQuery<'p> {
    pub sql: String,
    pub values: Vec<&'p ParamValue>,
}

/// Rewrites `$name` placeholders to `$1..$n` in order of first appearance.
///
/// Text inside single-quoted literals is copied through untouched.
pub(crate) fn to_positional<'p>(template: &str, params: &'p Params) -> AppResult<PositionalQuery<'p>> {
    let mut sql = String::with_capacity(template.len());
    let mut names: Vec<String> = Vec::new();
    let mut values: Vec<&'p ParamValue> = Vec::new();
    let mut in_literal = false;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if in_literal {
            sql.push(c);
            if c == '\'' {
                in_literal = false;
            }
            continue;
        }

        match c {
            '\'' => {
                in_literal = true;
                sql.push(c);
            }
            '$' if chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || *next == '_') =>
            {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }

                let position = match names.iter().position(|existing| *existing == name) {
                    Some(index) => index + 1,
                    None => {
                        let value = params.get(&name).ok_or_else(|| {
                            AppError::InvalidInput(format!(
                                "Query parameter '{}' was not supplied",
                                name
                            ))
                        })?;
                        names.push(name);
                        values.push(value);
                        names.len()
                    }
                };

                sql.push('$');
                sql.push_str(&position.to_string());
            }
            _ => sql.push(c),
        }
    }

    let sql = sql.trim_end().trim_end_matches(';').to_string();
    Ok(PositionalQuery { sql, values })
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &ParamValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        ParamValue::Int(v) => query.bind(*v),
        ParamValue::Float(v) => query.bind(*v),
        ParamValue::Text(v) => query.bind(v.clone()),
        ParamValue::NullableText(v) => query.bind(v.clone()),
        ParamValue::IntList(v) => query.bind(v.clone()),
        ParamValue::Timestamp(v) => query.bind(*v),
    }
}

/// [`GraphStore`] backed by the PostgreSQL movie graph schema
#[derive(Clone)]
pub struct PgGraphStore {
    pool: PgPool,
}

impl PgGraphStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl GraphStore for PgGraphStore {
    #[instrument(skip_all, fields(query = query.name()))]
    async fn fetch_all(&self, query: &GraphQuery, params: &Params) -> AppResult<Vec<Record>> {
        let positional = to_positional(query.template(), params)?;
        let sql = format!(
            "SELECT row_to_json(graph_row) AS record FROM ({}) AS graph_row",
            positional.sql
        );

        let mut statement = sqlx::query(&sql);
        for value in &positional.values {
            statement = bind_value(statement, value);
        }

        let start = Instant::now();
        // Session is scoped to this call; the guard returns it to the pool on every path.
        let mut conn = self.pool.acquire().await?;
        let rows = statement.fetch_all(&mut *conn).await.map_err(|e| {
            tracing::error!(error = %e, query = query.name(), "Graph query failed");
            AppError::from(e)
        })?;

        let records = rows
            .iter()
            .map(|row| {
                row.try_get::<Json<Record>, _>("record")
                    .map(|json| json.0)
                    .map_err(AppError::from)
            })
            .collect::<AppResult<Vec<Record>>>()?;

        tracing::debug!(
            query = query.name(),
            rows = records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Graph query completed"
        );

        Ok(records)
    }

    #[instrument(skip_all, fields(query = query.name()))]
    async fn execute(&self, query: &GraphQuery, params: &Params) -> AppResult<u64> {
        let positional = to_positional(query.template(), params)?;

        let mut statement = sqlx::query(&positional.sql);
        for value in &positional.values {
            statement = bind_value(statement, value);
        }

        let mut conn = self.pool.acquire().await?;
        let result = statement.execute(&mut *conn).await.map_err(|e| {
            tracing::error!(error = %e, query = query.name(), "Graph write failed");
            AppError::from(e)
        })?;

        Ok(result.rows_affected())
    }
}
