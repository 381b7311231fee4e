//! The dynamic query executor.
//!
//! Translates an API definition plus an operation into a single
//! parameterized SQL statement. Operation gating happens before any SQL
//! text exists; table and column identifiers are validated against a safe
//! character set before interpolation, and every value binds positionally.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use sqlx::Any;
use sqlx::any::AnyArguments;
use sqlx::query::Query;
use tracing::debug;

use tablegate_core::{ApiDefinition, DriverKind, Operation};

use crate::error::{DbError, Result};
use crate::pool::{DataSource, placeholder};
use crate::row::row_to_object;

static IDENTIFIER: OnceLock<Regex> = OnceLock::new();

fn identifier_pattern() -> &'static Regex {
    IDENTIFIER.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"))
}

/// Validates a table or column name before it may be interpolated into SQL.
pub fn validate_identifier(name: &str) -> Result<&str> {
    if identifier_pattern().is_match(name) {
        Ok(name)
    } else {
        Err(DbError::invalid_identifier(name))
    }
}

/// Executes dynamic statements against resolved connection handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor;

impl QueryExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Full read of the definition's table, restricted to its included
    /// columns when the allow-list is non-empty.
    ///
    /// Rows come back as ordered column-name → value mappings in the
    /// driver's reported column order.
    pub async fn select_rows(
        &self,
        source: &DataSource,
        definition: &ApiDefinition,
    ) -> Result<Vec<Map<String, Value>>> {
        ensure_allowed(definition, Operation::Get)?;
        let sql = build_select(definition)?;
        debug!(table = %definition.table_name, sql = %sql, "Executing dynamic read");

        let rows = sqlx::query(&sql).fetch_all(&source.pool).await?;
        rows.iter().map(row_to_object).collect()
    }

    /// Inserts one row built from a flat key → value payload; column names
    /// come from the payload keys. Returns the affected-row count.
    pub async fn insert_row(
        &self,
        source: &DataSource,
        definition: &ApiDefinition,
        payload: &Map<String, Value>,
    ) -> Result<u64> {
        ensure_allowed(definition, Operation::Put)?;
        if payload.is_empty() {
            return Err(DbError::EmptyInsertPayload);
        }

        let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        let sql = build_insert(source.driver, &definition.table_name, &keys)?;
        debug!(table = %definition.table_name, sql = %sql, "Executing dynamic insert");

        let mut query = sqlx::query(&sql);
        for value in payload.values() {
            query = bind_value(query, value);
        }

        let result = query.execute(&source.pool).await?;
        Ok(result.rows_affected())
    }

    /// Deletes rows matching a conjunction of equality conditions. An empty
    /// condition set is rejected before any SQL is built.
    pub async fn delete_rows(
        &self,
        source: &DataSource,
        definition: &ApiDefinition,
        conditions: &[(String, String)],
    ) -> Result<u64> {
        ensure_allowed(definition, Operation::Delete)?;
        if conditions.is_empty() {
            return Err(DbError::EmptyDeleteConditions);
        }

        let keys: Vec<&str> = conditions.iter().map(|(k, _)| k.as_str()).collect();
        let sql = build_delete(source.driver, &definition.table_name, &keys)?;
        debug!(table = %definition.table_name, sql = %sql, "Executing dynamic delete");

        let mut query = sqlx::query(&sql);
        for (_, value) in conditions {
            query = query.bind(value.as_str());
        }

        let result = query.execute(&source.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Rejects the call before SQL construction when the definition does not
/// allow the operation.
fn ensure_allowed(definition: &ApiDefinition, operation: Operation) -> Result<()> {
    if definition.allowed_operations.allows(operation) {
        Ok(())
    } else {
        Err(DbError::not_allowed(operation, &definition.table_name))
    }
}

fn build_select(definition: &ApiDefinition) -> Result<String> {
    let table = validate_identifier(&definition.table_name)?;
    let columns = if definition.included_columns.is_empty() {
        "*".to_string()
    } else {
        let validated: Vec<&str> = definition
            .included_columns
            .iter()
            .map(|c| validate_identifier(c))
            .collect::<Result<_>>()?;
        validated.join(", ")
    };
    Ok(format!("SELECT {columns} FROM {table}"))
}

fn build_insert(driver: DriverKind, table: &str, columns: &[&str]) -> Result<String> {
    let table = validate_identifier(table)?;
    let mut placeholders = Vec::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        validate_identifier(column)?;
        placeholders.push(placeholder(driver, i + 1));
    }
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    ))
}

fn build_delete(driver: DriverKind, table: &str, columns: &[&str]) -> Result<String> {
    let table = validate_identifier(table)?;
    let mut predicates = Vec::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        validate_identifier(column)?;
        predicates.push(format!("{column} = {}", placeholder(driver, i + 1)));
    }
    Ok(format!(
        "DELETE FROM {table} WHERE {}",
        predicates.join(" AND ")
    ))
}

/// Binds a JSON value positionally. Arrays and nested objects bind as their
/// JSON text, matching how the admin surface round-trips them.
fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: &Value,
) -> Query<'q, Any, AnyArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}
