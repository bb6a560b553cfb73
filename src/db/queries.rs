use chrono::Utc;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use serde_json::{Map, Value};

use crate::backend::{BackendError, Column, Filter, Relation, Select, Table};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn now_timestamp() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

// ── Reads ──

pub fn select(conn: &Connection, query: &Select) -> Result<Vec<Value>, BackendError> {
    validate(query)?;

    let table = query.table;
    let mut sql = format!(
        "SELECT {} FROM {}",
        table.columns().join(", "),
        table.as_str()
    );
    let mut params: Vec<SqlValue> = vec![];
    let mut clauses: Vec<String> = vec![];

    for filter in &query.filters {
        match filter {
            Filter::Eq { column, value } => {
                params.push(SqlValue::Text(value.clone()));
                clauses.push(format!("{column} = ?{}", params.len()));
            }
            Filter::In { column, values } => {
                if values.is_empty() {
                    clauses.push("0".to_string());
                    continue;
                }
                let mut placeholders = Vec::with_capacity(values.len());
                for value in values {
                    params.push(SqlValue::Text(value.clone()));
                    placeholders.push(format!("?{}", params.len()));
                }
                clauses.push(format!("{column} IN ({})", placeholders.join(", ")));
            }
        }
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    if let Some(order) = &query.order {
        let dir = if order.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY {} {dir}", order.column));
    }

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| row_to_map(table, row))?;

    let mut out = vec![];
    for row in rows {
        let row = row?;
        out.push(project(conn, table, &row, &query.columns)?);
    }
    Ok(out)
}

pub fn get_row(
    conn: &Connection,
    table: Table,
    id: &str,
) -> Result<Option<Map<String, Value>>, BackendError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?1",
        table.columns().join(", "),
        table.as_str()
    );
    let result = conn.query_row(&sql, params![id], |row| row_to_map(table, row));

    match result {
        Ok(row) => Ok(Some(row)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn row_to_map(table: Table, row: &rusqlite::Row) -> rusqlite::Result<Map<String, Value>> {
    let mut map = Map::new();
    for (i, column) in table.columns().iter().enumerate() {
        let value = match row.get_ref(i)? {
            ValueRef::Null | ValueRef::Blob(_) => Value::Null,
            ValueRef::Integer(n) => Value::from(n),
            ValueRef::Real(f) => Value::from(f),
            ValueRef::Text(bytes) => {
                let text = String::from_utf8_lossy(bytes).into_owned();
                if table.is_json_column(column) {
                    serde_json::from_str(&text).unwrap_or(Value::String(text))
                } else {
                    Value::String(text)
                }
            }
        };
        map.insert(column.to_string(), value);
    }
    Ok(map)
}

fn project(
    conn: &Connection,
    table: Table,
    row: &Map<String, Value>,
    columns: &[Column],
) -> Result<Value, BackendError> {
    if columns.is_empty() {
        return Ok(Value::Object(row.clone()));
    }

    let mut out = Map::new();
    for column in columns {
        match column {
            Column::All => out.extend(row.clone()),
            Column::Field(name) => {
                out.insert(name.clone(), row.get(name).cloned().unwrap_or(Value::Null));
            }
            Column::Relation(rel) => {
                let embedded = match row.get(&rel.foreign_key).and_then(Value::as_str) {
                    Some(fk) => fetch_related(conn, rel, fk)?,
                    None => Value::Null,
                };
                out.insert(rel.table.as_str().to_string(), embedded);
            }
        }
    }
    tracing::trace!(table = table.as_str(), "projected row");
    Ok(Value::Object(out))
}

fn fetch_related(conn: &Connection, rel: &Relation, id: &str) -> Result<Value, BackendError> {
    match get_row(conn, rel.table, id)? {
        Some(row) => project(conn, rel.table, &row, &rel.columns),
        None => Ok(Value::Null),
    }
}

fn validate(query: &Select) -> Result<(), BackendError> {
    let table = query.table;
    validate_columns(table, &query.columns)?;

    for filter in &query.filters {
        check_column(table, filter.column())?;
    }
    if let Some(order) = &query.order {
        check_column(table, &order.column)?;
    }
    Ok(())
}

fn validate_columns(table: Table, columns: &[Column]) -> Result<(), BackendError> {
    for column in columns {
        match column {
            Column::All => {}
            Column::Field(name) => check_column(table, name)?,
            Column::Relation(rel) => {
                check_column(table, &rel.foreign_key)?;
                validate_columns(rel.table, &rel.columns)?;
            }
        }
    }
    Ok(())
}

fn check_column(table: Table, column: &str) -> Result<(), BackendError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(BackendError::InvalidQuery(format!(
            "unknown column {column} on {}",
            table.as_str()
        )))
    }
}

// ── Writes ──

pub fn insert(conn: &Connection, table: Table, row: &Value) -> Result<Value, BackendError> {
    let mut obj = row
        .as_object()
        .cloned()
        .ok_or_else(|| BackendError::InvalidQuery("insert payload must be an object".into()))?;

    if !obj.contains_key("id") {
        obj.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
    }
    if table == Table::Bookings && !obj.contains_key("updated_at") {
        obj.insert("updated_at".into(), Value::String(now_timestamp()));
    }

    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BackendError::InvalidQuery("id must be a string".into()))?;

    let mut columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len());
    for (key, value) in &obj {
        check_column(table, key)?;
        columns.push(key.as_str());
        values.push(to_sql_value(value));
    }
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.as_str(),
        columns.join(", "),
        placeholders.join(", ")
    );
    conn.execute(&sql, params_from_iter(values.iter()))?;

    get_row(conn, table, &id)?
        .map(Value::Object)
        .ok_or_else(|| BackendError::NotFound(format!("{} {id}", table.as_str())))
}

/// Applies `patch` to the row with `id`. Returns the updated row, or `None`
/// if no such row exists.
pub fn update(
    conn: &Connection,
    table: Table,
    id: &str,
    patch: &Value,
) -> Result<Option<Value>, BackendError> {
    let mut obj = patch
        .as_object()
        .cloned()
        .ok_or_else(|| BackendError::InvalidQuery("update payload must be an object".into()))?;
    obj.remove("id");

    if obj.is_empty() {
        return Err(BackendError::InvalidQuery("update payload is empty".into()));
    }
    if table == Table::Bookings && !obj.contains_key("updated_at") {
        obj.insert("updated_at".into(), Value::String(now_timestamp()));
    }

    let mut assignments = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);
    for (key, value) in &obj {
        check_column(table, key)?;
        values.push(to_sql_value(value));
        assignments.push(format!("{key} = ?{}", values.len()));
    }
    values.push(SqlValue::Text(id.to_string()));

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        table.as_str(),
        assignments.join(", "),
        values.len()
    );
    let count = conn.execute(&sql, params_from_iter(values.iter()))?;
    if count == 0 {
        return Ok(None);
    }

    Ok(get_row(conn, table, id)?.map(Value::Object))
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}
