use serde_json::{Map, Value};

use crate::error::{DataError, Result};

pub type Record = Map<String, Value>;

/// A loosely typed input table: named columns over JSON records. Column
/// identity is the contract between the loaders and the typed stages, so
/// the column list is tracked explicitly instead of being inferred per row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// Builds a table whose columns are the union of the record keys, in
    /// first-seen order.
    pub fn new(name: impl Into<String>, rows: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn with_columns(name: impl Into<String>, columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Fails with every absent column named, not just the first one.
    pub fn require(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|col| !self.has_column(col))
            .map(|col| col.to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(DataError::MissingColumns {
            table: self.name.clone(),
            columns: missing,
        })
    }

    pub fn drop_columns(&mut self, columns: &[&str]) {
        self.columns.retain(|c| !columns.contains(&c.as_str()));
        for row in &mut self.rows {
            for col in columns {
                row.remove(*col);
            }
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        for col in &mut self.columns {
            if col == from {
                *col = to.to_string();
            }
        }
        for row in &mut self.rows {
            if let Some(v) = row.remove(from) {
                row.insert(to.to_string(), v);
            }
        }
    }

    pub fn set_column_order(&mut self, columns: Vec<String>) {
        self.columns = columns;
    }

    /// Adds (or replaces) a column computed from each record.
    pub fn assign(&mut self, column: &str, mut f: impl FnMut(&Record) -> Value) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
        for row in &mut self.rows {
            let v = f(&*row);
            row.insert(column.to_string(), v);
        }
    }

    /// Validates `required` and decodes each record. An empty table decodes
    /// to nothing, whatever columns it lists.
    pub fn decode<T>(
        &self,
        required: &[&str],
        mut f: impl FnMut(&RowRef<'_>) -> Result<T>,
    ) -> Result<Vec<T>> {
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }
        self.require(required)?;
        self.rows
            .iter()
            .map(|record| {
                f(&RowRef {
                    table: &self.name,
                    record,
                })
            })
            .collect()
    }
}

/// One record plus the name of the table it came from, so decode failures
/// can name their source.
pub struct RowRef<'a> {
    table: &'a str,
    record: &'a Record,
}

impl RowRef<'_> {
    pub fn f64(&self, column: &str) -> Option<f64> {
        cell_f64(self.record, column)
    }

    pub fn u32(&self, column: &str) -> Option<u32> {
        cell_u32(self.record, column)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        cell_text(self.record, column)
    }

    pub fn flag(&self, column: &str) -> Option<bool> {
        cell_flag(self.record, column)
    }

    pub fn required_u32(&self, column: &str) -> Result<u32> {
        self.u32(column).ok_or_else(|| self.invalid(column, "expected a non-negative integer"))
    }

    pub fn required_text(&self, column: &str) -> Result<String> {
        self.text(column)
            .ok_or_else(|| self.invalid(column, "expected a non-empty string"))
    }

    fn invalid(&self, column: &str, detail: &str) -> DataError {
        DataError::InvalidValue {
            table: self.table.to_string(),
            column: column.to_string(),
            detail: format!("{detail}, got {}", self.record.get(column).unwrap_or(&Value::Null)),
        }
    }
}

/// Numbers may arrive as JSON numbers or numeric strings ("5.3").
pub fn cell_f64(record: &Record, column: &str) -> Option<f64> {
    match record.get(column)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

pub fn cell_u32(record: &Record, column: &str) -> Option<u32> {
    match record.get(column)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

pub fn cell_text(record: &Record, column: &str) -> Option<String> {
    match record.get(column)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn cell_flag(record: &Record, column: &str) -> Option<bool> {
    match record.get(column)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

/// JSON has no NaN/inf; those become null like any other undefined value.
pub fn number_value(v: Option<f64>) -> Value {
    v.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn require_names_every_missing_column() {
        let table = Table::new("teams", vec![record(json!({"Team ID": 1}))]);
        let err = table
            .require(&["Team ID", "Team Code", "Team Name"])
            .unwrap_err();
        match err {
            DataError::MissingColumns { table, columns } => {
                assert_eq!(table, "teams");
                assert_eq!(columns, vec!["Team Code", "Team Name"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn numeric_strings_are_numbers() {
        let r = record(json!({"a": "5.3", "b": 4, "c": null, "d": "x"}));
        assert_eq!(cell_f64(&r, "a"), Some(5.3));
        assert_eq!(cell_f64(&r, "b"), Some(4.0));
        assert_eq!(cell_f64(&r, "c"), None);
        assert_eq!(cell_f64(&r, "d"), None);
        assert_eq!(cell_f64(&r, "missing"), None);
    }

    #[test]
    fn rename_and_drop_keep_columns_in_sync() {
        let mut table = Table::new("t", vec![record(json!({"a": 1, "b": 2}))]);
        table.rename_column("a", "A");
        table.drop_columns(&["b"]);
        assert_eq!(table.columns(), ["A".to_string()]);
        assert_eq!(cell_u32(&table.rows()[0], "A"), Some(1));
        assert!(table.rows()[0].get("b").is_none());
    }
}
