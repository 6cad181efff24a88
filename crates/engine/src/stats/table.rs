use serde_json::{json, Map, Value};

use courtside_common::api::stats::ResultSet;

/// A tabular lookup result: named columns plus rows of untyped cells.
///
/// Mirrors the stats provider's result-set shape so the handlers can filter,
/// project, and serialize without knowing per-endpoint schemas.
#[derive(Clone, Debug, Default)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Errors from table operations — always a caller bug or schema drift at the
/// provider, never a data miss (an empty table is a valid result).
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
}

impl DataTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    pub fn from_result_set(rs: ResultSet) -> Self {
        Self {
            headers: rs.headers,
            rows: rs.row_set,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Cell value at (row, column), if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column(column).ok()?;
        self.rows.get(row)?.get(idx)
    }

    /// Cell value coerced to i64 (numbers and numeric strings).
    pub fn int_value(&self, row: usize, column: &str) -> Option<i64> {
        as_i64(self.value(row, column)?)
    }

    /// Rows whose cell in `column` equals `needle` as text (exact match).
    pub fn filter_text_eq(&self, column: &str, needle: &str) -> Result<DataTable, TableError> {
        let idx = self.column(column)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| row.get(idx).and_then(Value::as_str) == Some(needle))
            .cloned()
            .collect();
        Ok(DataTable {
            headers: self.headers.clone(),
            rows,
        })
    }

    /// Rows whose cell in `column` equals `id` numerically. Cells holding
    /// numeric strings compare equal to the same number.
    pub fn filter_num_eq(&self, column: &str, id: i64) -> Result<DataTable, TableError> {
        let idx = self.column(column)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| row.get(idx).and_then(as_i64) == Some(id))
            .cloned()
            .collect();
        Ok(DataTable {
            headers: self.headers.clone(),
            rows,
        })
    }

    /// Rows whose cell in `column` equals the column's maximum value.
    /// Ties all survive. Empty input stays empty.
    pub fn rows_with_max(&self, column: &str) -> Result<DataTable, TableError> {
        let idx = self.column(column)?;

        let max = self
            .rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(as_f64))
            .fold(None::<f64>, |acc, v| match acc {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            });

        let rows = match max {
            Some(max) => self
                .rows
                .iter()
                .filter(|row| row.get(idx).and_then(as_f64) == Some(max))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        Ok(DataTable {
            headers: self.headers.clone(),
            rows,
        })
    }

    /// Project the table down to the named columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> Result<DataTable, TableError> {
        let indices: Vec<usize> = columns
            .iter()
            .map(|c| self.column(c))
            .collect::<Result<_, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Ok(DataTable {
            headers: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// Render to JSON with one object per row, capped at `max_rows` with a
    /// note about omitted rows.
    pub fn to_json_records(&self, max_rows: usize) -> Value {
        let shown = self.rows.len().min(max_rows);

        let records: Vec<Value> = self.rows[..shown]
            .iter()
            .map(|row| {
                let mut record = Map::new();
                for (header, cell) in self.headers.iter().zip(row) {
                    record.insert(header.clone(), cell.clone());
                }
                Value::Object(record)
            })
            .collect();

        let mut out = json!({
            "rows": records,
            "row_count": self.rows.len(),
        });

        if shown < self.rows.len() {
            out["truncated"] = Value::String(format!(
                "[{} more rows omitted]",
                self.rows.len() - shown
            ));
        }

        out
    }
}

fn as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> DataTable {
        DataTable::new(
            vec!["PERSON_ID".into(), "DISPLAY_FIRST_LAST".into(), "TEAM_ID".into()],
            vec![
                vec![json!(202691), json!("Klay Thompson"), json!(1610612744)],
                vec![json!(201939), json!("Stephen Curry"), json!(1610612744)],
                vec![json!(2544), json!("LeBron James"), json!(1610612747)],
            ],
        )
    }

    #[test]
    fn test_filter_text_eq_exact_match() {
        let matched = players()
            .filter_text_eq("DISPLAY_FIRST_LAST", "Klay Thompson")
            .unwrap();
        assert_eq!(matched.row_count(), 1);
        assert_eq!(matched.int_value(0, "PERSON_ID"), Some(202691));
    }

    #[test]
    fn test_filter_text_eq_absent_name_is_empty_not_error() {
        let matched = players()
            .filter_text_eq("DISPLAY_FIRST_LAST", "Zzyzx Qqq")
            .unwrap();
        assert!(matched.is_empty());
    }

    #[test]
    fn test_filter_num_eq_matches_string_and_number_cells() {
        let table = DataTable::new(
            vec!["TEAM_ID".into(), "LEAGUE_TITLES".into()],
            vec![
                vec![json!("1610612744"), json!(7)],
                vec![json!(1610612744), json!(6)],
                vec![json!(1610612747), json!(17)],
            ],
        );
        let matched = table.filter_num_eq("TEAM_ID", 1610612744).unwrap();
        assert_eq!(matched.row_count(), 2);
    }

    #[test]
    fn test_rows_with_max_keeps_ties() {
        let table = DataTable::new(
            vec!["SEASON_ID".into(), "PTS".into()],
            vec![
                vec![json!("2014-15"), json!(1668)],
                vec![json!("2016-17"), json!(1742)],
                vec![json!("2018-19"), json!(1742)],
                vec![json!("2021-22"), json!(659)],
            ],
        );
        let best = table.rows_with_max("PTS").unwrap();
        assert_eq!(best.row_count(), 2);
        assert_eq!(best.value(0, "SEASON_ID"), Some(&json!("2016-17")));
    }

    #[test]
    fn test_rows_with_max_on_empty_table() {
        let table = DataTable::new(vec!["PTS".into()], vec![]);
        assert!(table.rows_with_max("PTS").unwrap().is_empty());
    }

    #[test]
    fn test_select_projects_and_reorders() {
        let projected = players()
            .select(&["DISPLAY_FIRST_LAST", "PERSON_ID"])
            .unwrap();
        assert_eq!(projected.headers(), &["DISPLAY_FIRST_LAST", "PERSON_ID"]);
        assert_eq!(projected.value(0, "DISPLAY_FIRST_LAST"), Some(&json!("Klay Thompson")));
    }

    #[test]
    fn test_select_unknown_column() {
        let err = players().select(&["NO_SUCH_COLUMN"]).unwrap_err();
        assert!(matches!(err, TableError::UnknownColumn(_)));
    }

    #[test]
    fn test_to_json_records_truncation() {
        let rendered = players().to_json_records(2);
        assert_eq!(rendered["rows"].as_array().unwrap().len(), 2);
        assert_eq!(rendered["row_count"], 3);
        assert!(rendered["truncated"].as_str().unwrap().contains("1 more"));

        let full = players().to_json_records(10);
        assert!(full.get("truncated").is_none());
        assert_eq!(full["rows"][0]["DISPLAY_FIRST_LAST"], "Klay Thompson");
    }
}
