//! Positional cursors over query results.
//!
//! A cursor starts before its first row. `move_to_*` report whether the
//! cursor ended on a row; getters read a column of the current row by index
//! into [`Cursor::column_names`].

use std::str::FromStr;

use rowmap_core::{Error, FlatRecord, ScalarKind, Value};
use rowmap_serde::to_json_string;

/// Row-at-a-time access to a result set.
pub trait Cursor {
    /// Number of rows.
    fn count(&self) -> usize;

    fn column_names(&self) -> &[String];

    /// Current row index; `None` before the first row, `Some(count)` after
    /// the last.
    fn position(&self) -> Option<usize>;

    /// Move to `position`, clamping to just past the last row.
    fn move_to_position(&mut self, position: usize) -> bool;

    fn move_to_first(&mut self) -> bool {
        self.move_to_position(0)
    }

    fn move_to_next(&mut self) -> bool {
        let next = self.position().map_or(0, |p| p.saturating_add(1));
        self.move_to_position(next)
    }

    /// Index of the column called `name`.
    fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names().iter().position(|c| c == name)
    }

    fn get_string(&self, column: usize) -> Result<Option<String>, Error>;
    fn get_short(&self, column: usize) -> Result<i16, Error>;
    fn get_int(&self, column: usize) -> Result<i32, Error>;
    fn get_long(&self, column: usize) -> Result<i64, Error>;
    fn get_float(&self, column: usize) -> Result<f32, Error>;
    fn get_double(&self, column: usize) -> Result<f64, Error>;
    fn is_null(&self, column: usize) -> Result<bool, Error>;
}

fn clamp(position: usize, count: usize) -> (Option<usize>, bool) {
    if position < count {
        (Some(position), true)
    } else {
        (Some(count), false)
    }
}

/// Cursor over flat rows, one column per dotted field path.
///
/// Column names are those of the first row; a cell missing from a later
/// row reads as null.
#[derive(Clone, Debug, Default)]
pub struct RowCursor {
    rows: Vec<FlatRecord>,
    columns: Vec<String>,
    position: Option<usize>,
}

impl RowCursor {
    pub fn new(rows: Vec<FlatRecord>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            rows,
            columns,
            position: None,
        }
    }

    /// The underlying rows.
    pub fn into_rows(self) -> Vec<FlatRecord> {
        self.rows
    }

    fn cell(&self, column: usize) -> Result<Option<&str>, Error> {
        let out_of_range = || Error::CursorOutOfRange {
            row: self.position,
            column,
        };
        let row = self
            .position
            .and_then(|p| self.rows.get(p))
            .ok_or_else(out_of_range)?;
        let name = self.columns.get(column).ok_or_else(out_of_range)?;
        Ok(row.get(name))
    }

    fn parse<T: FromStr>(&self, column: usize, kind: ScalarKind) -> Result<T, Error> {
        let cell = self.cell(column)?;
        cell.and_then(|text| text.trim().parse().ok())
            .ok_or_else(|| Error::InvalidScalar {
                path: self.columns[column].clone(),
                kind,
                value: cell.unwrap_or("null").to_string(),
            })
    }
}

impl Cursor for RowCursor {
    fn count(&self) -> usize {
        self.rows.len()
    }

    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn position(&self) -> Option<usize> {
        self.position
    }

    fn move_to_position(&mut self, position: usize) -> bool {
        let (position, on_row) = clamp(position, self.rows.len());
        self.position = position;
        on_row
    }

    fn get_string(&self, column: usize) -> Result<Option<String>, Error> {
        Ok(self.cell(column)?.map(str::to_string))
    }

    fn get_short(&self, column: usize) -> Result<i16, Error> {
        self.parse(column, ScalarKind::Short)
    }

    fn get_int(&self, column: usize) -> Result<i32, Error> {
        self.parse(column, ScalarKind::Int)
    }

    fn get_long(&self, column: usize) -> Result<i64, Error> {
        self.parse(column, ScalarKind::Long)
    }

    fn get_float(&self, column: usize) -> Result<f32, Error> {
        self.parse(column, ScalarKind::Float)
    }

    fn get_double(&self, column: usize) -> Result<f64, Error> {
        self.parse(column, ScalarKind::Double)
    }

    fn is_null(&self, column: usize) -> Result<bool, Error> {
        Ok(self.cell(column)?.is_none())
    }
}

/// Columns exposed by [`JsonRowCursor`].
pub const JSON_COLUMNS: [&str; 2] = ["DATA", "NOTIFY"];

/// Cursor over whole structured values, each row serialized as JSON.
///
/// Every column of a row reads as the JSON text of its value; numeric
/// getters read as zero and no cell is null.
#[derive(Clone, Debug)]
pub struct JsonRowCursor {
    values: Vec<Value>,
    columns: Vec<String>,
    position: Option<usize>,
}

impl JsonRowCursor {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            columns: JSON_COLUMNS.iter().map(|c| c.to_string()).collect(),
            position: None,
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    fn current(&self, column: usize) -> Result<&Value, Error> {
        let out_of_range = || Error::CursorOutOfRange {
            row: self.position,
            column,
        };
        if column >= self.columns.len() {
            return Err(out_of_range());
        }
        self.position
            .and_then(|p| self.values.get(p))
            .ok_or_else(out_of_range)
    }
}

impl Cursor for JsonRowCursor {
    fn count(&self) -> usize {
        self.values.len()
    }

    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn position(&self) -> Option<usize> {
        self.position
    }

    fn move_to_position(&mut self, position: usize) -> bool {
        let (position, on_row) = clamp(position, self.values.len());
        self.position = position;
        on_row
    }

    fn get_string(&self, column: usize) -> Result<Option<String>, Error> {
        to_json_string(self.current(column)?).map(Some)
    }

    fn get_short(&self, column: usize) -> Result<i16, Error> {
        self.current(column).map(|_| 0)
    }

    fn get_int(&self, column: usize) -> Result<i32, Error> {
        self.current(column).map(|_| 0)
    }

    fn get_long(&self, column: usize) -> Result<i64, Error> {
        self.current(column).map(|_| 0)
    }

    fn get_float(&self, column: usize) -> Result<f32, Error> {
        self.current(column).map(|_| 0.0)
    }

    fn get_double(&self, column: usize) -> Result<f64, Error> {
        self.current(column).map(|_| 0.0)
    }

    fn is_null(&self, column: usize) -> Result<bool, Error> {
        self.current(column).map(|_| false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    fn rows() -> Vec<FlatRecord> {
        vec![
            [("address.city", "NY"), ("id", "1"), ("score", "2.5")]
                .into_iter()
                .collect(),
            [("id", "70000"), ("score", "x")].into_iter().collect(),
        ]
    }

    #[test]
    fn columns_from_first_row() {
        let cursor = RowCursor::new(rows());
        assert_eq!(cursor.count(), 2);
        assert_eq!(cursor.column_names(), ["address.city", "id", "score"]);
        assert_eq!(cursor.column_index("id"), Some(1));

        assert!(RowCursor::new(Vec::new()).column_names().is_empty());
    }

    #[test]
    fn movement() {
        let mut cursor = RowCursor::new(rows());
        assert_eq!(cursor.position(), None);
        assert!(cursor.move_to_next());
        assert_eq!(cursor.position(), Some(0));
        assert!(cursor.move_to_next());
        assert!(!cursor.move_to_next());
        assert_eq!(cursor.position(), Some(2));
        assert!(!cursor.move_to_next());
        assert!(cursor.move_to_first());
        assert!(!cursor.move_to_position(9));
        assert_eq!(cursor.position(), Some(2));
    }

    #[test]
    fn typed_getters() {
        let mut cursor = RowCursor::new(rows());
        assert!(matches!(
            cursor.get_string(0),
            Err(Error::CursorOutOfRange { row: None, .. })
        ));

        cursor.move_to_first();
        assert_eq!(cursor.get_string(0).unwrap().as_deref(), Some("NY"));
        assert_eq!(cursor.get_int(1).unwrap(), 1);
        assert_eq!(cursor.get_short(1).unwrap(), 1);
        assert_eq!(cursor.get_long(1).unwrap(), 1);
        assert!((cursor.get_float(2).unwrap() - 2.5).abs() < f32::EPSILON);
        assert!((cursor.get_double(2).unwrap() - 2.5).abs() < f64::EPSILON);
        assert!(!cursor.is_null(0).unwrap());
        assert!(matches!(
            cursor.get_string(3),
            Err(Error::CursorOutOfRange { row: Some(0), column: 3 })
        ));

        cursor.move_to_next();
        assert!(cursor.is_null(0).unwrap());
        assert_eq!(cursor.get_string(0).unwrap(), None);
        assert!(matches!(cursor.get_short(1), Err(Error::InvalidScalar { .. })));
        assert_eq!(cursor.get_int(1).unwrap(), 70000);
        assert!(matches!(cursor.get_double(2), Err(Error::InvalidScalar { .. })));
        assert!(matches!(cursor.get_long(0), Err(Error::InvalidScalar { .. })));
    }

    #[test]
    fn json_cursor() {
        let value = Value::Map(btree! {
            "id".into() => Value::Integer(1),
            "address".into() => Value::Map(btree! { "city".into() => Value::from("NY") }),
        });
        let mut cursor = JsonRowCursor::new(vec![value]);

        assert_eq!(cursor.count(), 1);
        assert_eq!(cursor.column_names(), JSON_COLUMNS);
        assert!(cursor.move_to_first());

        let expected = r#"{"address":{"city":"NY"},"id":1}"#;
        assert_eq!(cursor.get_string(0).unwrap().as_deref(), Some(expected));
        assert_eq!(cursor.get_string(1).unwrap().as_deref(), Some(expected));
        assert_eq!(cursor.get_int(0).unwrap(), 0);
        assert_eq!(cursor.get_double(1).unwrap(), 0.0);
        assert!(!cursor.is_null(0).unwrap());
        assert!(matches!(
            cursor.get_string(2),
            Err(Error::CursorOutOfRange { .. })
        ));
    }
}
