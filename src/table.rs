//! Typed tables built from delimited text

use crate::error::{SortError, SortResult};
use crate::io::LineSource;
use crate::value::{ParseError, TypedValue, ValueKind};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Split a line on a literal (non-pattern) separator
pub fn split_fields<'a>(line: &'a str, separator: &str) -> Vec<&'a str> {
    line.split(separator).collect()
}

/// Explicit column kinds, keyed by zero-based column index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTypeMap {
    kinds: BTreeMap<usize, ValueKind>,
}

impl ColumnTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the kind of a column, returning the kind it replaces
    pub fn insert(&mut self, column: usize, kind: ValueKind) -> Option<ValueKind> {
        self.kinds.insert(column, kind)
    }

    pub fn get(&self, column: usize) -> Option<ValueKind> {
        self.kinds.get(&column).copied()
    }

    /// Kinds for every column of a table with `column_count` columns; untyped columns are text
    pub fn resolve(&self, column_count: usize) -> Vec<ValueKind> {
        (0..column_count)
            .map(|column| self.get(column).unwrap_or(ValueKind::Text))
            .collect()
    }
}

impl FromIterator<(usize, ValueKind)> for ColumnTypeMap {
    fn from_iter<I: IntoIterator<Item = (usize, ValueKind)>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().collect(),
        }
    }
}

/// Zero-based column indices, highest priority first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortPriority {
    columns: Vec<usize>,
}

impl SortPriority {
    pub fn new(columns: Vec<usize>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<Vec<usize>> for SortPriority {
    fn from(columns: Vec<usize>) -> Self {
        Self::new(columns)
    }
}

impl FromIterator<usize> for SortPriority {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// One parsed line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Vec<TypedValue>,
}

impl Row {
    pub fn new(values: Vec<TypedValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[TypedValue] {
        &self.values
    }

    pub fn get(&self, column: usize) -> Option<&TypedValue> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows sharing one column layout, in input order until sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    kinds: Vec<ValueKind>,
    rows: Vec<Row>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads lines into a [`Table`], validating shape, priority columns and cell formats.
///
/// The first line fixes the column count. Every later line must split into the same number
/// of fields. The first failure aborts the build.
pub struct TableBuilder<'a> {
    column_types: &'a ColumnTypeMap,
    separator: &'a str,
    priority: &'a SortPriority,
}

impl<'a> TableBuilder<'a> {
    pub fn new(
        column_types: &'a ColumnTypeMap,
        separator: &'a str,
        priority: &'a SortPriority,
    ) -> Self {
        Self {
            column_types,
            separator,
            priority,
        }
    }

    pub fn build<S: LineSource + ?Sized>(&self, source: &mut S) -> SortResult<Table> {
        let mut table = Table::default();
        if !source.has_more()? {
            debug!("empty input, nothing to build");
            return Ok(table);
        }

        let first = source.next_line()?;
        let fields = split_fields(&first, self.separator);
        let column_count = fields.len();

        if let Some(&column) = self
            .priority
            .columns()
            .iter()
            .find(|&&column| column >= column_count)
        {
            return Err(SortError::column_out_of_range(column + 1));
        }

        table.kinds = self.column_types.resolve(column_count);
        debug!(columns = column_count, kinds = ?table.kinds, "column layout fixed by first line");
        self.push_row(&mut table, &fields)?;

        while source.has_more()? {
            let line = source.next_line()?;
            let fields = split_fields(&line, self.separator);
            if fields.len() != column_count {
                // Byte length of the offending line's first field
                let first_field_len = fields.first().map_or(0, |field| field.len());
                debug!(
                    line = table.len() + 1,
                    fields = fields.len(),
                    expected = column_count,
                    "row shape mismatch"
                );
                return Err(SortError::row_shape(first_field_len));
            }
            self.push_row(&mut table, &fields)?;
        }

        debug!(rows = table.len(), "table built");
        Ok(table)
    }

    fn push_row(&self, table: &mut Table, fields: &[&str]) -> SortResult<()> {
        let line = table.len() + 1;
        let values = fields
            .iter()
            .zip(&table.kinds)
            .enumerate()
            .map(|(index, (field, &kind))| {
                TypedValue::parse(kind, field).map_err(|err| match err {
                    ParseError::InvalidFormat => SortError::invalid_cell_format(line, index + 1),
                    ParseError::OutOfRange => SortError::cell_out_of_range(line, index + 1),
                })
            })
            .collect::<SortResult<Vec<_>>>()?;

        trace!(line, "row parsed");
        table.rows.push(Row::new(values));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ReaderSource;

    fn build(
        input: &str,
        types: &[(usize, ValueKind)],
        separator: &str,
        priority: &[usize],
    ) -> SortResult<Table> {
        let column_types: ColumnTypeMap = types.iter().copied().collect();
        let priority = SortPriority::new(priority.to_vec());
        let mut source = ReaderSource::new(input.as_bytes());
        TableBuilder::new(&column_types, separator, &priority).build(&mut source)
    }

    #[test]
    fn test_split_fields_uses_literal_separator() {
        assert_eq!(split_fields("a.b.c", "."), vec!["a", "b", "c"]);
        assert_eq!(split_fields("a::b", "::"), vec!["a", "b"]);
        assert_eq!(split_fields("a,,b,", ","), vec!["a", "", "b", ""]);
        assert_eq!(split_fields("", ","), vec![""]);
    }

    #[test]
    fn test_untyped_columns_default_to_text() {
        let types: ColumnTypeMap = [(1, ValueKind::Integer)].into_iter().collect();
        assert_eq!(
            types.resolve(3),
            vec![ValueKind::Text, ValueKind::Integer, ValueKind::Text]
        );
    }

    #[test]
    fn test_build_typed_rows() -> SortResult<()> {
        let table = build("3 b\n1 a\n", &[(0, ValueKind::Integer)], " ", &[0])?;
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].get(0), Some(&TypedValue::Integer(3)));
        assert_eq!(
            table.rows()[1].get(1),
            Some(&TypedValue::Text("a".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_empty_input_builds_empty_table() -> SortResult<()> {
        let table = build("", &[], " ", &[4])?;
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 0);
        Ok(())
    }

    #[test]
    fn test_row_shape_reports_first_field_length() {
        let result = build("a b\nlonger x y\n", &[], " ", &[]);
        assert!(matches!(
            result,
            Err(SortError::RowShape { first_field_len: 6 })
        ));

        let result = build("a b
éé
", &[], " ", &[]);
        assert!(matches!(
            result,
            Err(SortError::RowShape { first_field_len: 4 })
        ));
    }

    #[test]
    fn test_priority_column_out_of_range() {
        let result = build("a b\n", &[], " ", &[0, 2]);
        assert!(matches!(result, Err(SortError::ColumnOutOfRange { column: 3 })));
    }

    #[test]
    fn test_invalid_cell_reports_line_and_column() {
        let result = build("1 x\n2 y\nz 3\n", &[(0, ValueKind::Integer)], " ", &[0]);
        assert!(matches!(
            result,
            Err(SortError::InvalidCellFormat { line: 3, column: 1 })
        ));
    }

    #[test]
    fn test_out_of_range_cell() {
        let result = build(
            "a,1\nb,99999999999999999999\n",
            &[(1, ValueKind::Integer)],
            ",",
            &[1],
        );
        assert!(matches!(
            result,
            Err(SortError::CellOutOfRange { line: 2, column: 2 })
        ));
    }

    #[test]
    fn test_first_error_aborts_build() {
        // Line 2 has a bad integer; line 3's shape error is never reached.
        let result = build("1\nx\n1 2\n", &[(0, ValueKind::Integer)], " ", &[]);
        assert!(matches!(
            result,
            Err(SortError::InvalidCellFormat { line: 2, column: 1 })
        ));
    }
}
