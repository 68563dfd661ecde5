//! Build, sort and render pipeline

use crate::comparator::{sort_rows, RowComparator};
use crate::error::{SortError, SortResult};
use crate::io::{LineSink, LineSource};
use crate::table::{ColumnTypeMap, SortPriority, Table, TableBuilder};
use std::fmt;
use tracing::{debug, trace, warn};

/// Counters from a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub columns: usize,
    /// Comparisons that hit an incomparable column while sorting
    pub incomparable: usize,
}

/// Sorts one table from a source into a sink
pub struct Pipeline<'a> {
    column_types: &'a ColumnTypeMap,
    separator: &'a str,
    priority: &'a SortPriority,
}

impl<'a> Pipeline<'a> {
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

    /// Read every line of `source` into a typed table
    pub fn build<S: LineSource + ?Sized>(&self, source: &mut S) -> SortResult<Table> {
        TableBuilder::new(self.column_types, self.separator, self.priority).build(source)
    }

    /// Sort the table in place, returning how many comparisons were incomparable
    pub fn sort(&self, table: &mut Table) -> usize {
        if self.priority.is_empty() {
            debug!("no sort priority, keeping input order");
            return 0;
        }

        let comparator = RowComparator::new(self.priority);
        sort_rows(table.rows_mut(), &comparator);

        let incomparable = comparator.incomparable_count();
        if incomparable > 0 {
            warn!(
                incomparable,
                "some rows could not be ordered on a priority column and were treated as unordered"
            );
        }
        debug!(rows = table.len(), priority = ?self.priority.columns(), "table sorted");
        incomparable
    }

    /// Write every row, columns joined by the separator, each row ended by a newline
    pub fn render<W: LineSink + ?Sized>(&self, table: &Table, sink: &mut W) -> SortResult<()> {
        for (index, row) in table.rows().iter().enumerate() {
            for (column, value) in row.values().iter().enumerate() {
                if column > 0 {
                    sink.write(self.separator)?;
                }
                sink.write(&value.render())?;
            }
            sink.write("\n")?;
            trace!(row = index, "row written");
        }
        sink.flush()
    }

    /// Build, sort and render in one go
    pub fn execute<S, W>(&self, source: &mut S, sink: &mut W) -> SortResult<RunSummary>
    where
        S: LineSource + ?Sized,
        W: LineSink + ?Sized,
    {
        let mut table = self.build(source)?;
        let incomparable = self.sort(&mut table);
        self.render(&table, sink)?;

        Ok(RunSummary {
            rows: table.len(),
            columns: table.column_count(),
            incomparable,
        })
    }
}

/// Outcome of a run, as reported to the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    InvalidFormat { line: usize, column: usize },
    OutOfRange { line: usize, column: usize },
    RowShape { first_field_len: usize },
    ColumnOutOfRange { column: usize },
    StreamUnavailable { message: String },
    InvalidArguments { message: String },
    IoFailed { message: String },
}

impl ExitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    /// Process exit code for this outcome
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => crate::EXIT_SUCCESS,
            ExitStatus::InvalidFormat { .. } => crate::FORMAT_FAILURE,
            ExitStatus::OutOfRange { .. } => crate::RANGE_FAILURE,
            ExitStatus::RowShape { .. } => crate::ROW_SHAPE_FAILURE,
            ExitStatus::ColumnOutOfRange { .. } => crate::COLUMN_FAILURE,
            ExitStatus::StreamUnavailable { .. } => crate::STREAM_FAILURE,
            ExitStatus::InvalidArguments { .. } => crate::ARGUMENT_FAILURE,
            ExitStatus::IoFailed { .. } => crate::EXIT_FAILURE,
        }
    }
}

impl From<SortError> for ExitStatus {
    fn from(err: SortError) -> Self {
        match err {
            SortError::InvalidCellFormat { line, column } => {
                ExitStatus::InvalidFormat { line, column }
            }
            SortError::CellOutOfRange { line, column } => ExitStatus::OutOfRange { line, column },
            SortError::RowShape { first_field_len } => ExitStatus::RowShape { first_field_len },
            SortError::ColumnOutOfRange { column } => ExitStatus::ColumnOutOfRange { column },
            SortError::StreamUnavailable { .. } => ExitStatus::StreamUnavailable {
                message: err.to_string(),
            },
            SortError::InvalidSeparator { .. }
            | SortError::InvalidKindSpec { .. }
            | SortError::InvalidColumnSpec { .. } => ExitStatus::InvalidArguments {
                message: err.to_string(),
            },
            SortError::Io(_) | SortError::Utf8Error(_) => ExitStatus::IoFailed {
                message: err.to_string(),
            },
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Success => f.write_str("success"),
            ExitStatus::InvalidFormat { line, column } => {
                write!(f, "{}", SortError::invalid_cell_format(*line, *column))
            }
            ExitStatus::OutOfRange { line, column } => {
                write!(f, "{}", SortError::cell_out_of_range(*line, *column))
            }
            ExitStatus::RowShape { first_field_len } => {
                write!(f, "{}", SortError::row_shape(*first_field_len))
            }
            ExitStatus::ColumnOutOfRange { column } => {
                write!(f, "{}", SortError::column_out_of_range(*column))
            }
            ExitStatus::StreamUnavailable { message }
            | ExitStatus::InvalidArguments { message }
            | ExitStatus::IoFailed { message } => f.write_str(message),
        }
    }
}

/// Run the whole pipeline and classify the outcome
pub fn run<S, W>(
    source: &mut S,
    sink: &mut W,
    column_types: &ColumnTypeMap,
    separator: &str,
    priority: &SortPriority,
) -> ExitStatus
where
    S: LineSource + ?Sized,
    W: LineSink + ?Sized,
{
    match Pipeline::new(column_types, separator, priority).execute(source, sink) {
        Ok(summary) => {
            debug!(rows = summary.rows, columns = summary.columns, "run complete");
            ExitStatus::Success
        }
        Err(err) => err.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ReaderSource;
    use crate::value::ValueKind;

    fn run_str(
        input: &str,
        types: &[(usize, ValueKind)],
        separator: &str,
        priority: &[usize],
    ) -> (ExitStatus, String) {
        let column_types: ColumnTypeMap = types.iter().copied().collect();
        let priority = SortPriority::new(priority.to_vec());
        let mut source = ReaderSource::new(input.as_bytes());
        let mut output: Vec<u8> = Vec::new();
        let status = run(&mut source, &mut output, &column_types, separator, &priority);
        let text = String::from_utf8(output).expect("Output was not UTF-8");
        (status, text)
    }

    #[test]
    fn test_integer_column_sorts_numerically() {
        let (status, output) = run_str("3 b\n1 a\n2 a\n", &[(0, ValueKind::Integer)], " ", &[0]);
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(output, "1 a\n2 a\n3 b\n");
    }

    #[test]
    fn test_text_column_sorts_lexicographically() {
        let (status, output) = run_str("10\n9\n", &[(0, ValueKind::Text)], " ", &[0]);
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(output, "10\n9\n");

        let (_, output) = run_str("10\n9\n", &[(0, ValueKind::Integer)], " ", &[0]);
        assert_eq!(output, "9\n10\n");
    }

    #[test]
    fn test_decimal_and_frequency_columns() {
        let (status, output) = run_str(
            "1.5;abb\n1.45;aab\n-2;zzz\n",
            &[(0, ValueKind::Decimal), (1, ValueKind::FrequencyText)],
            ";",
            &[0],
        );
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(output, "-2;zzz\n1.45;aab\n1.5;abb\n");

        let (_, output) = run_str(
            "1.5;abb\n1.45;aab\n-2;zzz\n",
            &[(0, ValueKind::Decimal), (1, ValueKind::FrequencyText)],
            ";",
            &[1],
        );
        assert_eq!(output, "-2;zzz\n1.45;aab\n1.5;abb\n");
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let input = "b 2\na 2\nc 1\n";
        let types = [(1, ValueKind::Integer)];
        let (_, by_primary) = run_str(input, &types, " ", &[1]);
        assert_eq!(by_primary, "c 1\nb 2\na 2\n");

        let (_, by_both) = run_str(input, &types, " ", &[1, 0]);
        assert_eq!(by_both, "c 1\na 2\nb 2\n");
    }

    #[test]
    fn test_empty_priority_is_identity() {
        let input = "z|3\na|1\nm|2\n";
        let (status, output) = run_str(input, &[(1, ValueKind::Integer)], "|", &[]);
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(output, input);
    }

    #[test]
    fn test_round_trip_preserves_cell_text() {
        let input = "007.100,x\n-0.0,y\n.5,z\n5.,w\n";
        let (_, output) = run_str(input, &[(0, ValueKind::Decimal)], ",", &[]);
        assert_eq!(output, input);
    }

    #[test]
    fn test_multi_character_separator() {
        let (_, output) = run_str("b::2\na::1\n", &[(1, ValueKind::Integer)], "::", &[1]);
        assert_eq!(output, "a::1\nb::2\n");
    }

    #[test]
    fn test_build_errors_map_to_exit_status() {
        let (status, output) = run_str("a b\nlong\n", &[], " ", &[]);
        assert_eq!(status, ExitStatus::RowShape { first_field_len: 4 });
        assert_eq!(status.code(), 20);
        assert!(output.is_empty());

        let (status, _) = run_str("a b\n", &[], " ", &[5]);
        assert_eq!(status, ExitStatus::ColumnOutOfRange { column: 6 });

        let (status, _) = run_str("1\nx\n", &[(0, ValueKind::Integer)], " ", &[0]);
        assert_eq!(status, ExitStatus::InvalidFormat { line: 2, column: 1 });
        assert_eq!(status.to_string(), "line 2, column 1 - invalid format");

        let (status, _) = run_str(
            "1\n9223372036854775808\n",
            &[(0, ValueKind::Integer)],
            " ",
            &[0],
        );
        assert_eq!(status, ExitStatus::OutOfRange { line: 2, column: 1 });
        assert_eq!(status.code(), 23);
    }

    #[test]
    fn test_exit_status_codes_agree_with_errors() {
        let errors = [
            SortError::invalid_cell_format(1, 1),
            SortError::cell_out_of_range(1, 1),
            SortError::row_shape(1),
            SortError::column_out_of_range(1),
            SortError::stream_unavailable("in.txt", "Permission denied"),
            SortError::invalid_kind_spec("X1"),
        ];
        for err in errors {
            let code = err.exit_code();
            assert_eq!(ExitStatus::from(err).code(), code);
        }
    }

    #[test]
    fn test_pipeline_reports_summary() -> SortResult<()> {
        let column_types: ColumnTypeMap = [(0, ValueKind::FrequencyText)].into_iter().collect();
        let priority = SortPriority::new(vec![0]);
        let pipeline = Pipeline::new(&column_types, " ", &priority);

        let mut source = ReaderSource::new("ab x\nabc y\n".as_bytes());
        let mut output: Vec<u8> = Vec::new();
        let summary = pipeline.execute(&mut source, &mut output)?;

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.columns, 2);
        assert!(summary.incomparable > 0);
        // Unordered pairs keep their input order.
        assert_eq!(output, b"ab x\nabc y\n");
        Ok(())
    }

    struct ClosedPipe;

    impl std::io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_failure_is_io_failure() {
        let column_types = ColumnTypeMap::new();
        let priority = SortPriority::new(vec![0]);
        let mut source = ReaderSource::new("b\na\n".as_bytes());
        let status = run(&mut source, &mut ClosedPipe, &column_types, " ", &priority);

        assert_eq!(
            status,
            ExitStatus::IoFailed {
                message: "I/O error: writing output: closed".to_string()
            }
        );
        assert_eq!(status.code(), crate::EXIT_FAILURE);
    }
}
