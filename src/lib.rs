//! Typed column sort in Rust
//!
//! This crate sorts delimited text by a priority list of typed columns. Each sort column is
//! read as an integer, plain text, an unbounded decimal, or a letter-frequency string, and
//! compared with that kind's rules. Output keeps every cell exactly as it was written.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod logging;

// Core sorting implementation
pub mod comparator;
pub mod io;
pub mod pipeline;
pub mod table;
pub mod value;

// Re-export commonly used types
pub use config::{ColumnSpec, SortConfig, SortConfigBuilder};
pub use error::{SortError, SortResult};
pub use pipeline::{ExitStatus, Pipeline, RunSummary};
pub use table::{ColumnTypeMap, SortPriority};
pub use value::{Comparison, TypedValue, ValueKind};

use tracing::info;

/// Exit codes reported by the command-line tool
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const STREAM_FAILURE: i32 = 2;
pub const ARGUMENT_FAILURE: i32 = 10;
pub const ROW_SHAPE_FAILURE: i32 = 20;
pub const COLUMN_FAILURE: i32 = 21;
pub const FORMAT_FAILURE: i32 = 22;
pub const RANGE_FAILURE: i32 = 23;

/// Sort the configured input into the configured output
pub fn sort(config: &SortConfig) -> ExitStatus {
    match sort_streams(config) {
        Ok(summary) => {
            info!(
                rows = summary.rows,
                columns = summary.columns,
                "sorted"
            );
            ExitStatus::Success
        }
        Err(err) => err.into(),
    }
}

fn sort_streams(config: &SortConfig) -> SortResult<RunSummary> {
    config.validate()?;
    let column_types = config.column_types();
    let priority = config.sort_priority();
    let pipeline = Pipeline::new(&column_types, &config.separator, &priority);

    // The whole input is read, and its file released, before the output is created, so
    // sorting a file onto itself is safe.
    let mut table = {
        let mut source = io::open_source(config.input_file.as_deref())?;
        pipeline.build(source.as_mut())?
    };

    let incomparable = pipeline.sort(&mut table);

    let mut sink = io::open_sink(config.output_file.as_deref())?;
    pipeline.render(&table, sink.as_mut())?;

    Ok(RunSummary {
        rows: table.len(),
        columns: table.column_count(),
        incomparable,
    })
}
