//! Configuration management for typed sort runs

use crate::error::{SortError, SortResult};
use crate::io::is_standard_stream;
use crate::table::{ColumnTypeMap, SortPriority};
use crate::value::ValueKind;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Separator used when none is given
pub const DEFAULT_SEPARATOR: &str = " ";

/// A typed sort column such as `N2` (second column, integer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub kind: ValueKind,
    /// Column number (1-based)
    pub column: usize,
}

impl ColumnSpec {
    pub fn new(kind: ValueKind, column: usize) -> Self {
        Self { kind, column }
    }

    /// Parse a spec like "N1", "S2", "U3" or "F4"
    pub fn parse(spec: &str) -> SortResult<Self> {
        let mut chars = spec.chars();
        let kind = chars
            .next()
            .and_then(ValueKind::from_letter)
            .ok_or_else(|| SortError::invalid_kind_spec(spec))?;

        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SortError::invalid_column_spec(spec));
        }

        let column = digits
            .parse::<usize>()
            .map_err(|_| SortError::invalid_column_spec(spec))?;
        if column == 0 {
            return Err(SortError::invalid_column_spec(spec));
        }

        Ok(Self { kind, column })
    }

    /// Zero-based column index
    pub fn index(&self) -> usize {
        self.column - 1
    }
}

impl FromStr for ColumnSpec {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.column)
    }
}

/// Main configuration structure for typed sort runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortConfig {
    /// Input file (stdin when unset or `-`)
    pub input_file: Option<PathBuf>,
    /// Output file (stdout when unset or `-`)
    pub output_file: Option<PathBuf>,
    /// Literal field separator
    pub separator: String,
    /// Typed columns, highest sort priority first
    pub columns: Vec<ColumnSpec>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            input_file: None,
            output_file: None,
            separator: DEFAULT_SEPARATOR.to_string(),
            columns: Vec::new(),
        }
    }
}

impl SortConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> SortResult<()> {
        // Lines never contain a newline, so such a separator could not split anything.
        if self.separator.is_empty() || self.separator.contains('\n') {
            return Err(SortError::invalid_separator(&self.separator));
        }
        Ok(())
    }

    /// Kind of every explicitly typed column; a later spec for the same column wins
    pub fn column_types(&self) -> ColumnTypeMap {
        self.columns
            .iter()
            .map(|spec| (spec.index(), spec.kind))
            .collect()
    }

    /// Column indices in the order they were given, duplicates included
    pub fn sort_priority(&self) -> SortPriority {
        self.columns.iter().map(ColumnSpec::index).collect()
    }

    pub fn reading_from_stdin(&self) -> bool {
        is_standard_stream(self.input_file.as_deref())
    }

    pub fn writing_to_stdout(&self) -> bool {
        is_standard_stream(self.output_file.as_deref())
    }
}

/// Builder pattern for creating configurations
pub struct SortConfigBuilder {
    config: SortConfig,
}

impl SortConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SortConfig::default(),
        }
    }

    pub fn input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_file = Some(path.into());
        self
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_file = Some(path.into());
        self
    }

    pub fn separator(mut self, separator: &str) -> Self {
        self.config.separator = separator.to_string();
        self
    }

    pub fn column(mut self, spec: ColumnSpec) -> Self {
        self.config.columns.push(spec);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> SortResult<SortConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SortConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
