//! Typed cell values and their comparison rules
//!
//! Every column of a table is read as one of four value kinds. Each kind knows how to
//! parse itself from a field, how to render back to the exact text it came from, and how
//! to compare against another value of the same kind. Comparing values of different kinds
//! is not an error: it yields [`Comparison::Incomparable`].

use itertools::{EitherOrBoth, Itertools};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of column value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    /// Signed 32-bit integer
    Integer,
    /// Plain string, byte-lexicographic order
    Text,
    /// Unbounded signed decimal kept as digit strings
    Decimal,
    /// String ordered by its ranked letter frequencies
    FrequencyText,
}

impl ValueKind {
    /// Single-letter code used in column specifications
    pub fn letter(self) -> char {
        match self {
            ValueKind::Integer => 'N',
            ValueKind::Text => 'S',
            ValueKind::Decimal => 'U',
            ValueKind::FrequencyText => 'F',
        }
    }

    /// Look up a kind by its single-letter code
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'N' => Some(ValueKind::Integer),
            'S' => Some(ValueKind::Text),
            'U' => Some(ValueKind::Decimal),
            'F' => Some(ValueKind::FrequencyText),
            _ => None,
        }
    }
}

impl FromStr for ValueKind {
    type Err = crate::error::SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(letter), None) = (chars.next(), chars.next()) {
            if let Some(kind) = Self::from_letter(letter) {
                return Ok(kind);
            }
        }
        match s.to_lowercase().as_str() {
            "integer" | "int" => Ok(ValueKind::Integer),
            "text" | "string" => Ok(ValueKind::Text),
            "decimal" | "unlimited" => Ok(ValueKind::Decimal),
            "frequency" | "freq" => Ok(ValueKind::FrequencyText),
            _ => Err(crate::error::SortError::invalid_kind_spec(s)),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Integer => "integer",
            ValueKind::Text => "text",
            ValueKind::Decimal => "decimal",
            ValueKind::FrequencyText => "frequency",
        };
        write!(f, "{name}")
    }
}

/// Outcome of comparing two typed values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    Equal,
    Greater,
    /// The values have no defined order (different kinds, or exhausted frequency rankings)
    Incomparable,
}

impl Comparison {
    /// Swap `Less` and `Greater`; `Equal` and `Incomparable` are unchanged
    pub fn reverse(self) -> Self {
        match self {
            Comparison::Less => Comparison::Greater,
            Comparison::Greater => Comparison::Less,
            other => other,
        }
    }
}

impl From<Ordering> for Comparison {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Comparison::Less,
            Ordering::Equal => Comparison::Equal,
            Ordering::Greater => Comparison::Greater,
        }
    }
}

/// Why a field could not be read as its column's kind
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid format")]
    InvalidFormat,
    #[error("value out of range")]
    OutOfRange,
}

/// Arbitrary-precision signed decimal stored as the digit strings it was written with.
///
/// Nothing is normalized: `007.100` keeps its zeros so it renders exactly as read.
/// Magnitude comparison relies on that, treating a longer integer part as larger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    negative: bool,
    integer: String,
    fraction: String,
    /// `5.` remembers its point so rendering stays verbatim
    trailing_point: bool,
}

impl Decimal {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        if text.is_empty() || text.matches('.').count() > 1 {
            return Err(ParseError::InvalidFormat);
        }

        // A lone "-" is kept as its own digit string rather than a sign.
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) if !rest.is_empty() => (true, rest),
            _ => (false, text),
        };

        let (integer, fraction, trailing_point) = match body.split_once('.') {
            Some((integer, fraction)) => (integer, fraction, fraction.is_empty()),
            None => (body, "", false),
        };

        Ok(Self {
            negative,
            integer: integer.to_string(),
            fraction: fraction.to_string(),
            trailing_point,
        })
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn integer_digits(&self) -> &str {
        &self.integer
    }

    pub fn fraction_digits(&self) -> &str {
        &self.fraction
    }

    pub fn compare(&self, other: &Decimal) -> Ordering {
        match (self.negative, other.negative) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (negative, _) => {
                let magnitude = self
                    .integer
                    .len()
                    .cmp(&other.integer.len())
                    .then_with(|| self.integer.as_bytes().cmp(other.integer.as_bytes()))
                    // Slice order is digit-by-digit, then shorter-prefix-first.
                    .then_with(|| self.fraction.as_bytes().cmp(other.fraction.as_bytes()));
                if negative {
                    magnitude.reverse()
                } else {
                    magnitude
                }
            }
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&self.integer)?;
        if !self.fraction.is_empty() {
            write!(f, ".{}", self.fraction)?;
        } else if self.trailing_point {
            f.write_str(".")?;
        }
        Ok(())
    }
}

/// String ranked by how often each character occurs in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyText {
    text: String,
    /// Distinct characters by count descending, then character ascending
    ranking: Vec<(char, usize)>,
}

impl FrequencyText {
    pub fn new(text: &str) -> Self {
        let ranking = text
            .chars()
            .counts()
            .into_iter()
            .sorted_by(|(a_char, a_count), (b_char, b_count)| {
                b_count.cmp(a_count).then(a_char.cmp(b_char))
            })
            .collect();

        Self {
            text: text.to_string(),
            ranking,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn ranking(&self) -> &[(char, usize)] {
        &self.ranking
    }

    /// Walk both rankings in rank order. A higher count sorts first, equal counts fall back
    /// to the character. Running out of one ranking before the other leaves the pair
    /// unordered.
    pub fn compare(&self, other: &FrequencyText) -> Comparison {
        for pair in self.ranking.iter().zip_longest(other.ranking.iter()) {
            match pair {
                EitherOrBoth::Both((a_char, a_count), (b_char, b_count)) => {
                    let ordering = b_count.cmp(a_count).then(a_char.cmp(b_char));
                    if ordering != Ordering::Equal {
                        return ordering.into();
                    }
                }
                EitherOrBoth::Left(_) | EitherOrBoth::Right(_) => {
                    return Comparison::Incomparable;
                }
            }
        }
        Comparison::Equal
    }
}

/// A single parsed cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Integer(i32),
    Text(String),
    Decimal(Decimal),
    FrequencyText(FrequencyText),
}

impl TypedValue {
    /// Parse a raw field as the given kind
    pub fn parse(kind: ValueKind, text: &str) -> Result<Self, ParseError> {
        match kind {
            ValueKind::Integer => text
                .parse::<i32>()
                .map(TypedValue::Integer)
                .map_err(|err| match err.kind() {
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                        ParseError::OutOfRange
                    }
                    _ => ParseError::InvalidFormat,
                }),
            ValueKind::Text => Ok(TypedValue::Text(text.to_string())),
            ValueKind::Decimal => Decimal::parse(text).map(TypedValue::Decimal),
            ValueKind::FrequencyText => Ok(TypedValue::FrequencyText(FrequencyText::new(text))),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Integer(_) => ValueKind::Integer,
            TypedValue::Text(_) => ValueKind::Text,
            TypedValue::Decimal(_) => ValueKind::Decimal,
            TypedValue::FrequencyText(_) => ValueKind::FrequencyText,
        }
    }

    /// Text form written back to the output
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            TypedValue::Integer(value) => Cow::Owned(value.to_string()),
            TypedValue::Text(text) => Cow::Borrowed(text),
            TypedValue::Decimal(decimal) => Cow::Owned(decimal.to_string()),
            TypedValue::FrequencyText(freq) => Cow::Borrowed(freq.as_str()),
        }
    }

    pub fn compare(&self, other: &TypedValue) -> Comparison {
        match (self, other) {
            (TypedValue::Integer(a), TypedValue::Integer(b)) => a.cmp(b).into(),
            (TypedValue::Text(a), TypedValue::Text(b)) => a.cmp(b).into(),
            (TypedValue::Decimal(a), TypedValue::Decimal(b)) => a.compare(b).into(),
            (TypedValue::FrequencyText(a), TypedValue::FrequencyText(b)) => a.compare(b),
            _ => Comparison::Incomparable,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
