//! Record capability types.
//!
//! Host record types opt into ordering by implementing [`Positioned`].
//! The maintainer never inspects a record beyond this surface: it reads the
//! key and scope to address the row, and reads/writes the position value.

use std::fmt;

use uuid::Uuid;

/// Identity of a row within its table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Int(id) => write!(f, "{}", id),
            RecordKey::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(id: i64) -> Self {
        RecordKey::Int(id)
    }
}

impl From<i32> for RecordKey {
    fn from(id: i32) -> Self {
        RecordKey::Int(i64::from(id))
    }
}

impl From<&str> for RecordKey {
    fn from(id: &str) -> Self {
        RecordKey::Text(id.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(id: String) -> Self {
        RecordKey::Text(id)
    }
}

/// UUID keys are stored in their hyphenated text form.
impl From<Uuid> for RecordKey {
    fn from(id: Uuid) -> Self {
        RecordKey::Text(id.to_string())
    }
}

/// Value of one scope column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeValue {
    Int(i64),
    Text(String),
    /// Matches rows where the column `IS NULL`.
    Null,
}

impl From<i64> for ScopeValue {
    fn from(value: i64) -> Self {
        ScopeValue::Int(value)
    }
}

impl From<i32> for ScopeValue {
    fn from(value: i32) -> Self {
        ScopeValue::Int(i64::from(value))
    }
}

impl From<&str> for ScopeValue {
    fn from(value: &str) -> Self {
        ScopeValue::Text(value.to_string())
    }
}

impl From<String> for ScopeValue {
    fn from(value: String) -> Self {
        ScopeValue::Text(value)
    }
}

impl From<Uuid> for ScopeValue {
    fn from(value: Uuid) -> Self {
        ScopeValue::Text(value.to_string())
    }
}

impl<T: Into<ScopeValue>> From<Option<T>> for ScopeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ScopeValue::Null)
    }
}

/// The partition of a table that forms one ordered sequence.
///
/// A row belongs to the scope when every `(column, value)` pair matches.
/// The empty scope ([`Scope::all`]) treats the whole table as one sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    columns: Vec<(String, ScopeValue)>,
}

impl Scope {
    /// Scope covering every row of the table.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column constraint. A repeated column replaces the earlier value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<ScopeValue>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some(existing) => existing.1 = value,
            None => self.columns.push((column, value)),
        }
        self
    }

    pub fn columns(&self) -> &[(String, ScopeValue)] {
        &self.columns
    }

    pub fn is_all(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether a row carrying `row` scope values falls inside this scope.
    ///
    /// `row` must list every column this scope constrains; missing columns
    /// are treated as `NULL`.
    pub fn contains(&self, row: &Scope) -> bool {
        self.columns.iter().all(|(column, value)| {
            let actual = row
                .columns
                .iter()
                .find(|(c, _)| c == column)
                .map(|(_, v)| v)
                .unwrap_or(&ScopeValue::Null);
            actual == value
        })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return f.write_str("*");
        }
        let parts: Vec<String> = self
            .columns
            .iter()
            .map(|(column, value)| match value {
                ScopeValue::Int(v) => format!("{}={}", column, v),
                ScopeValue::Text(v) => format!("{}={:?}", column, v),
                ScopeValue::Null => format!("{} IS NULL", column),
            })
            .collect();
        f.write_str(&parts.join(","))
    }
}

/// Capability surface a host record provides to take part in ordering.
pub trait Positioned {
    /// Primary key of the backing row.
    fn key(&self) -> RecordKey;

    /// Current position, `None` before one has been assigned.
    fn position(&self) -> Option<i64>;

    fn set_position(&mut self, position: i64);

    /// Sequence the record belongs to.
    fn scope(&self) -> Scope {
        Scope::all()
    }
}

/// One row of a sequence as returned by ordering queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: RecordKey,
    pub position: i64,
}

impl Entry {
    pub fn new(key: impl Into<RecordKey>, position: i64) -> Self {
        Self {
            key: key.into(),
            position,
        }
    }
}
