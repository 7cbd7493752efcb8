use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("table name cannot be empty")]
    EmptyTableName,
}

/// A referenced database table name.
///
/// Names are kept exactly as the server reports them; lookups against the
/// [`SqlContext`] are case-sensitive.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName(String);

impl TableName {
    /// # Errors
    ///
    /// Returns `SchemaError::EmptyTableName` if the name is blank.
    pub fn new(name: impl Into<String>) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyTableName);
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableName({})", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One table with its ordered column names, as returned by the metadata
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: TableName,
    columns: Vec<String>,
}

impl TableSchema {
    #[must_use]
    pub fn new(name: TableName, columns: Vec<String>) -> Self {
        Self { name, columns }
    }

    #[must_use]
    pub fn name(&self) -> &TableName {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// The table-to-columns mapping visible to the currently selected task.
///
/// Tables keep the order of the effective table set they were resolved from,
/// which in turn fixes suggestion order. A context is replaced wholesale on
/// every selection change, never merged; `SqlContext::default()` is the empty
/// pre-load state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlContext {
    tables: Vec<TableSchema>,
}

impl SqlContext {
    #[must_use]
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Self { tables }
    }

    #[must_use]
    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    /// Case-sensitive lookup of a single table.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|table| table.name().as_str() == name)
    }

    /// All column names across all tables, in table order, duplicates kept.
    pub fn all_columns(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .flat_map(|table| table.columns().iter().map(String::as_str))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
