//! A fill batch: named, equal-length input columns.

use std::collections::BTreeMap;
use std::sync::Arc;

use hb_expr::Column;

use crate::error::{Error, Result};

/// Named input columns for one fill call.
///
/// All columns have the same length, except that a length-1 column
/// broadcasts to the batch length.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    columns: BTreeMap<String, Arc<Column>>,
}

impl Batch {
    /// Empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from `(name, column)` pairs.
    pub fn from_columns<I, K, C>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<Column>,
    {
        let mut batch = Batch::new();
        for (name, column) in columns {
            batch.insert(name, column)?;
        }
        Ok(batch)
    }

    /// Build a batch from a JSON object of arrays, e.g. `{"x": [1, 2], "c": ["a", "b"]}`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let columns: BTreeMap<String, Column> = serde_json::from_value(value.clone())?;
        Batch::from_columns(columns)
    }

    /// Add (or replace) a column.
    pub fn insert(&mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<()> {
        let name = name.into();
        let column = column.into();
        let found = column.len();
        if found != 1 {
            let expected = self
                .columns
                .iter()
                .filter(|(k, _)| **k != name)
                .map(|(_, c)| c.len())
                .find(|&l| l != 1);
            if let Some(expected) = expected
                && expected != found
            {
                return Err(Error::LengthMismatch { column: name, expected, found });
            }
        }
        self.columns.insert(name, Arc::new(column));
        Ok(())
    }

    /// Builder-style [`Batch::insert`].
    pub fn with(mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<Self> {
        self.insert(name, column)?;
        Ok(self)
    }

    /// Column by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Column>> {
        self.columns.get(name)
    }

    /// Column names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        match self.columns.values().map(|c| c.len()).find(|&l| l != 1) {
            Some(n) => n,
            None if self.columns.is_empty() => 0,
            None => 1,
        }
    }

    /// Whether the batch has no events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
