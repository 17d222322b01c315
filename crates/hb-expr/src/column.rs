//! Columnar values: the inputs and outputs of expression evaluation.

use serde::{Deserialize, Serialize};

/// One column of per-event values.
///
/// A column of length 1 broadcasts against columns of any length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    /// Numeric values.
    Num(Vec<f64>),
    /// Categorical (string) values.
    Cat(Vec<String>),
}

impl Column {
    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Column::Num(v) => v.len(),
            Column::Cat(v) => v.len(),
        }
    }

    /// Whether the column has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric values, if this is a numeric column.
    pub fn as_num(&self) -> Option<&[f64]> {
        match self {
            Column::Num(v) => Some(v),
            Column::Cat(_) => None,
        }
    }

    /// Categorical values, if this is a categorical column.
    pub fn as_cat(&self) -> Option<&[String]> {
        match self {
            Column::Cat(v) => Some(v),
            Column::Num(_) => None,
        }
    }

    /// Short kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Num(_) => "numeric",
            Column::Cat(_) => "categorical",
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Self {
        Column::Num(v)
    }
}

impl From<&[f64]> for Column {
    fn from(v: &[f64]) -> Self {
        Column::Num(v.to_vec())
    }
}

impl From<f64> for Column {
    fn from(x: f64) -> Self {
        Column::Num(vec![x])
    }
}

impl From<Vec<String>> for Column {
    fn from(v: Vec<String>) -> Self {
        Column::Cat(v)
    }
}

impl From<Vec<&str>> for Column {
    fn from(v: Vec<&str>) -> Self {
        Column::Cat(v.into_iter().map(str::to_owned).collect())
    }
}

/// Length of the result of combining two operands, honoring length-1 broadcast.
pub fn broadcast_len(a: usize, b: usize) -> Option<usize> {
    match (a, b) {
        _ if a == b => Some(a),
        (1, n) | (n, 1) => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_rules() {
        assert_eq!(broadcast_len(4, 4), Some(4));
        assert_eq!(broadcast_len(1, 7), Some(7));
        assert_eq!(broadcast_len(7, 1), Some(7));
        assert_eq!(broadcast_len(0, 1), Some(0));
        assert_eq!(broadcast_len(2, 3), None);
    }

    #[test]
    fn untagged_json_columns() {
        let num: Column = serde_json::from_str("[1.0, 2.5]").unwrap();
        assert_eq!(num, Column::Num(vec![1.0, 2.5]));
        let cat: Column = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(cat.as_cat().unwrap(), &["a".to_string(), "b".to_string()]);
    }
}
