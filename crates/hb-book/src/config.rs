//! Construction-time configuration shared by histograms and books.

use serde::{Deserialize, Serialize};

/// Numeric precision of the accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountType {
    /// Double precision (default).
    #[default]
    F64,
    /// Single precision: every stored sum is rounded to `f32`.
    F32,
}

impl CountType {
    /// Round an accumulated value to this precision.
    #[inline]
    pub fn round(self, x: f64) -> f64 {
        match self {
            CountType::F64 => x,
            CountType::F32 => x as f32 as f64,
        }
    }
}

/// Histogram configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistConfig {
    /// Accumulator precision.
    #[serde(default)]
    pub count_type: CountType,
    /// Input columns the histogram may read. `None` allows any column; otherwise
    /// compiling an expression that reads anything else fails.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

impl HistConfig {
    /// Default configuration: `f64` accumulators, any input column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the accumulator precision.
    pub fn count_type(mut self, count_type: CountType) -> Self {
        self.count_type = count_type;
        self
    }

    /// Restrict the readable input columns.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `column` may be read.
    pub fn accepts(&self, column: &str) -> bool {
        match &self.fields {
            None => true,
            Some(fields) => fields.iter().any(|f| f == column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_rounding() {
        let x = 0.1f64 + 0.2;
        assert_eq!(CountType::F64.round(x), x);
        assert_eq!(CountType::F32.round(x), (x as f32) as f64);
        assert_ne!(CountType::F32.round(x), x);
        assert_eq!(CountType::F32.round(3.0), 3.0);
    }

    #[test]
    fn field_whitelist() {
        let open = HistConfig::new();
        assert!(open.accepts("anything"));
        let closed = HistConfig::new().fields(["x", "y"]);
        assert!(closed.accepts("x"));
        assert!(!closed.accepts("z"));
    }

    #[test]
    fn config_from_json_defaults() {
        let c: HistConfig = serde_json::from_str(r#"{"count_type": "f32"}"#).unwrap();
        assert_eq!(c.count_type, CountType::F32);
        assert!(c.fields.is_none());
    }
}
