use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column type. Decides the editor control, paste coercion, fill behavior
/// and type validation for every cell in the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Boolean,
    Date,
    Time,
    #[serde(rename = "datetime")]
    DateTime,
    /// Closed option list, one value per cell.
    Select,
    /// Closed option list, many values per cell.
    Tags,
}

impl ColumnType {
    /// Types whose values can be extrapolated by the sequence engine.
    pub fn is_sequence_eligible(self) -> bool {
        matches!(
            self,
            ColumnType::Text
                | ColumnType::Number
                | ColumnType::Date
                | ColumnType::Time
                | ColumnType::DateTime
        )
    }

    /// Types restricted to a fixed set of options.
    pub fn is_closed_option(self) -> bool {
        matches!(self, ColumnType::Select | ColumnType::Tags)
    }

    /// Controls for these types commit on their native change event
    /// (checkbox, number, date, time, select) instead of waiting for Enter/Tab.
    pub fn commits_instantly(self) -> bool {
        matches!(
            self,
            ColumnType::Boolean
                | ColumnType::Number
                | ColumnType::Date
                | ColumnType::Time
                | ColumnType::DateTime
                | ColumnType::Select
        )
    }

    /// Value written when a cell of this type is cleared.
    pub fn cleared_value(self) -> CellValue {
        match self {
            ColumnType::Boolean => CellValue::Bool(false),
            _ => CellValue::Empty,
        }
    }

    /// Whether `value` has the shape this column expects. Empty always fits;
    /// nullability is checked separately.
    pub fn accepts(self, value: &CellValue) -> bool {
        match (self, value) {
            (_, CellValue::Empty) => true,
            (ColumnType::Text, CellValue::Text(_)) => true,
            (ColumnType::Number, CellValue::Number(_)) => true,
            (ColumnType::Boolean, CellValue::Bool(_)) => true,
            (ColumnType::Date | ColumnType::Time | ColumnType::DateTime, CellValue::Date(_)) => true,
            (ColumnType::Select, CellValue::Choice { .. } | CellValue::Text(_)) => true,
            (ColumnType::Tags, CellValue::Tags(_)) => true,
            _ => false,
        }
    }
}

/// A single cell value.
///
/// Date, time and datetime columns all store `Date`; a time-of-day is a
/// timestamp on the epoch day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    Choice {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Tags(Vec<String>),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn choice(value: impl Into<String>) -> Self {
        CellValue::Choice { value: value.into(), label: None }
    }

    /// Equality used by the pending overlay: dates compare by epoch millis,
    /// everything else by value.
    pub fn same_value(&self, other: &CellValue) -> bool {
        match (self, other) {
            (CellValue::Date(a), CellValue::Date(b)) => {
                a.timestamp_millis() == b.timestamp_millis()
            }
            _ => self == other,
        }
    }

    /// Empty, empty text, or no tags.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Tags(t) => t.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Plain text form used to seed a text editor control.
    pub fn to_edit_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.to_rfc3339(),
            CellValue::Choice { value, .. } => value.clone(),
            CellValue::Tags(tags) => tags.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_same_value_dates_by_millis() {
        let a = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let b = a + chrono::Duration::nanoseconds(400_000);
        assert_ne!(CellValue::Date(a), CellValue::Date(b));
        assert!(CellValue::Date(a).same_value(&CellValue::Date(b)));
    }

    #[test]
    fn test_same_value_scalars() {
        assert!(CellValue::Number(1.0).same_value(&CellValue::Number(1.0)));
        assert!(!CellValue::Number(1.0).same_value(&CellValue::text("1")));
        assert!(!CellValue::Empty.same_value(&CellValue::text("")));
    }

    #[test]
    fn test_column_type_classes() {
        assert!(ColumnType::Number.is_sequence_eligible());
        assert!(!ColumnType::Boolean.is_sequence_eligible());
        assert!(!ColumnType::Select.is_sequence_eligible());
        assert!(ColumnType::Tags.is_closed_option());
        assert!(ColumnType::Boolean.commits_instantly());
        assert!(!ColumnType::Text.commits_instantly());
        assert_eq!(ColumnType::Boolean.cleared_value(), CellValue::Bool(false));
        assert_eq!(ColumnType::Text.cleared_value(), CellValue::Empty);
    }

    #[test]
    fn test_accepts() {
        assert!(ColumnType::Number.accepts(&CellValue::Number(2.0)));
        assert!(!ColumnType::Number.accepts(&CellValue::text("x")));
        assert!(ColumnType::Time.accepts(&CellValue::Date(Utc::now())));
        assert!(ColumnType::Boolean.accepts(&CellValue::Empty));
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_string(&CellValue::Number(5.0)).unwrap();
        assert_eq!(json, r#"{"type":"number","value":5.0}"#);
        let back: CellValue = serde_json::from_str(r#"{"type":"empty"}"#).unwrap();
        assert_eq!(back, CellValue::Empty);
    }
}
