//! Cell validation.
//!
//! Errors are derived state: the model recomputes them whenever a cell's
//! effective (pending-or-committed) value changes. A cell carries at most
//! one error. Checks run in a fixed order and the first failure wins:
//!
//! 1. `Required`: blank value in a non-nullable column
//! 2. `TypeMismatch`: value shape does not fit the column type
//! 3. `NotAnOption`: Select/Tags value outside the option list
//! 4. column rules in declaration order (`OutOfRange`, `Length`, `Pattern`)
//! 5. `Duplicate`: repeated non-blank value in a `unique` column
//!
//! An invalid regex in a `Pattern` rule is skipped rather than failing
//! every cell.

use cellgrid_core::{CellValue, Column, ColumnType, RowId, ValidationRule};
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    Required,
    TypeMismatch,
    OutOfRange,
    Length,
    Pattern,
    NotAnOption,
    Duplicate,
}

/// Failure for one cell, before positions are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct CellIssue {
    pub code: ErrorCode,
    pub message: String,
}

impl CellIssue {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// A validation error as exposed to callers, sorted by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub row_id: RowId,
    pub col_key: String,
    pub row_index: usize,
    pub col_index: usize,
    pub code: ErrorCode,
    pub message: String,
}

/// Compiled `Pattern` rules, keyed by source text. `None` marks an invalid
/// pattern that has already been reported.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: FxHashMap<String, Option<Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&mut self, pattern: &str) -> Option<&Regex> {
        self.compiled
            .entry(pattern.to_string())
            .or_insert_with(|| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("ignoring invalid validation pattern {pattern:?}: {e}");
                    None
                }
            })
            .as_ref()
    }
}

/// Check one value against its column, excluding the uniqueness check.
pub fn check_value(column: &Column, value: &CellValue, patterns: &mut PatternCache) -> Option<CellIssue> {
    if value.is_blank() {
        if !column.nullable {
            return Some(CellIssue::new(ErrorCode::Required, "Value is required"));
        }
        return None;
    }

    if !column.column_type.accepts(value) {
        return Some(CellIssue::new(
            ErrorCode::TypeMismatch,
            format!("Expected a {} value", type_name(column.column_type)),
        ));
    }

    if let Some(issue) = check_options(column, value) {
        return Some(issue);
    }

    for rule in &column.validation {
        if let Some(issue) = check_rule(rule, value, patterns) {
            return Some(issue);
        }
    }
    None
}

fn check_options(column: &Column, value: &CellValue) -> Option<CellIssue> {
    if !column.column_type.is_closed_option() || column.options.is_empty() {
        return None;
    }
    let missing = match value {
        CellValue::Choice { value, .. } | CellValue::Text(value) => {
            (!column.has_option(value)).then(|| value.clone())
        }
        CellValue::Tags(tags) => tags.iter().find(|t| !column.has_option(t)).cloned(),
        _ => None,
    };
    missing.map(|v| CellIssue::new(ErrorCode::NotAnOption, format!("'{v}' is not an allowed option")))
}

fn check_rule(rule: &ValidationRule, value: &CellValue, patterns: &mut PatternCache) -> Option<CellIssue> {
    match (rule, value) {
        (ValidationRule::Range { min, max }, CellValue::Number(n)) => {
            let below = min.is_some_and(|m| *n < m);
            let above = max.is_some_and(|m| *n > m);
            (below || above).then(|| CellIssue::new(ErrorCode::OutOfRange, range_message(*min, *max)))
        }
        (ValidationRule::Length { min, max }, CellValue::Text(s)) => {
            let len = s.chars().count();
            let short = min.is_some_and(|m| len < m);
            let long = max.is_some_and(|m| len > m);
            (short || long).then(|| CellIssue::new(ErrorCode::Length, length_message(*min, *max)))
        }
        (ValidationRule::Pattern { pattern }, CellValue::Text(s)) => {
            let re = patterns.get(pattern)?;
            (!re.is_match(s)).then(|| CellIssue::new(ErrorCode::Pattern, format!("Must match {pattern}")))
        }
        _ => None,
    }
}

fn range_message(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(a), Some(b)) => format!("Must be between {a} and {b}"),
        (Some(a), None) => format!("Must be at least {a}"),
        (None, Some(b)) => format!("Must be at most {b}"),
        (None, None) => "Out of range".to_string(),
    }
}

fn length_message(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(a), Some(b)) => format!("Length must be between {a} and {b}"),
        (Some(a), None) => format!("Length must be at least {a}"),
        (None, Some(b)) => format!("Length must be at most {b}"),
        (None, None) => "Invalid length".to_string(),
    }
}

fn type_name(t: ColumnType) -> &'static str {
    match t {
        ColumnType::Text => "text",
        ColumnType::Number => "number",
        ColumnType::Boolean => "boolean",
        ColumnType::Date => "date",
        ColumnType::Time => "time",
        ColumnType::DateTime => "datetime",
        ColumnType::Select => "select",
        ColumnType::Tags => "tags",
    }
}

/// Key used to detect duplicates in a `unique` column. Dates compare by
/// epoch millis, matching `CellValue::same_value`. Blank values never
/// collide.
pub fn uniqueness_key(value: &CellValue) -> Option<String> {
    if value.is_blank() {
        return None;
    }
    Some(match value {
        CellValue::Date(d) => format!("d:{}", d.timestamp_millis()),
        CellValue::Number(n) => format!("n:{}", if *n == 0.0 { 0.0 } else { *n }),
        CellValue::Choice { value, .. } => format!("c:{value}"),
        other => format!("{other:?}"),
    })
}

pub fn duplicate_issue() -> CellIssue {
    CellIssue::new(ErrorCode::Duplicate, "Value must be unique")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgrid_core::SelectOption;

    fn check(column: &Column, value: CellValue) -> Option<ErrorCode> {
        check_value(column, &value, &mut PatternCache::new()).map(|i| i.code)
    }

    #[test]
    fn test_required() {
        let col = Column::new("a", ColumnType::Text).required();
        assert_eq!(check(&col, CellValue::Empty), Some(ErrorCode::Required));
        assert_eq!(check(&col, CellValue::text("")), Some(ErrorCode::Required));
        assert_eq!(check(&col, CellValue::text("x")), None);

        let nullable = Column::new("b", ColumnType::Number);
        assert_eq!(check(&nullable, CellValue::Empty), None);
    }

    #[test]
    fn test_boolean_false_is_not_blank() {
        let col = Column::new("done", ColumnType::Boolean).required();
        assert_eq!(check(&col, CellValue::Bool(false)), None);
    }

    #[test]
    fn test_type_mismatch() {
        let col = Column::new("n", ColumnType::Number);
        assert_eq!(check(&col, CellValue::text("abc")), Some(ErrorCode::TypeMismatch));
    }

    #[test]
    fn test_not_an_option() {
        let col = Column::new("s", ColumnType::Select)
            .with_options(vec![SelectOption::new("a", "Alpha"), SelectOption::new("b", "Beta")]);
        assert_eq!(check(&col, CellValue::choice("a")), None);
        assert_eq!(check(&col, CellValue::choice("z")), Some(ErrorCode::NotAnOption));

        let tags = Column::new("t", ColumnType::Tags).with_options(vec![SelectOption::new("x", "X")]);
        assert_eq!(check(&tags, CellValue::Tags(vec!["x".into(), "y".into()])), Some(ErrorCode::NotAnOption));
    }

    #[test]
    fn test_rules() {
        let col = Column::new("n", ColumnType::Number)
            .with_rule(ValidationRule::Range { min: Some(0.0), max: Some(10.0) });
        assert_eq!(check(&col, CellValue::Number(11.0)), Some(ErrorCode::OutOfRange));
        assert_eq!(check(&col, CellValue::Number(10.0)), None);

        let text = Column::new("t", ColumnType::Text)
            .with_rule(ValidationRule::Length { min: None, max: Some(3) })
            .with_rule(ValidationRule::Pattern { pattern: "^[a-z]+$".into() });
        assert_eq!(check(&text, CellValue::text("abcd")), Some(ErrorCode::Length));
        assert_eq!(check(&text, CellValue::text("A1")), Some(ErrorCode::Pattern));
        assert_eq!(check(&text, CellValue::text("ab")), None);
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let col = Column::new("t", ColumnType::Text)
            .with_rule(ValidationRule::Pattern { pattern: "(".into() });
        assert_eq!(check(&col, CellValue::text("anything")), None);
    }

    #[test]
    fn test_uniqueness_key() {
        assert_eq!(uniqueness_key(&CellValue::Empty), None);
        assert_eq!(uniqueness_key(&CellValue::Number(0.0)), uniqueness_key(&CellValue::Number(-0.0)));
        assert_ne!(uniqueness_key(&CellValue::Number(1.0)), uniqueness_key(&CellValue::text("1")));
    }
}
