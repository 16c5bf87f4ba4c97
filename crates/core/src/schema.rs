//! Column definitions.
//!
//! A `Schema` is an ordered list of columns with unique keys. It is replaced
//! wholesale, never patched in place, so the only way to build one is through
//! `Schema::new`, which enforces key uniqueness.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::value::{CellValue, ColumnType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate column key '{0}'")]
    DuplicateKey(String),
    #[error("column {0} has an empty key")]
    EmptyKey(usize),
}

/// Signature of a computed column: receives a lookup of the row's effective
/// values by column key.
pub type FormulaFn = dyn Fn(&dyn Fn(&str) -> CellValue) -> CellValue;

/// Caller-supplied computed-column function. The grid only invokes it.
#[derive(Clone)]
pub struct Formula(Rc<FormulaFn>);

impl Formula {
    pub fn new(f: impl Fn(&dyn Fn(&str) -> CellValue) -> CellValue + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn evaluate(&self, lookup: &dyn Fn(&str) -> CellValue) -> CellValue {
        (self.0)(lookup)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Formula(..)")
    }
}

/// One entry of a Select/Tags column's option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self { value: value.into(), label: label.into() }
    }
}

/// Per-column constraint beyond the type check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum ValidationRule {
    /// Inclusive numeric bounds.
    Range { min: Option<f64>, max: Option<f64> },
    /// Inclusive character-count bounds for text.
    Length { min: Option<usize>, max: Option<usize> },
    /// Text must match this regular expression.
    Pattern { pattern: String },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Request a multi-line editor.
    #[serde(default)]
    pub wrap: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
    #[serde(skip)]
    pub formula: Option<Formula>,
}

impl Column {
    pub fn new(key: impl Into<String>, column_type: ColumnType) -> Self {
        let key = key.into();
        Self {
            title: key.clone(),
            key,
            column_type,
            readonly: false,
            unique: false,
            nullable: true,
            wrap: false,
            options: Vec::new(),
            validation: Vec::new(),
            formula: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn wrapping(mut self) -> Self {
        self.wrap = true;
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    /// Computed columns are always readonly.
    pub fn with_formula(mut self, formula: Formula) -> Self {
        self.formula = Some(formula);
        self.readonly = true;
        self
    }

    /// Label for an option value, if the column defines one.
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// Ordered columns with unique keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Column>", into = "Vec<Column>")]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Result<Self, SchemaError> {
        for (i, col) in columns.iter().enumerate() {
            if col.key.is_empty() {
                return Err(SchemaError::EmptyKey(i));
            }
            if columns[..i].iter().any(|c| c.key == col.key) {
                return Err(SchemaError::DuplicateKey(col.key.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }
}

impl TryFrom<Vec<Column>> for Schema {
    type Error = SchemaError;

    fn try_from(columns: Vec<Column>) -> Result<Self, Self::Error> {
        Schema::new(columns)
    }
}

impl From<Schema> for Vec<Column> {
    fn from(schema: Schema) -> Self {
        schema.columns
    }
}
