//! Column definitions

use super::types::{ColumnSize, DataType};
use crate::{Error, Result, Value};
use serde::{Deserialize, Serialize};

/// Default value of a column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    /// The `CURRENT_TIMESTAMP` expression, emitted unquoted
    CurrentTimestamp,
    Value(Value),
}

impl ColumnDefault {
    pub const CURRENT_TIMESTAMP: &'static str = "CURRENT_TIMESTAMP";

    /// Interpret a value as a default; `None` for NULL
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) if s.eq_ignore_ascii_case(Self::CURRENT_TIMESTAMP) => {
                Some(ColumnDefault::CurrentTimestamp)
            }
            other => Some(ColumnDefault::Value(other)),
        }
    }
}

/// One column of a table
///
/// Built with chained setters. A column with a default is never nullable:
/// setting a default clears the nullable flag and later `nullable(true)` calls
/// are ignored while the default is present.
///
/// ```
/// use stratum_core::{Column, DataType};
///
/// let title = Column::new("title", DataType::String).length(120).default_value("untitled");
/// assert!(!title.is_nullable());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data_type: DataType,
    size: Option<ColumnSize>,
    nullable: bool,
    default: Option<ColumnDefault>,
    auto_increment: bool,
    primary: bool,
    foreign: bool,
    after: Option<String>,
    on_update: Option<String>,
    signed: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            size: None,
            nullable: true,
            default: None,
            auto_increment: false,
            primary: false,
            foreign: false,
            after: None,
            on_update: None,
            signed: false,
        }
    }

    /// Build a column from an option record, validating the option combination
    pub fn with_options(
        name: impl Into<String>,
        data_type: DataType,
        options: &ColumnOptions,
    ) -> Result<Self> {
        let name = name.into();
        let mut column = Column::new(name.clone(), data_type);

        column.size = match (options.size, options.precision, options.scale) {
            (None, None, None) => None,
            (Some(length), None, None) => Some(ColumnSize::Length(length)),
            (None, Some(precision), scale) => Some(ColumnSize::Precision(precision, scale.unwrap_or(0))),
            (None, None, Some(_)) => {
                return Err(Error::configuration(format!(
                    "column '{}' sets a scale without a precision",
                    name
                )))
            }
            (Some(_), _, _) => {
                return Err(Error::configuration(format!(
                    "column '{}' sets both a size and a precision",
                    name
                )))
            }
        };

        if let Some(nullable) = options.nullable {
            column = column.nullable(nullable);
        }
        if let Some(default) = &options.default {
            column = column.default_value(Value::from_json(default.clone()));
        }
        column.auto_increment = options.auto_increment;
        column.foreign = options.foreign || options.references.is_some();
        column.signed = options.signed;
        column.after = options.after.clone();
        column.on_update = options.on_update.clone();
        if options.primary {
            column = column.primary();
        }
        Ok(column)
    }

    pub fn size(mut self, size: ColumnSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn length(self, length: u32) -> Self {
        self.size(ColumnSize::Length(length))
    }

    pub fn precision(self, precision: u32, scale: u32) -> Self {
        self.size(ColumnSize::Precision(precision, scale))
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable && self.default.is_none() && !self.primary;
        self
    }

    /// Set the default value; a NULL value removes any default
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = ColumnDefault::from_value(value.into());
        if self.default.is_some() {
            self.nullable = false;
        }
        self
    }

    pub fn default_current_timestamp(mut self) -> Self {
        self.default = Some(ColumnDefault::CurrentTimestamp);
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Flag as (part of) the primary key; primary key columns are NOT NULL
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self
    }

    pub fn foreign(mut self) -> Self {
        self.foreign = true;
        self
    }

    /// Position hint used when the column is added to an existing table
    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after = Some(column.into());
        self
    }

    /// Expression re-evaluated on every row update, e.g. `CURRENT_TIMESTAMP`
    pub fn on_update(mut self, expression: impl Into<String>) -> Self {
        self.on_update = Some(expression.into());
        self
    }

    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn column_size(&self) -> Option<ColumnSize> {
        self.size
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default(&self) -> Option<&ColumnDefault> {
        self.default.as_ref()
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_foreign(&self) -> bool {
        self.foreign
    }

    pub fn after_column(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn on_update_expression(&self) -> Option<&str> {
        self.on_update.as_deref()
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }
}

/// Column options in record form, as read from configuration
///
/// Unknown option names are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct ColumnOptions {
    pub size: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: Option<bool>,
    pub default: Option<serde_json::Value>,
    pub auto_increment: bool,
    pub primary: bool,
    pub foreign: bool,
    /// `table.column` this column references; registers a foreign key on the table
    pub references: Option<String>,
    pub after: Option<String>,
    pub on_update: Option<String>,
    pub signed: bool,
}

impl ColumnOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid column options: {}", e)))
    }

    /// Split `references` into `(table, column)`
    pub fn reference(&self) -> Result<Option<(String, String)>> {
        match &self.references {
            None => Ok(None),
            Some(target) => match target.split_once('.') {
                Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                    Ok(Some((table.to_string(), column.to_string())))
                }
                _ => Err(Error::configuration(format!(
                    "references must look like 'table.column', got '{}'",
                    target
                ))),
            },
        }
    }
}
