//! Foreign key constraints

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Referential action for ON UPDATE / ON DELETE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    #[serde(rename = "RESTRICT", alias = "restrict")]
    Restrict,
    #[serde(rename = "CASCADE", alias = "cascade")]
    Cascade,
    #[serde(rename = "SET NULL", alias = "set null")]
    SetNull,
    #[serde(rename = "NO ACTION", alias = "no action")]
    NoAction,
}

impl ForeignKeyAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for ForeignKeyAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase().as_str() {
            "RESTRICT" => Ok(ForeignKeyAction::Restrict),
            "CASCADE" => Ok(ForeignKeyAction::Cascade),
            "SET NULL" => Ok(ForeignKeyAction::SetNull),
            "NO ACTION" => Ok(ForeignKeyAction::NoAction),
            _ => Err(Error::configuration(format!(
                "Unknown foreign key action '{}'",
                s
            ))),
        }
    }
}

/// Options of a foreign key; unknown option names are rejected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct ForeignKeyOptions {
    pub on_delete: Option<ForeignKeyAction>,
    pub on_update: Option<ForeignKeyAction>,
    /// Constraint name; generated from the table and columns when absent
    pub constraint: Option<String>,
}

impl ForeignKeyOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid foreign key options: {}", e)))
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub fn constraint(mut self, name: impl Into<String>) -> Self {
        self.constraint = Some(name.into());
        self
    }
}

/// Reference from local columns to the columns of another table
///
/// Both column lists always have the same, non-zero length.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    columns: Vec<String>,
    reference_table: String,
    reference_columns: Vec<String>,
    options: ForeignKeyOptions,
}

impl ForeignKey {
    pub fn new(
        columns: Vec<String>,
        reference_table: impl Into<String>,
        reference_columns: Vec<String>,
    ) -> Result<Self> {
        Self::with_options(columns, reference_table, reference_columns, ForeignKeyOptions::default())
    }

    pub fn with_options(
        columns: Vec<String>,
        reference_table: impl Into<String>,
        reference_columns: Vec<String>,
        options: ForeignKeyOptions,
    ) -> Result<Self> {
        let reference_table = reference_table.into();
        if columns.is_empty() {
            return Err(Error::configuration(format!(
                "foreign key to '{}' needs at least one column",
                reference_table
            )));
        }
        if columns.len() != reference_columns.len() {
            return Err(Error::configuration(format!(
                "foreign key to '{}' maps {} column(s) onto {} referenced column(s)",
                reference_table,
                columns.len(),
                reference_columns.len()
            )));
        }
        Ok(Self {
            columns,
            reference_table,
            reference_columns,
            options,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn reference_table(&self) -> &str {
        &self.reference_table
    }

    pub fn reference_columns(&self) -> &[String] {
        &self.reference_columns
    }

    pub fn on_delete(&self) -> Option<ForeignKeyAction> {
        self.options.on_delete
    }

    pub fn on_update(&self) -> Option<ForeignKeyAction> {
        self.options.on_update
    }

    /// Constraint name, `fk_<table>_<columns>` unless one was given
    pub fn constraint_name(&self, table: &str) -> String {
        match &self.options.constraint {
            Some(name) => name.clone(),
            None => format!("fk_{}_{}", table, self.columns.join("_")),
        }
    }
}
