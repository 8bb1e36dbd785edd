//! Tables: ordered columns, keys and storage options

use super::column::{Column, ColumnOptions};
use super::foreign_key::{ForeignKey, ForeignKeyOptions};
use super::types::DataType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const CREATED_AT: &str = "created_at";
pub const MODIFIED_AT: &str = "modified_at";
pub const DELETED_AT: &str = "deleted_at";

/// Audit columns maintained by the database, left out of INSERT column lists
pub const AUDIT_COLUMNS: [&str; 3] = [CREATED_AT, MODIFIED_AT, DELETED_AT];

/// Table-level options; unknown option names are rejected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct TableOptions {
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    /// Prepend an auto-increment integer `id` primary key
    pub id: bool,
    /// Explicit (possibly composite) primary key; wins over per-column flags
    pub primary_key: Option<Vec<String>>,
}

impl TableOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid table options: {}", e)))
    }

    pub fn with_id(mut self) -> Self {
        self.id = true;
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

/// Schema of one table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    options: TableOptions,
    columns: Vec<Column>,
    foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: TableOptions::default(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Create a table with options
    ///
    /// With `id` set, an auto-increment `int` column named `id` is prepended and
    /// becomes the primary key. Combining `id` with `primary_key` is an error.
    pub fn with_options(name: impl Into<String>, mut options: TableOptions) -> Result<Self> {
        let name = name.into();
        if options.id && options.primary_key.is_some() {
            return Err(Error::configuration(format!(
                "table '{}' declares both the id option and an explicit primary key",
                name
            )));
        }
        let mut columns = Vec::new();
        if options.id {
            columns.push(Column::new("id", DataType::Int).auto_increment().primary());
            options.primary_key = Some(vec!["id".to_string()]);
        }
        Ok(Self {
            name,
            options,
            columns,
            foreign_keys: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Primary key columns: the explicit option, else the columns flagged primary
    pub fn primary_keys(&self) -> Vec<String> {
        match &self.options.primary_key {
            Some(columns) => columns.clone(),
            None => self
                .columns
                .iter()
                .filter(|c| c.is_primary())
                .map(|c| c.name().to_string())
                .collect(),
        }
    }

    /// Append a column; names are unique within a table
    pub fn add_column(&mut self, column: Column) -> Result<&mut Self> {
        if self.column(column.name()).is_some() {
            return Err(Error::configuration(format!(
                "column '{}' already exists in table '{}'",
                column.name(),
                self.name
            )));
        }
        self.columns.push(column);
        Ok(self)
    }

    /// Append a column described by an option record
    ///
    /// A `references` option also registers a single-column foreign key.
    pub fn add_column_with(
        &mut self,
        name: impl Into<String>,
        data_type: DataType,
        options: ColumnOptions,
    ) -> Result<&mut Self> {
        let column = Column::with_options(name, data_type, &options)?;
        let reference = options.reference()?;
        let local = column.name().to_string();
        self.add_column(column)?;
        if let Some((table, referenced)) = reference {
            self.add_foreign_key(vec![local], table, vec![referenced], ForeignKeyOptions::default())?;
        }
        Ok(self)
    }

    /// Reference another table, given as a `Table` or by name
    pub fn add_foreign_key(
        &mut self,
        columns: Vec<String>,
        reference: impl AsRef<str>,
        reference_columns: Vec<String>,
        options: ForeignKeyOptions,
    ) -> Result<&mut Self> {
        let foreign_key =
            ForeignKey::with_options(columns, reference.as_ref(), reference_columns, options)?;
        for name in foreign_key.columns() {
            if self.column(name).is_none() {
                return Err(Error::configuration(format!(
                    "foreign key column '{}' is not a column of table '{}'",
                    name, self.name
                )));
            }
        }
        for column in self.columns.iter_mut() {
            if foreign_key.columns().iter().any(|c| c == column.name()) && !column.is_foreign() {
                *column = column.clone().foreign();
            }
        }
        self.foreign_keys.push(foreign_key);
        Ok(self)
    }

    /// Append `created_at` and `modified_at`, both defaulting to now,
    /// with `modified_at` refreshed on every update
    pub fn add_timestamps(&mut self) -> Result<&mut Self> {
        self.add_column(Column::new(CREATED_AT, DataType::Timestamp).default_current_timestamp())?;
        self.add_column(
            Column::new(MODIFIED_AT, DataType::Timestamp)
                .default_current_timestamp()
                .on_update("CURRENT_TIMESTAMP"),
        )
    }

    /// Append the nullable `deleted_at` soft-delete column
    pub fn add_delete(&mut self) -> Result<&mut Self> {
        self.add_column(Column::new(DELETED_AT, DataType::Timestamp).nullable(true))
    }
}

impl AsRef<str> for Table {
    fn as_ref(&self) -> &str {
        &self.name
    }
}
