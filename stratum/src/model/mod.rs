//! Record and relation mapping on top of the compiler

pub mod naming;
pub mod relation;
pub mod repository;

pub use naming::{short_name, DefaultNaming, NamingStrategy};
pub use relation::Related;
pub use repository::Repository;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stratum_core::{Error, Result, Row, AUDIT_COLUMNS};

/// A typed record stored in one table
///
/// Fields map to columns through serde. The table and column policy come
/// from [`Model::model_config`], which is read once per [`Repository`].
///
/// # Examples
/// ```
/// use serde::{Deserialize, Serialize};
/// use stratum::{Model, ModelConfig};
///
/// #[derive(Serialize, Deserialize)]
/// struct Post {
///     id: Option<i64>,
///     title: String,
/// }
///
/// impl Model for Post {
///     const NAME: &'static str = "Post";
/// }
///
/// assert_eq!(Post::model_config().table, "post");
/// ```
pub trait Model: Serialize + DeserializeOwned + Send + Sync {
    /// Short type name, the base for inferred foreign keys
    const NAME: &'static str;

    fn model_config() -> ModelConfig {
        ModelConfig::new(short_name(Self::NAME))
    }

    /// Adjust the row about to be written by `save`, `update` or `move_to`
    ///
    /// The default drops the audit columns so the database maintains them.
    fn before_save(row: &mut Row) {
        row.retain(|column| !AUDIT_COLUMNS.contains(&column));
    }
}

/// Per-model table and column policy
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub table: String,
    pub primary_key: String,
    /// Columns hydrated from rows; all when `None`
    pub fillable: Option<Vec<String>>,
    /// Columns written on insert; the record's own columns when `None`
    pub saveable: Option<Vec<String>>,
    pub soft_delete: bool,
    /// Relations return a query instead of fetching
    pub lazy_relations: bool,
}

impl ModelConfig {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: "id".to_string(),
            fillable: None,
            saveable: None,
            soft_delete: false,
            lazy_relations: false,
        }
    }

    pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn fillable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fillable = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn saveable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.saveable = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn soft_delete(mut self, enabled: bool) -> Self {
        self.soft_delete = enabled;
        self
    }

    pub fn lazy_relations(mut self, enabled: bool) -> Self {
        self.lazy_relations = enabled;
        self
    }

    /// Check the policy is usable before any query is built from it
    pub fn validate(&self) -> Result<()> {
        if self.table.is_empty() {
            return Err(Error::configuration("model table name is empty"));
        }
        if self.primary_key.is_empty() {
            return Err(Error::configuration(format!(
                "model '{}' has an empty primary key name",
                self.table
            )));
        }
        if let Some(fillable) = &self.fillable {
            if fillable.is_empty() {
                return Err(Error::configuration(format!(
                    "model '{}' declares an empty fillable list",
                    self.table
                )));
            }
            if let Some(saveable) = &self.saveable {
                if let Some(column) = saveable.iter().find(|c| !fillable.contains(c)) {
                    return Err(Error::configuration(format!(
                        "saveable column '{}' of model '{}' is not fillable",
                        column, self.table
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn is_fillable(&self, column: &str) -> bool {
        self.fillable
            .as_ref()
            .map_or(true, |fillable| fillable.iter().any(|c| c == column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use stratum_core::{Value, CREATED_AT, DELETED_AT};

    #[derive(Serialize, Deserialize)]
    struct Comment {
        id: Option<i64>,
    }

    impl Model for Comment {
        const NAME: &'static str = "blog::Comment";
    }

    #[test]
    fn test_default_config() {
        let config = Comment::model_config();
        assert_eq!(config.table, "comment");
        assert_eq!(config.primary_key, "id");
        assert!(!config.soft_delete);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_before_save_drops_audit_columns() {
        let mut row = Row::from_pairs([
            ("body", Value::from("hi")),
            (CREATED_AT, Value::from("2024-01-01 00:00:00")),
            (DELETED_AT, Value::Null),
        ]);
        Comment::before_save(&mut row);
        assert_eq!(row.columns(), &["body".to_string()]);
    }

    #[test]
    fn test_validate() {
        let config = ModelConfig::new("post")
            .fillable(["id", "title"])
            .saveable(["title", "body"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'body'"));

        let empty = ModelConfig::new("post").fillable(Vec::<String>::new());
        assert!(matches!(empty.validate(), Err(Error::Configuration { .. })));
        assert!(ModelConfig::new("").validate().is_err());
    }

    #[test]
    fn test_is_fillable() {
        assert!(ModelConfig::new("post").is_fillable("anything"));
        let config = ModelConfig::new("post").fillable(["title"]);
        assert!(config.is_fillable("title"));
        assert!(!config.is_fillable("secret"));
    }
}
