//! CRUD for one model type

use super::naming::{DefaultNaming, NamingStrategy};
use super::{Model, ModelConfig};
use crate::builder::QueryBuilder;
use crate::driver::Driver;
use crate::language::Language;
use chrono::Utc;
use std::marker::PhantomData;
use stratum_core::{Error, Result, Row, Value, Where, DELETED_AT};
use tracing::{debug, warn};

/// Format of the soft-delete timestamp
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Maps `M` records to rows of its table through a borrowed [`Language`]
///
/// The [`ModelConfig`] is read and validated once, when the repository is
/// built, so two repositories never share mutable configuration.
pub struct Repository<'l, M: Model, D: Driver> {
    pub(super) language: &'l mut Language<D>,
    pub(super) config: ModelConfig,
    pub(super) naming: Box<dyn NamingStrategy>,
    marker: PhantomData<fn() -> M>,
}

impl<D: Driver> Language<D> {
    /// Repository for `M` using `M::model_config()`
    pub fn repository<M: Model>(&mut self) -> Result<Repository<'_, M, D>> {
        Repository::new(self, M::model_config())
    }
}

impl<'l, M: Model, D: Driver> Repository<'l, M, D> {
    pub fn new(language: &'l mut Language<D>, config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            language,
            config,
            naming: Box::new(DefaultNaming),
            marker: PhantomData,
        })
    }

    /// Replace the conventions used to infer relation keys
    pub fn with_naming(mut self, naming: impl NamingStrategy + 'static) -> Self {
        self.naming = Box::new(naming);
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// The compiler this repository runs on, e.g. to resolve a lazy relation
    pub fn language(&mut self) -> &mut Language<D> {
        self.language
    }

    /// A builder over this model's table, hydrating into `M`
    pub fn query(&self) -> QueryBuilder<M> {
        QueryBuilder::new(self.config.table.clone()).fillable(self.config.fillable.clone())
    }

    fn filtered(&self, conditions: &[Where]) -> QueryBuilder<M> {
        conditions
            .iter()
            .cloned()
            .fold(self.query(), |query, condition| query.where_(condition))
    }

    /// Records matching all `conditions`; empty when none match
    pub async fn find(&mut self, conditions: &[Where]) -> Result<Vec<M>> {
        let query = self.filtered(conditions);
        query.get(self.language).await
    }

    pub async fn find_one(&mut self, conditions: &[Where]) -> Result<Option<M>> {
        let query = self.filtered(conditions);
        query.first(self.language).await
    }

    /// Like [`find`](Self::find) but an empty result is [`Error::NotFound`]
    pub async fn find_or_fail(&mut self, conditions: &[Where]) -> Result<Vec<M>> {
        let records = self.find(conditions).await?;
        if records.is_empty() {
            return Err(Error::not_found(self.config.table.clone()));
        }
        Ok(records)
    }

    pub async fn find_one_or_fail(&mut self, conditions: &[Where]) -> Result<M> {
        self.find_one(conditions)
            .await?
            .ok_or_else(|| Error::not_found(self.config.table.clone()))
    }

    pub async fn all(&mut self) -> Result<Vec<M>> {
        let query = self.query();
        query.get(self.language).await
    }

    pub async fn get_count(&mut self, conditions: &[Where]) -> Result<u64> {
        let query = self.filtered(conditions);
        query.count(self.language).await
    }

    pub async fn delete_rows(&mut self, conditions: &[Where]) -> Result<u64> {
        self.language
            .delete_rows(&self.config.table, conditions)
            .await
    }

    /// Insert `record`
    ///
    /// A missing or null primary key is left to the database; the generated
    /// id is written back into `record`. Any failure is wrapped in
    /// [`Error::Save`].
    pub async fn save(&mut self, record: &mut M) -> Result<()> {
        match self.insert_record(record).await {
            Ok(()) => Ok(()),
            Err(e) => Err(Error::save(self.config.table.clone(), e)),
        }
    }

    async fn insert_record(&mut self, record: &mut M) -> Result<()> {
        let primary_key = self.config.primary_key.clone();
        let mut row = self.writable_row(record)?;
        let generated = row.get(&primary_key).map_or(true, Value::is_null);
        if generated {
            row.remove(&primary_key);
        }

        let result = self
            .language
            .insert(&self.config.table, &[row], self.config.saveable.as_deref())
            .await?;

        if let (true, Some(id)) = (generated, result.last_insert_id) {
            let id = i64::try_from(id).map_err(|_| {
                Error::invalid_argument(format!("generated id {} does not fit in i64", id))
            })?;
            debug!(table = %self.config.table, id, "Record inserted");
            let mut full = Row::from_serialize(&*record)?;
            full.set(primary_key, id);
            *record = full.deserialize()?;
        }
        Ok(())
    }

    /// Write `record` back to its row, keyed by the primary key
    pub async fn update(&mut self, record: &M) -> Result<u64> {
        let key = self.key_condition(record)?;
        let mut row = self.writable_row(record)?;
        row.remove(&self.config.primary_key);
        if let Some(saveable) = &self.config.saveable {
            row.retain(|column| saveable.iter().any(|c| c == column));
        }
        self.language
            .update(&self.config.table, &row, &[key])
            .await
    }

    pub async fn delete(&mut self, record: &M) -> Result<u64> {
        let key = self.key_condition(record)?;
        self.language.delete_rows(&self.config.table, &[key]).await
    }

    /// Stamp the deletion column instead of removing the row
    ///
    /// Only allowed when the model enables soft deletes. The timestamp is also
    /// set on `record` when it has a deletion field.
    pub async fn soft_delete(&mut self, record: &mut M) -> Result<u64> {
        if !self.config.soft_delete {
            return Err(Error::logic(format!(
                "soft deletes are not enabled for '{}'",
                self.config.table
            )));
        }
        let key = self.key_condition(record)?;
        let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let data = Row::from_pairs([(DELETED_AT, now.as_str())]);
        let affected = self
            .language
            .update(&self.config.table, &data, &[key])
            .await?;

        let mut full = Row::from_serialize(&*record)?;
        if full.contains(DELETED_AT) {
            full.set(DELETED_AT, now);
            *record = full.deserialize()?;
        }
        Ok(affected)
    }

    /// Copy `record` into `target` and optionally delete it here, atomically
    ///
    /// Any failure rolls the transaction back before the error is returned.
    pub async fn move_to(&mut self, record: &M, target: &str, delete_original: bool) -> Result<()> {
        let key = if delete_original {
            Some(self.key_condition(record)?)
        } else {
            None
        };
        let mut row = Row::from_serialize(record)?;
        M::before_save(&mut row);

        self.language.begin_transaction().await?;
        match self.transfer(&row, target, key).await {
            Ok(()) => self.language.commit().await,
            Err(e) => {
                warn!(table = %self.config.table, target, error = %e, "Move failed, rolling back");
                if let Err(rollback_error) = self.language.rollback().await {
                    warn!(table = %self.config.table, error = %rollback_error, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn transfer(&mut self, row: &Row, target: &str, key: Option<Where>) -> Result<()> {
        self.language
            .insert(target, std::slice::from_ref(row), None)
            .await?;
        if let Some(key) = key {
            self.language
                .delete_rows(&self.config.table, &[key])
                .await?;
        }
        Ok(())
    }

    /// Serialized record after `before_save`, limited to fillable columns and the key
    fn writable_row(&self, record: &M) -> Result<Row> {
        let mut row = Row::from_serialize(record)?;
        M::before_save(&mut row);
        let config = &self.config;
        row.retain(|column| column == config.primary_key || config.is_fillable(column));
        Ok(row)
    }

    fn key_condition(&self, record: &M) -> Result<Where> {
        let value = required_value(record, &self.config.primary_key)?;
        Ok(Where::eq(self.config.primary_key.as_str(), value))
    }
}

/// Non-null value of `column` on the serialized record
pub(super) fn required_value<T: serde::Serialize>(record: &T, column: &str) -> Result<Value> {
    let mut row = Row::from_serialize(record)?;
    match row.remove(column) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(Error::logic(format!(
            "record has no value for key column '{}'",
            column
        ))),
    }
}

impl<M: Model, D: Driver> std::fmt::Debug for Repository<'_, M, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("model", &M::NAME)
            .field("config", &self.config)
            .field("naming", &self.naming)
            .finish()
    }
}
