//! Relation accessors: has-one, has-many, belongs-to and many-to-many

use super::repository::{required_value, Repository};
use super::{Model, ModelConfig};
use crate::builder::QueryBuilder;
use crate::driver::Driver;
use crate::language::Language;
use serde::de::DeserializeOwned;
use stratum_core::{Error, Result, Row, Select, Value, Where};
use tracing::debug;

/// Outcome of a relation lookup
///
/// `Loaded` holds fetched records. `Query` is returned when the owning model
/// has lazy relations enabled; it can be refined before running.
#[derive(Debug)]
pub enum Related<R> {
    Loaded(Vec<R>),
    Query(QueryBuilder<R>),
}

impl<R: DeserializeOwned> Related<R> {
    pub fn is_lazy(&self) -> bool {
        matches!(self, Related::Query(_))
    }

    /// Records of the relation, running the query if it is still lazy
    pub async fn resolve<D: Driver>(self, language: &mut Language<D>) -> Result<Vec<R>> {
        match self {
            Related::Loaded(records) => Ok(records),
            Related::Query(query) => query.get(language).await,
        }
    }

    pub fn into_query(self) -> Option<QueryBuilder<R>> {
        match self {
            Related::Query(query) => Some(query),
            Related::Loaded(_) => None,
        }
    }

    pub fn into_loaded(self) -> Option<Vec<R>> {
        match self {
            Related::Loaded(records) => Some(records),
            Related::Query(_) => None,
        }
    }
}

fn sibling<R: Model>() -> Result<(ModelConfig, QueryBuilder<R>)> {
    let config = R::model_config();
    config.validate()?;
    let query = QueryBuilder::new(config.table.clone()).fillable(config.fillable.clone());
    Ok((config, query))
}

impl<M: Model, D: Driver> Repository<'_, M, D> {
    /// Children of `record` in `R`'s table, at most one
    ///
    /// `foreign_key` defaults to `<model>_id`, `local_key` to the primary key.
    pub async fn has_one<R: Model>(
        &mut self,
        record: &M,
        foreign_key: Option<&str>,
        local_key: Option<&str>,
    ) -> Result<Related<R>> {
        let query = self.children::<R>(record, foreign_key, local_key)?.limit(1);
        self.finish(query).await
    }

    pub async fn has_many<R: Model>(
        &mut self,
        record: &M,
        foreign_key: Option<&str>,
        local_key: Option<&str>,
    ) -> Result<Related<R>> {
        let query = self.children::<R>(record, foreign_key, local_key)?;
        self.finish(query).await
    }

    /// The `R` record `record` points at
    ///
    /// The key column on `record` defaults to `<target>_<parent_key>` and
    /// `parent_key` to `id`. A null key yields `None`.
    pub async fn belongs_to<R: Model>(
        &mut self,
        record: &M,
        foreign_key: Option<&str>,
        parent_key: Option<&str>,
    ) -> Result<Option<R>> {
        let parent_key = parent_key.unwrap_or("id");
        let foreign_key = match foreign_key {
            Some(key) => key.to_string(),
            None => self.naming.belongs_to_key(R::NAME, parent_key),
        };
        let row = Row::from_serialize(record)?;
        let value = match row.get(&foreign_key) {
            Some(Value::Null) => return Ok(None),
            Some(value) => value.clone(),
            None => {
                return Err(Error::logic(format!(
                    "'{}' has no column '{}' to resolve a belongs-to relation",
                    M::NAME,
                    foreign_key
                )))
            }
        };
        let (_, query) = sibling::<R>()?;
        query
            .where_(Where::eq(parent_key, value))
            .first(self.language)
            .await
    }

    /// `R` records linked to `record` through a join table
    ///
    /// The join table defaults to both table names sorted and joined with `_`.
    /// Runs one query for the linked keys, then one for the records.
    pub async fn belongs_to_many<R: Model>(
        &mut self,
        record: &M,
        join_table: Option<&str>,
        local_foreign_key: Option<&str>,
        sibling_foreign_key: Option<&str>,
    ) -> Result<Related<R>> {
        let (config, query) = sibling::<R>()?;
        let join_table = match join_table {
            Some(table) => table.to_string(),
            None => self.naming.join_table(&self.config.table, &config.table)?,
        };
        let local_foreign_key = match local_foreign_key {
            Some(key) => key.to_string(),
            None => self.naming.foreign_key(M::NAME),
        };
        let sibling_foreign_key = match sibling_foreign_key {
            Some(key) => key.to_string(),
            None => self.naming.foreign_key(R::NAME),
        };
        let key = required_value(record, &self.config.primary_key)?;

        let links = Select::from(join_table.as_str())
            .columns(sibling_foreign_key.as_str())
            .where_(Where::eq(local_foreign_key, key));
        let ids: Vec<Value> = self
            .language
            .get_all_rows(&links)
            .await?
            .into_iter()
            .filter_map(|mut row| row.remove(&sibling_foreign_key))
            .filter(|id| !id.is_null())
            .collect();
        debug!(join_table = %join_table, linked = ids.len(), "Resolved many-to-many keys");

        if ids.is_empty() && !self.config.lazy_relations {
            return Ok(Related::Loaded(Vec::new()));
        }
        let query = query.where_in(&config.primary_key, ids);
        self.finish(query).await
    }

    fn children<R: Model>(
        &self,
        record: &M,
        foreign_key: Option<&str>,
        local_key: Option<&str>,
    ) -> Result<QueryBuilder<R>> {
        let foreign_key = match foreign_key {
            Some(key) => key.to_string(),
            None => self.naming.foreign_key(M::NAME),
        };
        let local_key = local_key.unwrap_or(&self.config.primary_key);
        let value = required_value(record, local_key)?;
        let (_, query) = sibling::<R>()?;
        Ok(query.where_(Where::eq(foreign_key, value)))
    }

    async fn finish<R: Model>(&mut self, query: QueryBuilder<R>) -> Result<Related<R>> {
        if self.config.lazy_relations {
            return Ok(Related::Query(query));
        }
        Ok(Related::Loaded(query.get(self.language).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::mock::{MockDriver, MockHandle};
    use crate::Config;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Post {
        id: Option<i64>,
        user_id: Option<i64>,
        title: String,
    }

    impl Model for Post {
        const NAME: &'static str = "Post";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct LazyPost {
        id: Option<i64>,
    }

    impl Model for LazyPost {
        const NAME: &'static str = "Post";

        fn model_config() -> ModelConfig {
            ModelConfig::new("post").lazy_relations(true)
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Comment {
        id: i64,
        body: String,
    }

    impl Model for Comment {
        const NAME: &'static str = "Comment";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct User {
        id: i64,
        name: String,
    }

    impl Model for User {
        const NAME: &'static str = "User";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Node {
        id: i64,
    }

    impl Model for Node {
        const NAME: &'static str = "Node";
    }

    fn language() -> (Language<MockDriver>, MockHandle) {
        let (driver, state) = MockDriver::new();
        let language = Language::new(Connection::new(driver), &Config::new()).unwrap();
        (language, state)
    }

    fn post() -> Post {
        Post {
            id: Some(1),
            user_id: Some(9),
            title: "hello".into(),
        }
    }

    fn comment_rows() -> Vec<Row> {
        vec![
            Row::from_pairs([("id", Value::I64(10)), ("body", Value::from("first"))]),
            Row::from_pairs([("id", Value::I64(11)), ("body", Value::from("second"))]),
        ]
    }

    #[tokio::test]
    async fn test_has_many_infers_foreign_key() {
        let (mut language, state) = language();
        state.push_rows(comment_rows());
        let comments = language
            .repository::<Post>()
            .unwrap()
            .has_many::<Comment>(&post(), None, None)
            .await
            .unwrap()
            .into_loaded()
            .unwrap();

        assert_eq!(comments.len(), 2);
        let (sql, params) = &state.executed()[0];
        assert_eq!(sql, "SELECT * FROM `comment` WHERE `post_id` = ?");
        assert_eq!(params, &vec![Value::I64(1)]);
    }

    #[tokio::test]
    async fn test_has_one_limits() {
        let (mut language, state) = language();
        language
            .repository::<Post>()
            .unwrap()
            .has_one::<Comment>(&post(), Some("article_id"), None)
            .await
            .unwrap();
        assert_eq!(
            state.executed()[0].0,
            "SELECT * FROM `comment` WHERE `article_id` = ? LIMIT 1"
        );
    }

    #[tokio::test]
    async fn test_lazy_relation_can_be_refined() {
        let (mut language, state) = language();
        let mut repository = language.repository::<LazyPost>().unwrap();
        let related = repository
            .has_many::<Comment>(&LazyPost { id: Some(3) }, None, None)
            .await
            .unwrap();
        assert!(related.is_lazy());
        assert!(state.executed().is_empty());

        let query = related.into_query().unwrap().order_by_desc("id");
        state.push_rows(comment_rows());
        let comments = query.get(repository.language()).await.unwrap();
        assert_eq!(comments[0].body, "first");
        assert_eq!(
            state.executed()[0].0,
            "SELECT * FROM `comment` WHERE `post_id` = ? ORDER BY `id` DESC"
        );
    }

    #[tokio::test]
    async fn test_belongs_to() {
        let (mut language, state) = language();
        state.push_rows(vec![Row::from_pairs([
            ("id", Value::I64(9)),
            ("name", Value::from("ada")),
        ])]);
        let user = language
            .repository::<Post>()
            .unwrap()
            .belongs_to::<User>(&post(), None, None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user.name, "ada");
        let (sql, params) = &state.executed()[0];
        assert_eq!(sql, "SELECT * FROM `user` WHERE `id` = ? LIMIT 1");
        assert_eq!(params, &vec![Value::I64(9)]);
    }

    #[tokio::test]
    async fn test_belongs_to_null_key() {
        let (mut language, state) = language();
        let orphan = Post {
            user_id: None,
            ..post()
        };
        let user = language
            .repository::<Post>()
            .unwrap()
            .belongs_to::<User>(&orphan, None, None)
            .await
            .unwrap();
        assert!(user.is_none());
        assert!(state.executed().is_empty());
    }

    #[tokio::test]
    async fn test_belongs_to_many() {
        let (mut language, state) = language();
        state.push_rows(vec![
            Row::from_pairs([("comment_id", Value::I64(10))]),
            Row::from_pairs([("comment_id", Value::I64(11))]),
        ]);
        state.push_rows(comment_rows());

        let comments = language
            .repository::<Post>()
            .unwrap()
            .belongs_to_many::<Comment>(&post(), None, None, None)
            .await
            .unwrap()
            .into_loaded()
            .unwrap();

        assert_eq!(comments[1].body, "second");
        let executed = state.executed();
        assert_eq!(
            executed[0].0,
            "SELECT `comment_id` FROM `comment_post` WHERE `post_id` = ?"
        );
        assert_eq!(executed[1].0, "SELECT * FROM `comment` WHERE `id` IN (?, ?)");
        assert_eq!(executed[1].1, vec![Value::I64(10), Value::I64(11)]);
    }

    #[tokio::test]
    async fn test_belongs_to_many_without_links() {
        let (mut language, state) = language();
        let related = language
            .repository::<Post>()
            .unwrap()
            .belongs_to_many::<Comment>(&post(), None, None, None)
            .await
            .unwrap();
        assert_eq!(related.into_loaded().unwrap(), Vec::<Comment>::new());
        assert_eq!(state.executed().len(), 1);
    }

    #[tokio::test]
    async fn test_belongs_to_many_same_table() {
        let (mut language, state) = language();
        let err = language
            .repository::<Node>()
            .unwrap()
            .belongs_to_many::<Node>(&Node { id: 1 }, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Logic { .. }));
        assert!(state.executed().is_empty());
    }
}
