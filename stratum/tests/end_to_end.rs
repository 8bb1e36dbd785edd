mod common;

use common::MemoryDriver;
use serde::{Deserialize, Serialize};
use stratum::{
    Column, Config, Connection, DataType, Error, Language, Model, ModelConfig,
    Table, TableOptions, Value, Where,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: Option<i64>,
    name: String,
    created_at: Option<String>,
    modified_at: Option<String>,
}

impl Model for User {
    const NAME: &'static str = "User";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Archived {
    id: Option<i64>,
    name: String,
    deleted_at: Option<String>,
}

impl Model for Archived {
    const NAME: &'static str = "Archived";

    fn model_config() -> ModelConfig {
        ModelConfig::new("user").soft_delete(true)
    }
}

fn user_table() -> Table {
    let mut table = Table::with_options("user", TableOptions::default().with_id()).unwrap();
    table
        .add_column(Column::new("name", DataType::String))
        .unwrap();
    table.add_timestamps().unwrap();
    table
}

async fn setup(driver: MemoryDriver) -> Language<MemoryDriver> {
    let config = Config::new().db("app");
    let mut language = Language::new(Connection::new(driver), &config).unwrap();
    language.create(&user_table()).await.unwrap();
    language
}

#[tokio::test]
async fn test_record_lifecycle() {
    let driver = MemoryDriver::new();
    let mut language = setup(driver.clone()).await;
    let mut users = language.repository::<User>().unwrap();

    let mut user = User {
        id: None,
        name: "a".into(),
        created_at: None,
        modified_at: None,
    };
    users.save(&mut user).await.unwrap();
    assert_eq!(user.id, Some(1));

    let mut found = users
        .find_one(&[Where::eq("name", "a")])
        .await
        .unwrap()
        .expect("saved user");
    assert_eq!(found.name, "a");
    assert!(found.id.is_some());
    assert!(found.created_at.is_some());

    found.name = "b".into();
    assert_eq!(users.update(&found).await.unwrap(), 1);
    let renamed = users
        .find_one_or_fail(&[Where::eq("id", found.id)])
        .await
        .unwrap();
    assert_eq!(renamed.name, "b");

    assert_eq!(users.delete(&renamed).await.unwrap(), 1);
    assert!(users
        .find_one(&[Where::eq("name", "b")])
        .await
        .unwrap()
        .is_none());
    assert!(driver.database().rows("user").is_empty());
}

#[tokio::test]
async fn test_counts_and_bulk_delete() {
    let driver = MemoryDriver::new();
    let mut language = setup(driver.clone()).await;
    let mut users = language.repository::<User>().unwrap();

    for name in ["a", "b", "b"] {
        let mut user = User {
            id: None,
            name: name.into(),
            created_at: None,
            modified_at: None,
        };
        users.save(&mut user).await.unwrap();
    }

    assert_eq!(users.get_count(&[]).await.unwrap(), 3);
    assert_eq!(users.get_count(&[Where::eq("name", "b")]).await.unwrap(), 2);
    assert_eq!(users.find_or_fail(&[Where::eq("name", "b")]).await.unwrap().len(), 2);

    let latest = users.query().order_by_desc("id");
    let newest = latest.first(users.language()).await.unwrap();
    assert_eq!(newest.and_then(|u| u.id), Some(3));

    assert_eq!(users.delete_rows(&[Where::eq("name", "b")]).await.unwrap(), 2);
    let err = users.find_or_fail(&[Where::eq("name", "b")]).await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(users.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_soft_delete_keeps_row() {
    let driver = MemoryDriver::new();
    let mut language = setup(driver.clone()).await;
    language
        .add_column("user", &Column::new("deleted_at", DataType::Timestamp).nullable(true))
        .await
        .unwrap();
    let mut archived = Archived {
        id: None,
        name: "gone".into(),
        deleted_at: None,
    };
    let mut repository = language.repository::<Archived>().unwrap();
    repository.save(&mut archived).await.unwrap();
    repository.soft_delete(&mut archived).await.unwrap();

    assert!(archived.deleted_at.is_some());
    let rows = driver.database().rows("user");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("deleted_at"),
        Some(&Value::from(archived.deleted_at.clone().unwrap()))
    );
}

#[tokio::test]
async fn test_move_failure_leaves_source_intact() {
    let driver = MemoryDriver::new().failing_on("INSERT INTO `user_archive`");
    let mut language = setup(driver.clone()).await;
    let mut users = language.repository::<User>().unwrap();

    let mut user = User {
        id: None,
        name: "keep".into(),
        created_at: None,
        modified_at: None,
    };
    users.save(&mut user).await.unwrap();

    let err = users.move_to(&user, "user_archive", true).await.unwrap_err();
    assert!(matches!(err, Error::Driver { .. }));

    let db = driver.database();
    assert_eq!(db.rows("user").len(), 1);
    assert!(!db.log.iter().any(|sql| sql.starts_with("DELETE")));
    assert_eq!(db.transactions, vec!["begin", "rollback"]);
}

#[tokio::test]
async fn test_move_into_archive() {
    let driver = MemoryDriver::new();
    let mut language = setup(driver.clone()).await;
    let mut archive =
        Table::with_options("user_archive", TableOptions::default().with_id()).unwrap();
    archive
        .add_column(Column::new("name", DataType::String))
        .unwrap();
    language.create(&archive).await.unwrap();

    let mut users = language.repository::<User>().unwrap();
    let mut user = User {
        id: None,
        name: "old".into(),
        created_at: None,
        modified_at: None,
    };
    users.save(&mut user).await.unwrap();
    users.move_to(&user, "user_archive", true).await.unwrap();

    let db = driver.database();
    assert!(db.rows("user").is_empty());
    let archived = db.rows("user_archive");
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].get("name"), Some(&Value::from("old")));
    assert_eq!(db.transactions, vec!["begin", "commit"]);
}

#[tokio::test]
async fn test_drop_table() {
    let driver = MemoryDriver::new();
    let mut language = setup(driver.clone()).await;
    assert!(driver.database().has_table("user"));
    language.drop_table("user").await.unwrap();
    assert!(!driver.database().has_table("user"));
}
