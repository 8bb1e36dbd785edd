use serde::{Deserialize, Serialize};
use stratum::{
    Column, ColumnOptions, Config, DataType, ForeignKeyAction, ForeignKeyOptions, Language, Model,
    ModelConfig, MySqlDriver, Table, TableOptions, Where,
};

#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: Option<i64>,
    name: String,
}

impl Model for User {
    const NAME: &'static str = "User";
}

#[derive(Debug, Serialize, Deserialize)]
struct Post {
    id: Option<i64>,
    user_id: i64,
    title: String,
    deleted_at: Option<String>,
}

impl Model for Post {
    const NAME: &'static str = "Post";

    fn model_config() -> ModelConfig {
        ModelConfig::new("post").soft_delete(true)
    }
}

fn schema() -> stratum::Result<(Table, Table)> {
    let mut user = Table::with_options("user", TableOptions::default().with_id())?;
    user.add_column(Column::new("name", DataType::String).length(100))?
        .add_timestamps()?;

    let mut post = Table::with_options(
        "post",
        TableOptions::from_json(r#"{"id": true, "comment": "Blog posts"}"#)?,
    )?;
    post.add_column_with("user_id", DataType::Int, ColumnOptions::from_json(r#"{"size": 11}"#)?)?
        .add_column(Column::new("title", DataType::String))?
        .add_foreign_key(
            vec!["user_id".into()],
            &user,
            vec!["id".into()],
            ForeignKeyOptions::default().on_delete(ForeignKeyAction::Cascade),
        )?
        .add_timestamps()?
        .add_delete()?;

    Ok((user, post))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Stratum MySQL - Blog Schema Example ===\n");

    let config = match std::env::var("STRATUM_CONFIG") {
        Ok(json) => Config::from_json(&json)?,
        Err(_) => Config::new().db("stratum_example").user("root"),
    };

    let (user_table, post_table) = schema()?;
    let mut language = Language::<MySqlDriver>::connect(&config).await?;

    println!("1. CREATE TABLE:");
    println!("   {}\n", language.create_sql(&post_table)?);

    if language.has_table("post").await? {
        language.drop_table_with_foreign_keys("post").await?;
    }
    if language.has_table("user").await? {
        language.drop_table("user").await?;
    }
    language.create(&user_table).await?;
    language.create(&post_table).await?;

    let mut author = User {
        id: None,
        name: "Ada".into(),
    };
    language.repository::<User>()?.save(&mut author).await?;
    println!("2. Saved user with id {:?}", author.id);

    let mut posts = language.repository::<Post>()?;
    let mut post = Post {
        id: None,
        user_id: author.id.unwrap_or_default(),
        title: "Hello".into(),
        deleted_at: None,
    };
    posts.save(&mut post).await?;
    let owner: Option<User> = posts.belongs_to(&post, None, None).await?;
    println!("3. Post {:?} belongs to {:?}", post.id, owner.map(|u| u.name));

    posts.soft_delete(&mut post).await?;
    let live = posts.get_count(&[Where::is_null("deleted_at")]).await?;
    println!("4. Posts not deleted: {}", live);

    Ok(())
}
