//! Conventions for inferring relation keys and join tables

use std::fmt::Debug;
use stratum_core::{Error, Result};

/// Key and join-table names used when a relation call leaves them out
pub trait NamingStrategy: Send + Sync + Debug {
    /// Column on a child table pointing at `model`, e.g. `post` -> `post_id`
    fn foreign_key(&self, model: &str) -> String;

    /// Column on the current table pointing at `target`'s `parent_key`
    fn belongs_to_key(&self, target: &str, parent_key: &str) -> String;

    /// Join table linking two tables
    fn join_table(&self, first: &str, second: &str) -> Result<String>;
}

/// `<model>_id` foreign keys and alphabetically joined pivot tables
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNaming;

/// Last path segment of a type name, lowercased
///
/// `blog::models::Post` becomes `post`.
pub fn short_name(name: &str) -> String {
    name.rsplit("::").next().unwrap_or(name).to_lowercase()
}

impl NamingStrategy for DefaultNaming {
    fn foreign_key(&self, model: &str) -> String {
        format!("{}_id", short_name(model))
    }

    fn belongs_to_key(&self, target: &str, parent_key: &str) -> String {
        format!("{}_{}", short_name(target), parent_key)
    }

    fn join_table(&self, first: &str, second: &str) -> Result<String> {
        if first == second {
            return Err(Error::logic(format!(
                "cannot infer a join table between '{}' and itself",
                first
            )));
        }
        let (low, high) = if first < second {
            (first, second)
        } else {
            (second, first)
        };
        Ok(format!("{}_{}", low, high))
    }
}
