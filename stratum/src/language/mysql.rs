//! MySQL dialect

use super::dialect::Dialect;
use super::render::Compiled;
use stratum_core::{Column, ColumnDefault, ColumnSize, DataType, Error, Result, Table, Value};

pub const DEFAULT_ENGINE: &str = "InnoDB";
pub const DEFAULT_CHARSET: &str = "utf8";
pub const DEFAULT_COLLATION: &str = "utf8_unicode_ci";

/// How a logical type maps onto a MySQL type
enum Sizing {
    /// Sized type with a default that an explicit size may replace
    Default(ColumnSize),
    /// Size is part of the mapping and cannot be changed
    Fixed(ColumnSize),
    /// No size allowed
    None,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl MySql {
    fn type_mapping(data_type: &DataType) -> (&'static str, Sizing) {
        use ColumnSize::{Length, Precision};
        match data_type {
            DataType::String => ("varchar", Sizing::Default(Length(255))),
            DataType::Char => ("char", Sizing::Default(Length(1))),
            DataType::Binary => ("binary", Sizing::Default(Length(1))),
            DataType::TinyInt => ("tinyint", Sizing::Default(Length(4))),
            DataType::SmallInt => ("smallint", Sizing::Default(Length(6))),
            DataType::MediumInt => ("mediumint", Sizing::Default(Length(9))),
            DataType::Int => ("int", Sizing::Default(Length(11))),
            DataType::BigInt => ("bigint", Sizing::Default(Length(20))),
            DataType::Float => ("float", Sizing::Default(Precision(10, 2))),
            DataType::Double => ("double", Sizing::Default(Precision(16, 4))),
            DataType::Decimal => ("decimal", Sizing::Default(Precision(18, 6))),
            DataType::Boolean => ("tinyint", Sizing::Fixed(Length(1))),
            DataType::Uuid => ("char", Sizing::Fixed(Length(36))),
            DataType::TinyText => ("tinytext", Sizing::None),
            DataType::Text => ("text", Sizing::None),
            DataType::MediumText => ("mediumtext", Sizing::None),
            DataType::LongText => ("longtext", Sizing::None),
            DataType::TinyBlob => ("tinyblob", Sizing::None),
            DataType::Blob => ("blob", Sizing::None),
            DataType::MediumBlob => ("mediumblob", Sizing::None),
            DataType::LongBlob => ("longblob", Sizing::None),
            DataType::Date => ("date", Sizing::None),
            DataType::DateTime => ("datetime", Sizing::None),
            DataType::Timestamp => ("timestamp", Sizing::None),
            DataType::Time => ("time", Sizing::None),
            DataType::Year => ("year", Sizing::None),
            DataType::Json => ("json", Sizing::None),
            DataType::Geometry => ("geometry", Sizing::None),
            DataType::Point => ("point", Sizing::None),
            DataType::LineString => ("linestring", Sizing::None),
            DataType::Polygon => ("polygon", Sizing::None),
            DataType::Enum(_) => ("enum", Sizing::None),
            DataType::Set(_) => ("set", Sizing::None),
        }
    }

    fn value_list(&self, column: &Column, values: &[String]) -> Result<String> {
        if values.is_empty() {
            return Err(Error::configuration(format!(
                "column '{}' of type {} lists no values",
                column.name(),
                column.data_type()
            )));
        }
        Ok(values
            .iter()
            .map(|v| self.quote_literal(v))
            .collect::<Vec<_>>()
            .join(","))
    }

    fn default_clause(&self, column: &Column) -> Result<Option<String>> {
        match column.default() {
            None => Ok(None),
            Some(ColumnDefault::CurrentTimestamp) => Ok(Some(format!(
                "DEFAULT {}",
                ColumnDefault::CURRENT_TIMESTAMP
            ))),
            Some(ColumnDefault::Value(value)) => {
                let text = match value {
                    Value::Json(json) => Some(json.to_string()),
                    other => other.scalar_text(),
                };
                let text = text.ok_or_else(|| {
                    Error::configuration(format!(
                        "column '{}' has a {} default, which has no literal form",
                        column.name(),
                        value.type_name()
                    ))
                })?;
                Ok(Some(format!("DEFAULT {}", self.quote_literal(&text))))
            }
        }
    }

    fn catalog_filter(database: Option<&str>, table: &str) -> (&'static str, Vec<Value>) {
        match database {
            Some(database) => (
                "TABLE_SCHEMA = ? AND TABLE_NAME = ?",
                vec![Value::from(database), Value::from(table)],
            ),
            None => ("TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?", vec![Value::from(table)]),
        }
    }
}

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    /// Backtick-quote each dotted part; `*` stays bare
    fn quote_identifier(&self, identifier: &str) -> String {
        identifier
            .split('.')
            .map(|part| match part {
                "*" => "*".to_string(),
                _ => format!("`{}`", part.replace('`', "``")),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    fn column_type(&self, column: &Column) -> Result<String> {
        let data_type = column.data_type();
        let (name, sizing) = Self::type_mapping(data_type);

        let size = match (sizing, column.column_size()) {
            (Sizing::Default(default), None) => Some(default),
            (Sizing::Default(_), Some(ColumnSize::Precision(..))) if !data_type.has_precision() => {
                return Err(Error::configuration(format!(
                    "column '{}' of type {} takes a length, not a precision",
                    column.name(),
                    data_type
                )))
            }
            (Sizing::Default(_), Some(explicit)) => Some(explicit),
            (Sizing::Fixed(fixed), None) => Some(fixed),
            (Sizing::None, None) => None,
            (Sizing::Fixed(_) | Sizing::None, Some(_)) => {
                return Err(Error::configuration(format!(
                    "column '{}' of type {} does not take a size",
                    column.name(),
                    data_type
                )))
            }
        };

        let mut sql = match data_type {
            DataType::Enum(values) | DataType::Set(values) => {
                format!("{}({})", name, self.value_list(column, values)?)
            }
            _ => match size {
                Some(ColumnSize::Length(length)) => format!("{}({})", name, length),
                Some(ColumnSize::Precision(precision, scale)) => {
                    format!("{}({},{})", name, precision, scale)
                }
                None => name.to_string(),
            },
        };

        if data_type.is_numeric() {
            sql.push_str(if column.is_signed() { " SIGNED" } else { " UNSIGNED" });
        }
        Ok(sql)
    }

    fn column_definition(&self, column: &Column) -> Result<String> {
        let mut parts = vec![
            self.quote_identifier(column.name()),
            self.column_type(column)?,
            (if column.is_nullable() { "NULL" } else { "NOT NULL" }).to_string(),
        ];
        if column.is_auto_increment() {
            parts.push("AUTO_INCREMENT".to_string());
        }
        if let Some(default) = self.default_clause(column)? {
            parts.push(default);
        }
        if let Some(expression) = column.on_update_expression() {
            parts.push(format!("ON UPDATE {}", expression));
        }
        Ok(parts.join(" "))
    }

    fn create_table(&self, table: &Table) -> Result<String> {
        if table.columns().is_empty() {
            return Err(Error::configuration(format!(
                "table '{}' has no columns",
                table.name()
            )));
        }

        let mut definitions = table
            .columns()
            .iter()
            .map(|column| self.column_definition(column))
            .collect::<Result<Vec<_>>>()?;

        let primary_keys = table.primary_keys();
        if !primary_keys.is_empty() {
            let keys: Vec<String> = primary_keys.iter().map(|k| self.quote_identifier(k)).collect();
            definitions.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }

        for foreign_key in table.foreign_keys() {
            let local: Vec<String> = foreign_key
                .columns()
                .iter()
                .map(|c| self.quote_identifier(c))
                .collect();
            let remote: Vec<String> = foreign_key
                .reference_columns()
                .iter()
                .map(|c| self.quote_identifier(c))
                .collect();
            let mut clause = format!(
                "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                self.quote_identifier(&foreign_key.constraint_name(table.name())),
                local.join(", "),
                self.quote_identifier(foreign_key.reference_table()),
                remote.join(", ")
            );
            if let Some(action) = foreign_key.on_update() {
                clause.push_str(&format!(" ON UPDATE {}", action));
            }
            if let Some(action) = foreign_key.on_delete() {
                clause.push_str(&format!(" ON DELETE {}", action));
            }
            definitions.push(clause);
        }

        let options = table.options();
        let mut sql = format!(
            "CREATE TABLE {} ({}) ENGINE={} CHARACTER SET {} COLLATE {}",
            self.quote_identifier(table.name()),
            definitions.join(", "),
            options.engine.as_deref().unwrap_or(DEFAULT_ENGINE),
            options.charset.as_deref().unwrap_or(DEFAULT_CHARSET),
            options.collation.as_deref().unwrap_or(DEFAULT_COLLATION),
        );
        if let Some(comment) = &options.comment {
            sql.push_str(&format!(" COMMENT={}", self.quote_literal(comment)));
        }
        Ok(sql)
    }

    fn add_column(&self, table: &str, column: &Column) -> Result<String> {
        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(table),
            self.column_definition(column)?
        );
        if let Some(after) = column.after_column() {
            sql.push_str(&format!(" AFTER {}", self.quote_identifier(after)));
        }
        Ok(sql)
    }

    fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE {}", self.quote_identifier(table))
    }

    fn drop_foreign_key(&self, table: &str, constraint: &str) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_identifier(table),
            self.quote_identifier(constraint)
        )
    }

    fn truncate(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {}", self.quote_identifier(table))
    }

    fn create_database(&self, name: &str) -> String {
        format!("CREATE DATABASE IF NOT EXISTS {}", self.quote_identifier(name))
    }

    fn drop_database(&self, name: &str) -> String {
        format!("DROP DATABASE IF EXISTS {}", self.quote_identifier(name))
    }

    fn has_table_query(&self, database: Option<&str>, table: &str) -> Compiled {
        let (filter, params) = Self::catalog_filter(database, table);
        Compiled::new(
            format!("SELECT COUNT(*) FROM information_schema.TABLES WHERE {}", filter),
            params,
        )
    }

    fn primary_keys_query(&self, database: Option<&str>, table: &str) -> Compiled {
        let (filter, params) = Self::catalog_filter(database, table);
        Compiled::new(
            format!(
                "SELECT COLUMN_NAME FROM information_schema.KEY_COLUMN_USAGE WHERE {} \
                 AND CONSTRAINT_NAME = 'PRIMARY' ORDER BY ORDINAL_POSITION",
                filter
            ),
            params,
        )
    }

    fn constraints_query(&self, database: Option<&str>, table: &str) -> Compiled {
        let (filter, params) = Self::catalog_filter(database, table);
        Compiled::new(
            format!(
                "SELECT CONSTRAINT_NAME FROM information_schema.TABLE_CONSTRAINTS WHERE {} \
                 AND CONSTRAINT_TYPE = 'FOREIGN KEY'",
                filter
            ),
            params,
        )
    }
}
