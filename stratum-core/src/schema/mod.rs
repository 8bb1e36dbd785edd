//! Dialect-independent schema model

pub mod column;
pub mod foreign_key;
pub mod table;
pub mod types;

pub use column::{Column, ColumnDefault, ColumnOptions};
pub use foreign_key::{ForeignKey, ForeignKeyAction, ForeignKeyOptions};
pub use table::{Table, TableOptions, AUDIT_COLUMNS, CREATED_AT, DELETED_AT, MODIFIED_AT};
pub use types::{ColumnSize, DataType};
