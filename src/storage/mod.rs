//! Data sources evaluating compiled query plans

pub mod in_memory;
pub mod sql;

pub use in_memory::InMemoryDataSource;
pub use sql::{SqlDialect, SqlQuery};
