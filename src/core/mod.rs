//! Core module: field metadata, query compilation, paging and entity tags

pub mod descriptor;
pub mod error;
pub mod etag;
pub mod field;
pub mod paging;
pub mod query;
pub mod registry;
pub mod search;
pub mod sort;
pub mod store;

pub use descriptor::{FieldDescriptor, FieldSet, FieldSource, Searchable};
pub use error::{ConfigError, HateoasError, ResolutionError, ValidationError};
pub use etag::{EntityTag, Etaggable, Freshness, IfNoneMatch};
pub use field::{FieldValue, ValueKind};
pub use paging::{PagedResults, PagingDefaults, PagingOptions, PagingWindow};
pub use query::{CollectionQuery, QueryPlan};
pub use registry::FieldRegistry;
pub use search::{Filter, Operator, SearchCompiler};
pub use sort::{SortCompiler, SortDirection, SortPlan};
pub use store::DataSource;
