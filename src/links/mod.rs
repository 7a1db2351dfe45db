//! Hypermedia links, forms and their late resolution
//!
//! Resources embed [`Link`] values that only name an endpoint. The
//! [`LinkResolver`] binds them to hrefs through a [`RouteTable`] once the
//! resource is complete.

pub mod collection;
pub mod form;
pub mod link;
pub mod resolver;
pub mod routes;
pub mod template;

pub use collection::PagedCollection;
pub use form::{Form, FormField, FormFieldSpec, FormModel};
pub use link::{Link, relation};
pub use resolver::{Hypermedia, LinkResolver, LinkWalker, Resolved};
pub use routes::RouteTable;
pub use template::UrlTemplate;
