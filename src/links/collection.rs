//! Paged collection envelope

use serde::Serialize;

use crate::core::error::ResolutionError;
use crate::core::etag::Etaggable;
use crate::core::paging::{PagedResults, PagingWindow};
use crate::links::form::Form;
use crate::links::link::{Link, relation};
use crate::links::resolver::{Hypermedia, LinkWalker};

/// One page of a collection with navigation links
///
/// ```json
/// {
///   "self": { "href": "/api/worlds", "rel": ["collection"] },
///   "items": [ ... ],
///   "totalSize": 42, "offset": 10, "limit": 10,
///   "first": { "href": "/api/worlds?offset=0&limit=10", "rel": ["collection"] },
///   "previous": { ... }, "next": { ... }, "last": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedCollection<T> {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub items: Vec<T>,
    pub total_size: usize,
    pub offset: usize,
    pub limit: usize,
    pub first: Link,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Form>,
}

impl<T> PagedCollection<T> {
    /// Build the envelope around one page
    ///
    /// `self_link` must still be unresolved; navigation links are derived
    /// from its endpoint and parameters.
    pub fn new(self_link: Link, page: PagedResults<T>, window: PagingWindow) -> Self {
        let self_link = self_link.with_relation(relation::COLLECTION);
        let total = page.total_size;
        let at = |offset: usize| {
            self_link
                .clone()
                .with_param("offset", offset)
                .with_param("limit", window.limit)
        };

        Self {
            first: at(0),
            previous: window.previous_offset().map(at),
            next: window.next_offset(total).map(at),
            last: window.last_offset(total).map(at),
            items: page.items,
            total_size: total,
            offset: window.offset,
            limit: window.limit,
            query: None,
            self_link,
        }
    }

    /// Attach a query form describing how to search this collection
    pub fn with_query_form(mut self, form: Form) -> Self {
        self.query = Some(form);
        self
    }
}

impl<T: Hypermedia> Hypermedia for PagedCollection<T> {
    fn visit_links(&mut self, walker: &mut LinkWalker<'_>) -> Result<(), ResolutionError> {
        walker.link(&mut self.self_link)?;
        walker.visit(&mut self.items)?;
        walker.link(&mut self.first)?;
        walker.visit(&mut self.previous)?;
        walker.visit(&mut self.next)?;
        walker.visit(&mut self.last)?;
        walker.visit(&mut self.query)
    }
}

impl<T: Serialize> Etaggable for PagedCollection<T> {}
