//! Collection query parameters and compiled query plans

use serde::Serialize;

use crate::core::descriptor::Searchable;
use crate::core::error::ValidationError;
use crate::core::paging::{PagingDefaults, PagingOptions, PagingWindow};
use crate::core::search::{Filter, SearchCompiler};
use crate::core::sort::{SortCompiler, SortPlan};

/// Raw collection query as sent by the client
///
/// `filter` (alias `search`) and `sort` (alias `orderBy`) may repeat; a
/// single `sort` value may also list several keys separated by commas.
///
/// # Example
/// ```rust,ignore
/// GET /api/worlds?offset=0&limit=10&filter=tenantName eq ADAMS&sort=worldName,createdAt:desc
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionQuery {
    pub paging: PagingOptions,
    pub filter: Vec<String>,
    pub sort: Vec<String>,
}

impl CollectionQuery {
    /// Parse a URL query string (without the leading `?`)
    ///
    /// Unknown parameters are ignored.
    pub fn from_query_string(query: &str) -> Result<Self, ValidationError> {
        let mut parsed = Self::default();
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match name.as_ref() {
                "offset" => parsed.paging.offset = Some(parse_integer(&name, &value)?),
                "limit" => parsed.paging.limit = Some(parse_integer(&name, &value)?),
                "filter" | "search" => {
                    if !value.trim().is_empty() {
                        parsed.filter.push(value.into_owned());
                    }
                }
                "sort" | "orderBy" => parsed.sort.extend(
                    value
                        .split(',')
                        .filter(|key| !key.trim().is_empty())
                        .map(str::to_string),
                ),
                _ => {}
            }
        }
        Ok(parsed)
    }

    pub fn with_filter(mut self, token: impl Into<String>) -> Self {
        self.filter.push(token.into());
        self
    }

    pub fn with_sort(mut self, token: impl Into<String>) -> Self {
        self.sort.push(token.into());
        self
    }

    pub fn with_paging(mut self, offset: i64, limit: i64) -> Self {
        self.paging = PagingOptions {
            offset: Some(offset),
            limit: Some(limit),
        };
        self
    }
}

fn parse_integer(name: &str, value: &str) -> Result<i64, ValidationError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidQueryParameter {
            name: name.to_string(),
            message: format!("expected an integer, got '{}'", value),
        })
}

/// A validated, typed query ready to hand to a data source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub resource: &'static str,
    pub filter: Filter,
    pub sort: SortPlan,
    pub window: PagingWindow,
}

impl QueryPlan {
    /// Validate every part of a collection query for resource `T`
    ///
    /// Paging is checked first, then filters, then sort keys; the first
    /// failure is returned and nothing is fetched.
    pub fn compile<T: Searchable>(
        query: &CollectionQuery,
        defaults: PagingDefaults,
    ) -> Result<Self, ValidationError> {
        let window = PagingWindow::resolve(&query.paging, defaults)?;
        let filter = SearchCompiler::for_resource::<T>().compile(&query.filter)?;
        let sort = SortCompiler::for_resource::<T>().compile(&query.sort)?;

        let plan = Self {
            resource: T::resource_name(),
            filter,
            sort,
            window,
        };
        tracing::debug!(
            resource = plan.resource,
            offset = plan.window.offset,
            limit = plan.window.limit,
            conditions = plan.filter.conditions().len(),
            sort_keys = plan.sort.keys().len(),
            "compiled query plan"
        );
        Ok(plan)
    }
}
