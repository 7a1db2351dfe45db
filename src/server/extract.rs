//! Axum extractors for collection queries and conditional requests

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::core::error::HateoasError;
use crate::core::etag::IfNoneMatch;
use crate::core::query::CollectionQuery;

/// Extract `offset`, `limit`, `filter` and `sort` from the query string
///
/// Rejects with a 400 when a paging value is not an integer. Field level
/// validation happens later, when the query is compiled for a resource.
///
/// # Example
/// ```rust,ignore
/// async fn list_worlds(query: CollectionQuery) -> Result<Response, HateoasError> {
///     let plan = QueryPlan::compile::<WorldRest>(&query, config.paging())?;
///     ...
/// }
/// ```
impl<S> FromRequestParts<S> for CollectionQuery
where
    S: Send + Sync,
{
    type Rejection = HateoasError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        Ok(CollectionQuery::from_query_string(query)?)
    }
}

/// Validators sent with a conditional GET
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalRequest {
    pub if_none_match: Option<IfNoneMatch>,
}

impl ConditionalRequest {
    /// Request without validators; always answered in full
    pub fn unconditional() -> Self {
        Self::default()
    }
}

impl<S> FromRequestParts<S> for ConditionalRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            if_none_match: IfNoneMatch::from_headers(&parts.headers),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::etag::EntityTag;
    use axum::http::{Request, header};

    fn parts(uri: &str, if_none_match: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = if_none_match {
            builder = builder.header(header::IF_NONE_MATCH, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_collection_query_extractor() {
        let mut parts = parts("/api/worlds?offset=2&filter=tenantName%20eq%20ADAMS", None);
        let query = CollectionQuery::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(query.paging.offset, Some(2));
        assert_eq!(query.filter, vec!["tenantName eq ADAMS"]);
    }

    #[tokio::test]
    async fn test_collection_query_rejects_bad_paging() {
        let mut parts = parts("/api/worlds?offset=first", None);
        let err = CollectionQuery::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_QUERY_PARAMETER");
    }

    #[tokio::test]
    async fn test_conditional_request_extractor() {
        let mut without = parts("/api/worlds", None);
        let request = ConditionalRequest::from_request_parts(&mut without, &()).await.unwrap();
        assert_eq!(request, ConditionalRequest::unconditional());

        let mut with = parts("/api/worlds", Some("\"abc\""));
        let request = ConditionalRequest::from_request_parts(&mut with, &()).await.unwrap();
        assert_eq!(
            request.if_none_match,
            Some(IfNoneMatch::Tags(vec![EntityTag::strong("abc")]))
        );
    }
}
