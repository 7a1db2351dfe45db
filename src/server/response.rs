//! Hypermedia responses and the conditional-GET responder

use axum::http::header::{CONTENT_TYPE, ETAG, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;

use crate::config::HateoasConfig;
use crate::core::error::{ConfigError, HateoasError};
use crate::core::etag::{EntityTag, Etaggable, Freshness, evaluate};
use crate::links::link::Link;
use crate::links::resolver::{Hypermedia, LinkResolver, Resolved};
use crate::server::extract::ConditionalRequest;

/// A response whose body, if any, has all links resolved
#[derive(Debug)]
pub struct HypermediaResponse<T> {
    status: StatusCode,
    media_type: HeaderValue,
    etag: Option<EntityTag>,
    location: Option<String>,
    body: Option<Resolved<T>>,
}

impl<T> HypermediaResponse<T> {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn etag(&self) -> Option<&EntityTag> {
        self.etag.as_ref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn body(&self) -> Option<&T> {
        self.body.as_ref().map(Resolved::get)
    }
}

impl<T: Serialize> IntoResponse for HypermediaResponse<T> {
    fn into_response(self) -> Response {
        let mut response = match &self.body {
            Some(body) => match serde_json::to_vec(body) {
                Ok(bytes) => {
                    let mut response = bytes.into_response();
                    response
                        .headers_mut()
                        .insert(CONTENT_TYPE, self.media_type.clone());
                    response
                }
                Err(err) => return HateoasError::Serialization(err).into_response(),
            },
            None => ().into_response(),
        };

        *response.status_mut() = self.status;
        if let Some(value) = self.etag.as_ref().and_then(EntityTag::to_header_value) {
            response.headers_mut().insert(ETAG, value);
        }
        if let Some(value) = self
            .location
            .as_deref()
            .and_then(|href| HeaderValue::from_str(href).ok())
        {
            response.headers_mut().insert(LOCATION, value);
        }
        response
    }
}

/// Builds hypermedia responses for one service
///
/// Cheap to clone; share it through the router state.
#[derive(Debug, Clone)]
pub struct HypermediaResponder {
    resolver: Arc<LinkResolver>,
    media_type: HeaderValue,
}

impl HypermediaResponder {
    pub fn new(resolver: LinkResolver, media_type: &str) -> Result<Self, ConfigError> {
        let media_type = HeaderValue::from_str(media_type).map_err(|e| ConfigError::InvalidValue {
            field: "media_type".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            resolver: Arc::new(resolver),
            media_type,
        })
    }

    pub fn from_config(config: &HateoasConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(config.resolver()?, config.media_type())
    }

    pub fn resolver(&self) -> &LinkResolver {
        &self.resolver
    }

    /// 200 with the resolved body
    pub fn ok<T: Hypermedia>(&self, body: T) -> Result<HypermediaResponse<T>, HateoasError> {
        self.respond(StatusCode::OK, body, None, None)
    }

    /// Conditional GET
    ///
    /// The tag is computed from the unresolved body. When the client already
    /// holds it the answer is 304 with the tag and no body, and links are
    /// never resolved. Otherwise the body is resolved and sent with the tag.
    pub fn conditional<T: Hypermedia + Etaggable>(
        &self,
        request: &ConditionalRequest,
        body: T,
    ) -> Result<HypermediaResponse<T>, HateoasError> {
        let tag = body.entity_tag()?;
        match evaluate(request.if_none_match.as_ref(), tag) {
            Freshness::NotModified(tag) => Ok(HypermediaResponse {
                status: StatusCode::NOT_MODIFIED,
                media_type: self.media_type.clone(),
                etag: Some(tag),
                location: None,
                body: None,
            }),
            Freshness::Modified(tag) => self.respond(StatusCode::OK, body, Some(tag), None),
        }
    }

    /// 201 with a `Location` header pointing at the new resource
    pub fn created<T: Hypermedia>(
        &self,
        location: Link,
        body: T,
    ) -> Result<HypermediaResponse<T>, HateoasError> {
        let location = self.resolver.resolve(location)?.into_inner();
        let href = location.href().map(str::to_string);
        self.respond(StatusCode::CREATED, body, None, href)
    }

    fn respond<T: Hypermedia>(
        &self,
        status: StatusCode,
        body: T,
        etag: Option<EntityTag>,
        location: Option<String>,
    ) -> Result<HypermediaResponse<T>, HateoasError> {
        let body = self.resolver.resolve(body)?;
        Ok(HypermediaResponse {
            status,
            media_type: self.media_type.clone(),
            etag,
            location,
            body: Some(body),
        })
    }
}
