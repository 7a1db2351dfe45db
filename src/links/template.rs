//! Route templates such as `/api/worlds/{worldId}/residents`

use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::core::error::ResolutionError;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param(String),
}

/// A parsed route template
///
/// Each path segment is a sequence of literal text and `{name}` placeholders.
/// Placeholder values are percent-encoded as path segment content, so a value
/// can never introduce extra path segments or a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
    segments: Vec<Vec<Part>>,
}

impl UrlTemplate {
    /// Parse a template; it must start with `/`
    pub fn parse(raw: &str) -> Result<Self, ResolutionError> {
        let invalid = |message: &str| ResolutionError::InvalidTemplate {
            template: raw.to_string(),
            message: message.to_string(),
        };

        let path = raw.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;
        if path.contains(['?', '#']) {
            return Err(invalid("query strings and fragments are not allowed"));
        }

        let mut segments = Vec::new();
        for segment in path.split('/') {
            let mut parts = Vec::new();
            let mut last = 0;
            for captures in placeholder_regex().captures_iter(segment) {
                let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                    continue;
                };
                if whole.start() > last {
                    parts.push(Part::Literal(segment[last..whole.start()].to_string()));
                }
                parts.push(Part::Param(name.as_str().to_string()));
                last = whole.end();
            }
            if last < segment.len() {
                parts.push(Part::Literal(segment[last..].to_string()));
            }

            let stray_brace = parts
                .iter()
                .any(|p| matches!(p, Part::Literal(text) if text.contains(['{', '}'])));
            if stray_brace {
                return Err(invalid("unbalanced or invalid placeholder"));
            }
            segments.push(parts);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().flatten().filter_map(|part| match part {
            Part::Param(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Expand the template on top of `base`
    ///
    /// The base path acts as a prefix. Parameters the template does not use
    /// are appended as query pairs in their original order.
    pub fn expand(
        &self,
        endpoint: &str,
        params: &IndexMap<String, String>,
        base: &Url,
    ) -> Result<Url, ResolutionError> {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ResolutionError::InvalidBaseUrl {
                    url: base.to_string(),
                    message: "cannot be a base".to_string(),
                })?;
            path.pop_if_empty();
            for parts in &self.segments {
                let mut segment = String::new();
                for part in parts {
                    match part {
                        Part::Literal(text) => segment.push_str(text),
                        Part::Param(name) => {
                            let value = params.get(name).ok_or_else(|| {
                                ResolutionError::MissingParameter {
                                    endpoint: endpoint.to_string(),
                                    parameter: name.clone(),
                                }
                            })?;
                            segment.push_str(value);
                        }
                    }
                }
                path.push(&segment);
            }
        }

        let mut extras = params
            .iter()
            .filter(|(name, _)| !self.parameters().any(|p| p == name.as_str()))
            .peekable();
        if extras.peek().is_some() {
            let mut query = url.query_pairs_mut();
            for (name, value) in extras {
                query.append_pair(name, value);
            }
        }

        Ok(url)
    }
}
