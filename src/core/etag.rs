//! ETag Engine
//!
//! Entity tags are derived from the serialized representation of a resource.
//! The representation is walked as a JSON tree with object keys in sorted
//! order and fed into an xxh3 hasher, so two semantically equal resources
//! always get the same tag regardless of field declaration order.
//!
//! Tags are computed before links are resolved. Inside the canonical form an
//! unresolved link serializes as an empty object, which keeps the tag
//! independent of where the API is mounted. Outside it, serializing an
//! unresolved link is an error.

use axum::http::{HeaderMap, HeaderValue, header};
use serde::Serialize;
use serde_json::Value;
use std::cell::Cell;
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// An HTTP entity tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag {
    weak: bool,
    opaque: String,
}

impl EntityTag {
    pub fn strong(opaque: impl Into<String>) -> Self {
        Self {
            weak: false,
            opaque: opaque.into(),
        }
    }

    pub fn weak(opaque: impl Into<String>) -> Self {
        Self {
            weak: true,
            opaque: opaque.into(),
        }
    }

    /// Parse one tag in header form: `"abc"` or `W/"abc"`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (weak, quoted) = match raw.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let opaque = quoted.strip_prefix('"')?.strip_suffix('"')?;
        if opaque.contains('"') {
            return None;
        }
        Some(Self {
            weak,
            opaque: opaque.to_string(),
        })
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }

    pub fn opaque(&self) -> &str {
        &self.opaque
    }

    /// Weak comparison: opaque values equal, weakness ignored
    pub fn weak_eq(&self, other: &EntityTag) -> bool {
        self.opaque == other.opaque
    }

    /// Strong comparison: both strong and opaque values equal
    pub fn strong_eq(&self, other: &EntityTag) -> bool {
        !self.weak && !other.weak && self.opaque == other.opaque
    }

    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.to_string()).ok()
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            write!(f, "W/\"{}\"", self.opaque)
        } else {
            write!(f, "\"{}\"", self.opaque)
        }
    }
}

/// A resource that can produce its own entity tag
///
/// The default implementation hashes the serialized form; override it for
/// resources that carry a cheaper version marker (a row version, an
/// `updated_at` stamp).
pub trait Etaggable: Serialize {
    fn entity_tag(&self) -> Result<EntityTag, serde_json::Error> {
        compute_tag(self)
    }
}

/// Compute the strong tag of a serializable resource
///
/// The opaque value is the 64-bit xxh3 digest rendered as 16 lowercase hex
/// digits.
pub fn compute_tag<T: Serialize + ?Sized>(resource: &T) -> Result<EntityTag, serde_json::Error> {
    let value = {
        let _scope = CanonicalScope::enter();
        serde_json::to_value(resource)?
    };
    let mut hasher = Xxh3::new();
    feed_value(&mut hasher, &value);
    Ok(EntityTag::strong(format!("{:016x}", hasher.digest())))
}

thread_local! {
    static CANONICAL: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as building a tag's canonical form
struct CanonicalScope {
    previous: bool,
}

impl CanonicalScope {
    fn enter() -> Self {
        Self {
            previous: CANONICAL.replace(true),
        }
    }
}

impl Drop for CanonicalScope {
    fn drop(&mut self) {
        CANONICAL.set(self.previous);
    }
}

/// Whether serialization on this thread feeds an entity tag
pub(crate) fn in_canonical_form() -> bool {
    CANONICAL.get()
}

fn feed_value(h: &mut Xxh3, value: &Value) {
    match value {
        Value::Null => h.update(b"n"),
        Value::Bool(b) => h.update(if *b { b"t" } else { b"f" }),
        Value::Number(n) => {
            h.update(b"#");
            feed_str(h, &n.to_string());
        }
        Value::String(s) => {
            h.update(b"s");
            feed_str(h, s);
        }
        Value::Array(items) => {
            h.update(b"[");
            h.update(&(items.len() as u64).to_le_bytes());
            for item in items {
                feed_value(h, item);
            }
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            h.update(b"{");
            h.update(&(keys.len() as u64).to_le_bytes());
            for key in keys {
                feed_str(h, key);
                if let Some(v) = map.get(key) {
                    feed_value(h, v);
                }
            }
        }
    }
}

fn feed_str(h: &mut Xxh3, s: &str) {
    h.update(&(s.len() as u64).to_le_bytes());
    h.update(s.as_bytes());
}

/// Parsed `If-None-Match` request header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfNoneMatch {
    /// `*`: matches any current representation
    Any,
    Tags(Vec<EntityTag>),
}

impl IfNoneMatch {
    /// Parse one header value
    ///
    /// Entries that are not valid entity tags are skipped; they can never
    /// match.
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "*" {
            return IfNoneMatch::Any;
        }
        IfNoneMatch::Tags(split_tags(raw).filter_map(EntityTag::parse).collect())
    }

    /// Collect every `If-None-Match` header of a request
    ///
    /// Returns `None` when the header is absent or not valid text.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let mut tags = Vec::new();
        let mut seen = false;
        for value in headers.get_all(header::IF_NONE_MATCH) {
            let Ok(text) = value.to_str() else {
                continue;
            };
            seen = true;
            match Self::parse(text) {
                IfNoneMatch::Any => return Some(IfNoneMatch::Any),
                IfNoneMatch::Tags(parsed) => tags.extend(parsed),
            }
        }
        seen.then_some(IfNoneMatch::Tags(tags))
    }

    /// Whether the current tag matches, using weak comparison
    pub fn matches(&self, current: &EntityTag) -> bool {
        match self {
            IfNoneMatch::Any => true,
            IfNoneMatch::Tags(tags) => tags.iter().any(|tag| tag.weak_eq(current)),
        }
    }
}

/// Split a comma separated tag list, keeping commas inside quotes
fn split_tags(raw: &str) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in raw.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty())
}

/// Outcome of a conditional read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The client's copy is current; answer 304 with no body
    NotModified(EntityTag),
    /// Send the full representation with this tag
    Modified(EntityTag),
}

impl Freshness {
    pub fn tag(&self) -> &EntityTag {
        match self {
            Freshness::NotModified(tag) | Freshness::Modified(tag) => tag,
        }
    }

    pub fn is_not_modified(&self) -> bool {
        matches!(self, Freshness::NotModified(_))
    }
}

/// Compare a request's validators with the resource's current tag
pub fn evaluate(validators: Option<&IfNoneMatch>, current: EntityTag) -> Freshness {
    match validators {
        Some(validators) if validators.matches(&current) => {
            tracing::debug!(etag = %current, "conditional request not modified");
            Freshness::NotModified(current)
        }
        _ => Freshness::Modified(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tag_is_quoted_hex() {
        let tag = compute_tag(&json!({"name": "earth"})).unwrap();
        let rendered = tag.to_string();
        assert!(!tag.is_weak());
        assert_eq!(rendered.len(), 18);
        assert!(rendered.starts_with('"') && rendered.ends_with('"'));
        assert!(tag.opaque().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_tag_ignores_key_order() {
        let a = compute_tag(&json!({"a": 1, "b": {"x": true, "y": null}})).unwrap();
        let b = compute_tag(&json!({"b": {"y": null, "x": true}, "a": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tag_changes_with_content() {
        let a = compute_tag(&json!({"name": "earth"})).unwrap();
        let b = compute_tag(&json!({"name": "mars"})).unwrap();
        let c = compute_tag(&json!({"name": ["earth"]})).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_parse_entity_tags() {
        assert_eq!(EntityTag::parse("\"abc\""), Some(EntityTag::strong("abc")));
        assert_eq!(EntityTag::parse(" W/\"abc\" "), Some(EntityTag::weak("abc")));
        assert_eq!(EntityTag::parse("abc"), None);
        assert_eq!(EntityTag::parse("\"a\"b\""), None);
    }

    #[test]
    fn test_weak_and_strong_comparison() {
        let strong = EntityTag::strong("1");
        let weak = EntityTag::weak("1");
        assert!(strong.weak_eq(&weak));
        assert!(!strong.strong_eq(&weak));
        assert!(strong.strong_eq(&EntityTag::strong("1")));
    }

    #[test]
    fn test_if_none_match_list() {
        let header = IfNoneMatch::parse("\"a\", W/\"b\" , junk, \"c,d\"");
        assert_eq!(
            header,
            IfNoneMatch::Tags(vec![
                EntityTag::strong("a"),
                EntityTag::weak("b"),
                EntityTag::strong("c,d"),
            ])
        );
        assert!(header.matches(&EntityTag::strong("b")));
        assert!(header.matches(&EntityTag::strong("c,d")));
        assert!(!header.matches(&EntityTag::strong("z")));
    }

    #[test]
    fn test_wildcard_matches_anything() {
        assert!(IfNoneMatch::parse(" * ").matches(&EntityTag::strong("x")));
    }

    #[test]
    fn test_from_headers_merges_values() {
        let mut headers = HeaderMap::new();
        assert_eq!(IfNoneMatch::from_headers(&headers), None);

        headers.append(header::IF_NONE_MATCH, HeaderValue::from_static("\"a\""));
        headers.append(header::IF_NONE_MATCH, HeaderValue::from_static("\"b\""));
        assert_eq!(
            IfNoneMatch::from_headers(&headers),
            Some(IfNoneMatch::Tags(vec![
                EntityTag::strong("a"),
                EntityTag::strong("b")
            ]))
        );
    }

    #[test]
    fn test_evaluate() {
        let current = EntityTag::strong("v1");
        let stale = IfNoneMatch::parse("\"v0\"");
        let fresh = IfNoneMatch::parse("W/\"v1\"");

        assert_eq!(evaluate(None, current.clone()), Freshness::Modified(current.clone()));
        assert_eq!(
            evaluate(Some(&stale), current.clone()),
            Freshness::Modified(current.clone())
        );
        assert!(evaluate(Some(&fresh), current).is_not_modified());
    }
}
