//! Link resolution over whole resource graphs
//!
//! Every response type implements [`Hypermedia`] to expose its links and
//! nested resources. [`LinkResolver::resolve`] walks the graph, binds each
//! link to an href and hands back a [`Resolved`] wrapper, the only form the
//! response writer accepts.
//!
//! Owned trees cannot be cyclic, so cycle detection is limited to shared
//! nodes (`Arc<Mutex<_>>`), tracked by allocation address along the current
//! path. A shared node reachable twice without a cycle is walked once.

use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use url::{Position, Url};

use crate::core::error::ResolutionError;
use crate::links::link::Link;
use crate::links::routes::RouteTable;

/// A resource whose links can be resolved
///
/// Implement by visiting every field that is a [`Link`] or itself
/// `Hypermedia`, usually through [`impl_hypermedia!`](crate::impl_hypermedia).
pub trait Hypermedia {
    fn visit_links(&mut self, walker: &mut LinkWalker<'_>) -> Result<(), ResolutionError>;
}

/// Traversal state of one resolution pass
pub struct LinkWalker<'a> {
    resolver: &'a LinkResolver,
    path: Vec<usize>,
    finished: HashSet<usize>,
    resolved: usize,
}

impl<'a> LinkWalker<'a> {
    fn new(resolver: &'a LinkResolver) -> Self {
        Self {
            resolver,
            path: Vec::new(),
            finished: HashSet::new(),
            resolved: 0,
        }
    }

    /// Resolve one link in place
    pub fn link(&mut self, link: &mut Link) -> Result<(), ResolutionError> {
        self.resolver.resolve_link(link)?;
        self.resolved += 1;
        Ok(())
    }

    /// Descend into a nested resource
    pub fn visit<H: Hypermedia + ?Sized>(&mut self, node: &mut H) -> Result<(), ResolutionError> {
        node.visit_links(self)
    }

    /// Descend into a shared node, failing on cycles
    pub fn shared<H: Hypermedia>(&mut self, node: &Arc<Mutex<H>>) -> Result<(), ResolutionError> {
        let id = Arc::as_ptr(node) as *const () as usize;
        if self.path.contains(&id) {
            return Err(ResolutionError::CyclicGraph {
                depth: self.path.len(),
            });
        }
        if self.finished.contains(&id) {
            return Ok(());
        }

        self.path.push(id);
        let result = match node.lock() {
            Ok(mut guard) => guard.visit_links(self),
            Err(_) => Err(ResolutionError::PoisonedNode),
        };
        self.path.pop();

        if result.is_ok() {
            self.finished.insert(id);
        }
        result
    }

    /// Number of links resolved so far
    pub fn resolved(&self) -> usize {
        self.resolved
    }
}

impl Hypermedia for Link {
    fn visit_links(&mut self, walker: &mut LinkWalker<'_>) -> Result<(), ResolutionError> {
        walker.link(self)
    }
}

impl<H: Hypermedia> Hypermedia for Option<H> {
    fn visit_links(&mut self, walker: &mut LinkWalker<'_>) -> Result<(), ResolutionError> {
        match self {
            Some(inner) => walker.visit(inner),
            None => Ok(()),
        }
    }
}

impl<H: Hypermedia> Hypermedia for Vec<H> {
    fn visit_links(&mut self, walker: &mut LinkWalker<'_>) -> Result<(), ResolutionError> {
        self.iter_mut().try_for_each(|item| walker.visit(item))
    }
}

impl<H: Hypermedia + ?Sized> Hypermedia for Box<H> {
    fn visit_links(&mut self, walker: &mut LinkWalker<'_>) -> Result<(), ResolutionError> {
        walker.visit(self.as_mut())
    }
}

impl<H: Hypermedia> Hypermedia for Arc<Mutex<H>> {
    fn visit_links(&mut self, walker: &mut LinkWalker<'_>) -> Result<(), ResolutionError> {
        walker.shared(self)
    }
}

/// A resource whose links are all bound
///
/// Serializes exactly like the wrapped value.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    inner: T,
    links: usize,
}

impl<T> Resolved<T> {
    pub fn get(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    /// How many links were bound
    pub fn links_resolved(&self) -> usize {
        self.links
    }
}

impl<T: Serialize> Serialize for Resolved<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

const RELATIVE_BASE: &str = "http://localhost/";

/// Turns links into hrefs using a [`RouteTable`]
///
/// Without a base URL hrefs are root-relative (`/api/worlds/5`); with one
/// they are absolute and carry the base path as a prefix.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    routes: Arc<RouteTable>,
    base: Url,
    absolute: bool,
}

impl LinkResolver {
    /// Resolver producing root-relative hrefs
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self {
            routes,
            base: Url::parse(RELATIVE_BASE).expect("relative base is a valid URL"),
            absolute: false,
        }
    }

    /// Resolver producing absolute hrefs under `base_url`
    pub fn with_base_url(routes: Arc<RouteTable>, base_url: &str) -> Result<Self, ResolutionError> {
        let base = Url::parse(base_url).map_err(|e| ResolutionError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ResolutionError::InvalidBaseUrl {
                url: base_url.to_string(),
                message: "expected an http or https URL".to_string(),
            });
        }
        Ok(Self {
            routes,
            base,
            absolute: true,
        })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.absolute.then_some(&self.base)
    }

    /// Href of an endpoint with the given parameters
    pub fn href_for(
        &self,
        endpoint: &str,
        params: &indexmap::IndexMap<String, String>,
    ) -> Result<String, ResolutionError> {
        let template = self.routes.get(endpoint)?;
        let url = template.expand(endpoint, params, &self.base)?;
        if self.absolute {
            Ok(url.to_string())
        } else {
            Ok(url[Position::BeforePath..].to_string())
        }
    }

    /// Bind a single link
    pub fn resolve_link(&self, link: &mut Link) -> Result<(), ResolutionError> {
        let Some(params) = link.params() else {
            return Err(ResolutionError::AlreadyResolved {
                href: link.href().unwrap_or_default().to_string(),
            });
        };
        let href = self.href_for(link.endpoint(), params)?;
        link.bind(href)
    }

    /// Resolve every link of a resource graph
    ///
    /// Fails on the first unknown endpoint, missing parameter, already bound
    /// link or cycle.
    pub fn resolve<T: Hypermedia>(&self, mut resource: T) -> Result<Resolved<T>, ResolutionError> {
        let mut walker = LinkWalker::new(self);
        if let Err(err) = resource.visit_links(&mut walker) {
            tracing::error!(code = err.error_code(), error = %err, "link resolution failed");
            return Err(err);
        }
        let links = walker.resolved();
        tracing::debug!(links, "resolved resource links");
        Ok(Resolved {
            inner: resource,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Node {
        link: Link,
        children: Vec<Arc<Mutex<Node>>>,
    }

    impl Hypermedia for Node {
        fn visit_links(&mut self, walker: &mut LinkWalker<'_>) -> Result<(), ResolutionError> {
            walker.visit(&mut self.link)?;
            walker.visit(&mut self.children)
        }
    }

    fn routes() -> Arc<RouteTable> {
        Arc::new(
            RouteTable::new()
                .route("GetThing", "/things/{id}")
                .unwrap()
                .route("GetThings", "/things")
                .unwrap(),
        )
    }

    fn node(id: u32) -> Arc<Mutex<Node>> {
        Arc::new(Mutex::new(Node {
            link: Link::to("GetThing").with_param("id", id),
            children: Vec::new(),
        }))
    }

    #[test]
    fn test_relative_href() {
        let resolver = LinkResolver::new(routes());
        let resolved = resolver.resolve(Link::to("GetThing").with_param("id", 5)).unwrap();
        assert_eq!(resolved.get().href(), Some("/things/5"));
        assert_eq!(resolved.links_resolved(), 1);
    }

    #[test]
    fn test_absolute_href() {
        let resolver = LinkResolver::with_base_url(routes(), "https://api.example.com").unwrap();
        let resolved = resolver
            .resolve(Link::to_collection("GetThings").with_param("offset", 25))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({ "href": "https://api.example.com/things?offset=25", "rel": ["collection"] })
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(LinkResolver::with_base_url(routes(), "not a url").is_err());
        assert!(LinkResolver::with_base_url(routes(), "mailto:a@b.c").is_err());
    }

    #[test]
    fn test_unknown_endpoint_fails_whole_resolution() {
        let resolver = LinkResolver::new(routes());
        let links = vec![Link::to("GetThings"), Link::to("Missing")];
        assert_eq!(
            resolver.resolve(links).unwrap_err(),
            ResolutionError::UnknownEndpoint {
                endpoint: "Missing".to_string()
            }
        );
    }

    #[test]
    fn test_resolving_twice_fails() {
        let resolver = LinkResolver::new(routes());
        let once = resolver.resolve(Link::to("GetThings")).unwrap().into_inner();
        assert!(matches!(
            resolver.resolve(once),
            Err(ResolutionError::AlreadyResolved { .. })
        ));
    }

    #[test]
    fn test_shared_node_reached_twice_is_not_a_cycle() {
        let resolver = LinkResolver::new(routes());
        let shared = node(2);
        let root = node(1);
        if let Ok(mut guard) = root.lock() {
            guard.children = vec![shared.clone(), shared.clone()];
        }

        let resolved = resolver.resolve(vec![root, shared.clone()]).unwrap();
        assert_eq!(resolved.links_resolved(), 2);
        assert_eq!(shared.lock().unwrap().link.href(), Some("/things/2"));
    }

    #[test]
    fn test_cycle_is_detected() {
        let resolver = LinkResolver::new(routes());
        let a = node(1);
        let b = node(2);
        a.lock().unwrap().children.push(b.clone());
        b.lock().unwrap().children.push(a.clone());

        let result = resolver.resolve(a.clone());
        assert_eq!(result.unwrap_err(), ResolutionError::CyclicGraph { depth: 2 });

        // Break the cycle so the nodes can be freed.
        b.lock().unwrap().children.clear();
    }
}
