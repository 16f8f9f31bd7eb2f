//! Compiled routing tree.
//!
//! # Responsibilities
//! - Group registered routes by segment shape, depth by depth
//! - Detect duplicate (method, template) registrations
//! - Walk the tree depth-first to resolve a method + path
//!
//! # Design Decisions
//! - Built once by `compile`, read-only afterwards (shared without locks)
//! - Siblings are sorted by descending precedence with a stable sort, so
//!   equal precedence keeps registration order
//! - A miss is `None`, never an error

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::routing::error::RouteError;
use crate::routing::matcher::{self, SegmentMatcher};
use crate::routing::template::{RouteTemplate, SegmentShape};

/// Anything that can be placed in the routing tree.
pub trait RouteEntry: Send + Sync {
    fn method(&self) -> &Method;

    fn template(&self) -> &RouteTemplate;
}

/// A tree node: one matcher, the routes ending here, and child nodes.
pub struct RoutingNode<E> {
    matcher: Box<dyn SegmentMatcher>,
    routes: HashMap<Method, Arc<E>>,
    children: Vec<RoutingNode<E>>,
}

impl<E: RouteEntry> RoutingNode<E> {
    fn new(matcher: Box<dyn SegmentMatcher>) -> Self {
        Self {
            matcher,
            routes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn matcher(&self) -> &dyn SegmentMatcher {
        self.matcher.as_ref()
    }

    pub fn children(&self) -> &[RoutingNode<E>] {
        &self.children
    }

    pub fn route(&self, method: &Method) -> Option<&Arc<E>> {
        self.routes.get(method)
    }

    fn attach(&mut self, entry: Arc<E>) -> Result<(), RouteError> {
        if self.routes.contains_key(entry.method()) {
            return Err(RouteError::AlreadyRegistered {
                method: entry.method().to_string(),
                template: entry.template().to_string(),
            });
        }
        self.routes.insert(entry.method().clone(), entry);
        Ok(())
    }

    fn find(&self, method: &Method, segments: &[&str], depth: usize) -> Option<&Arc<E>> {
        if !self.matcher.matches(segments[depth]) {
            return None;
        }
        if depth + 1 == segments.len() {
            return self.routes.get(method);
        }
        self.children
            .iter()
            .find_map(|child| child.find(method, segments, depth + 1))
    }
}

impl<E> fmt::Debug for RoutingNode<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingNode")
            .field("matcher", &self.matcher)
            .field("methods", &self.routes.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .finish()
    }
}

/// Prefix tree of segment matchers.
pub struct RoutingTree<E> {
    nodes: Vec<RoutingNode<E>>,
}

impl<E: RouteEntry> RoutingTree<E> {
    /// Tree with no routes; every lookup misses.
    pub fn empty() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Build the tree from every registered route.
    pub fn compile(entries: Vec<Arc<E>>) -> Result<Self, RouteError> {
        Ok(Self {
            nodes: build_level(entries, 0)?,
        })
    }

    /// Top-level nodes (first path segment).
    pub fn nodes(&self) -> &[RoutingNode<E>] {
        &self.nodes
    }

    /// Resolve already-split path segments.
    pub fn find(&self, method: &Method, segments: &[&str]) -> Option<&Arc<E>> {
        if segments.is_empty() {
            return None;
        }
        self.nodes
            .iter()
            .find_map(|node| node.find(method, segments, 0))
    }
}

impl<E> fmt::Debug for RoutingTree<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTree").field("nodes", &self.nodes).finish()
    }
}

fn build_level<E: RouteEntry>(
    entries: Vec<Arc<E>>,
    depth: usize,
) -> Result<Vec<RoutingNode<E>>, RouteError> {
    let mut index: HashMap<SegmentShape, usize> = HashMap::new();
    let mut groups: Vec<Vec<Arc<E>>> = Vec::new();

    for entry in entries {
        let Some(segment) = entry.template().segments().get(depth) else {
            continue;
        };
        let slot = *index.entry(segment.shape()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(entry);
    }

    let mut nodes = Vec::with_capacity(groups.len());
    for group in groups {
        let representative = &group[0].template().segments()[depth];
        let mut node = RoutingNode::new(matcher::compile(representative));

        let mut deeper = Vec::new();
        for entry in group {
            if entry.template().len() == depth + 1 {
                node.attach(entry)?;
            } else {
                deeper.push(entry);
            }
        }
        node.children = build_level(deeper, depth + 1)?;
        nodes.push(node);
    }

    nodes.sort_by(|a, b| b.matcher.precedence().cmp(&a.matcher.precedence()));
    Ok(nodes)
}
