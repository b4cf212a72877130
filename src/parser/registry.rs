//! # Acid Parser: Consumer Registry
//!
//! Maps each [`NodeType`] to the ordered list of consumers (one per grammar
//! production) that can build it. The table is built explicitly, once, by
//! [`build_default_registry`] and is read-only afterwards.
//!
//! Registry Invariant: consumers for a node type are tried by ascending
//! priority; consumers with equal priority keep their registration order.
//! Some productions share a prefix with a more general one (`(lambda ...)`
//! vs. a generic call), so this ordering decides which parse wins.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::ast::{Node, NodeType};
use crate::errors::ParseError;
use crate::parser::{rules, Parser};

/// A consumer implements exactly one production. It may advance the parser
/// and call back into [`Parser::consume`]; on failure the dispatcher rewinds
/// whatever it consumed.
pub type ConsumerFn = fn(&mut Parser<'_>) -> Result<Node, ParseError>;

/// One registered production.
#[derive(Clone, Copy)]
pub struct Consumer {
    pub node_type: NodeType,
    pub priority: u32,
    pub func: ConsumerFn,
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("node_type", &self.node_type)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("priority must be at least 1, got {priority} for {node_type}")]
    InvalidPriority { node_type: NodeType, priority: u32 },
}

/// Registry for all grammar productions, inspectable at runtime.
#[derive(Debug, Default)]
pub struct ConsumerRegistry {
    consumers: HashMap<NodeType, Vec<Consumer>>,
}

impl ConsumerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `func` to the productions of `node_type`.
    pub fn register(
        &mut self,
        node_type: NodeType,
        func: ConsumerFn,
        priority: u32,
    ) -> Result<(), RegistryError> {
        if priority == 0 {
            return Err(RegistryError::InvalidPriority {
                node_type,
                priority,
            });
        }
        tracing::trace!(%node_type, priority, "registering consumer");
        self.consumers.entry(node_type).or_default().push(Consumer {
            node_type,
            priority,
            func,
        });
        Ok(())
    }

    /// Consumers registered directly for `node_type`, in registration order.
    pub fn get(&self, node_type: NodeType) -> &[Consumer] {
        self.consumers
            .get(&node_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every consumer able to produce `node_type`: its own, then those of
    /// each subtype, stably sorted by priority.
    pub fn candidates(&self, node_type: NodeType) -> Vec<Consumer> {
        let mut candidates = self.get(node_type).to_vec();
        for &subtype in node_type.subtypes() {
            candidates.extend_from_slice(self.get(subtype));
        }
        // `sort_by_key` is stable, which the tie-breaking rule relies on.
        candidates.sort_by_key(|consumer| consumer.priority);
        candidates
    }

    /// Node types with at least one registered consumer.
    pub fn node_types(&self) -> Vec<NodeType> {
        let mut types: Vec<_> = self.consumers.keys().copied().collect();
        types.sort_by_key(|node_type| node_type.name());
        types
    }

    /// Total number of registered productions.
    pub fn len(&self) -> usize {
        self.consumers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static DEFAULT_REGISTRY: Lazy<ConsumerRegistry> = Lazy::new(build_default_registry);

/// Builds and returns a registry populated with the standard acid grammar.
///
/// # Example
/// ```
/// use acid::parser::registry::build_default_registry;
/// let registry = build_default_registry();
/// assert!(!registry.is_empty());
/// ```
pub fn build_default_registry() -> ConsumerRegistry {
    let mut registry = ConsumerRegistry::new();
    rules::register_std_rules(&mut registry);
    tracing::debug!(productions = registry.len(), "built default registry");
    registry
}

/// The process-wide registry, built on first use.
pub fn default_registry() -> &'static ConsumerRegistry {
    &DEFAULT_REGISTRY
}
