//! Simplified method-body syntax.
//!
//! Bodies are expression trees reduced to the shapes the analyzers care
//! about: calls, property accesses, object creations, throws, and lambdas.
//! Callee symbols are not stored inline; each call-like expression carries
//! a [`NodeId`](super::NodeId) that the per-source semantic model resolves
//! to a symbol, mirroring how the front end separates syntax from binding.

use serde::{Deserialize, Serialize};

use super::{NodeId, TypeId};

/// A method or accessor body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub exprs: Vec<Expr>,
}

impl Body {
    pub fn new(exprs: Vec<Expr>) -> Self {
        Self { exprs }
    }
}

/// One expression in a simplified body tree.
///
/// `children` holds nested expressions (arguments, receivers, branch
/// bodies) in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Expr {
    /// A method invocation; the node binds to the callee method.
    Invocation {
        node: NodeId,
        #[serde(default)]
        children: Vec<Expr>,
    },
    /// A property read; the node binds to the property.
    PropertyGet {
        node: NodeId,
        #[serde(default)]
        children: Vec<Expr>,
    },
    /// A property assignment; the node binds to the property.
    PropertySet {
        node: NodeId,
        #[serde(default)]
        children: Vec<Expr>,
    },
    /// A constructor call; the node binds to the constructor method.
    ObjectCreation {
        node: NodeId,
        #[serde(default)]
        children: Vec<Expr>,
    },
    /// A `?.` chain; the node binds to the accessed member.
    ConditionalAccess {
        node: NodeId,
        #[serde(default)]
        children: Vec<Expr>,
    },
    /// A `throw` of the given exception type.
    Throw {
        node: NodeId,
        exception: TypeId,
        #[serde(default)]
        children: Vec<Expr>,
    },
    /// A lambda or anonymous method. Deep walkers treat these as opaque.
    Lambda {
        #[serde(default)]
        body: Vec<Expr>,
    },
    /// A plain statement block.
    Block {
        #[serde(default)]
        children: Vec<Expr>,
    },
}

impl Expr {
    pub fn invocation(node: NodeId) -> Self {
        Expr::Invocation {
            node,
            children: Vec::new(),
        }
    }

    pub fn property_get(node: NodeId) -> Self {
        Expr::PropertyGet {
            node,
            children: Vec::new(),
        }
    }

    pub fn property_set(node: NodeId) -> Self {
        Expr::PropertySet {
            node,
            children: Vec::new(),
        }
    }

    pub fn object_creation(node: NodeId) -> Self {
        Expr::ObjectCreation {
            node,
            children: Vec::new(),
        }
    }

    pub fn throw(node: NodeId, exception: TypeId) -> Self {
        Expr::Throw {
            node,
            exception,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, nested: Vec<Expr>) -> Self {
        match &mut self {
            Expr::Invocation { children, .. }
            | Expr::PropertyGet { children, .. }
            | Expr::PropertySet { children, .. }
            | Expr::ObjectCreation { children, .. }
            | Expr::ConditionalAccess { children, .. }
            | Expr::Throw { children, .. }
            | Expr::Block { children } => children.extend(nested),
            Expr::Lambda { body } => body.extend(nested),
        }
        self
    }
}
