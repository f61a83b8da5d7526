//! Compilation snapshot - the boundary with the external compiler front end.
//!
//! The analyzer never parses source text itself. A front end exports one
//! [`Compilation`] per analysis pass: an arena of type, method, and
//! property symbols, a pool of syntax nodes with source positions, and
//! per-node symbol bindings. The core borrows the snapshot read-only for
//! the duration of the pass and derives all higher-level models from it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌────────────────┐
//! │ Front end    │────▶│ Compilation   │────▶│ Semantic models│
//! │ (external)   │     │ (symbol arena,│     │ (entities,     │
//! └──────────────┘     │  nodes, bodies│     │  graphs, rules)│
//!                      └───────────────┘     └────────────────┘
//! ```
//!
//! Symbols are referenced by index newtypes ([`TypeId`], [`MethodId`],
//! [`PropertyId`]); the snapshot is serde-serializable so a front end can
//! hand it over as JSON.

mod builder;
mod syntax;

pub use builder::CompilationBuilder;
pub use syntax::{Body, Expr};

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::diagnostics::Location;

/// Index of a type symbol in the compilation arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TypeId(pub u32);

/// Index of a method symbol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MethodId(pub u32);

/// Index of a property symbol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PropertyId(pub u32);

/// Index of a source unit (one file of the analyzed project).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SourceId(pub u32);

/// Index of a syntax node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// A reference to any symbol kind, as stored in node bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolRef {
    Type(TypeId),
    Method(MethodId),
    Property(PropertyId),
}

/// An applied (possibly generic) type: `RecordExtension<Ext1, Order>` is
/// the `RecordExtension` definition plus two argument types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub definition: TypeId,
    #[serde(default)]
    pub args: Vec<TypeId>,
}

impl TypeRef {
    pub fn new(definition: TypeId) -> Self {
        Self {
            definition,
            args: Vec::new(),
        }
    }

    pub fn generic(definition: TypeId, args: Vec<TypeId>) -> Self {
        Self { definition, args }
    }
}

/// A constant argument value in an attribute application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl ArgValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// One attribute usage on a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeApplication {
    pub attribute: TypeId,
    #[serde(default)]
    pub named_args: BTreeMap<String, ArgValue>,
    /// Syntax node of the application, when the declaration has source.
    #[serde(default)]
    pub node: Option<NodeId>,
}

impl AttributeApplication {
    pub fn new(attribute: TypeId) -> Self {
        Self {
            attribute,
            named_args: BTreeMap::new(),
            node: None,
        }
    }
}

/// Kind of a type symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
}

/// A type symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeData {
    /// Simple name, e.g. `Order`.
    pub name: String,
    /// Namespace-qualified name, e.g. `MyApp.Objects.Order`. Nested types
    /// use `+`, e.g. `MyApp.Objects.Order+status`.
    pub full_name: String,
    pub kind: TypeKind,
    pub is_public: bool,
    pub is_static: bool,
    /// Base type with applied generic arguments; `None` for roots.
    pub base: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeId>,
    #[serde(default)]
    pub containing_type: Option<TypeId>,
    #[serde(default)]
    pub nested_types: Vec<TypeId>,
    #[serde(default)]
    pub methods: Vec<MethodId>,
    #[serde(default)]
    pub properties: Vec<PropertyId>,
    #[serde(default)]
    pub attributes: Vec<AttributeApplication>,
    /// Documentation summary, when the declaration carries one.
    #[serde(default)]
    pub doc_summary: Option<String>,
    /// Declaration node; `None` means the symbol comes from a referenced
    /// assembly and has no source in this compilation.
    #[serde(default)]
    pub declared_at: Option<NodeId>,
}

impl TypeData {
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn in_source(&self) -> bool {
        self.declared_at.is_some()
    }
}

/// A method symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodData {
    pub name: String,
    pub containing_type: TypeId,
    #[serde(default)]
    pub params: Vec<TypeRef>,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    pub is_public: bool,
    pub is_static: bool,
    #[serde(default)]
    pub doc_summary: Option<String>,
    #[serde(default)]
    pub declared_at: Option<NodeId>,
    /// Simplified body expression tree; `None` when no source is
    /// available for the method.
    #[serde(default)]
    pub body: Option<Body>,
}

/// A property symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyData {
    pub name: String,
    pub containing_type: TypeId,
    pub ty: TypeRef,
    pub is_public: bool,
    #[serde(default)]
    pub getter: Option<MethodId>,
    #[serde(default)]
    pub setter: Option<MethodId>,
    #[serde(default)]
    pub attributes: Vec<AttributeApplication>,
    #[serde(default)]
    pub doc_summary: Option<String>,
    #[serde(default)]
    pub declared_at: Option<NodeId>,
}

/// One file of the analyzed project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Project-relative path, used in diagnostic locations.
    pub name: String,
}

/// A syntax node: a source position plus an optional symbol binding and
/// suppression annotations contributed by the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub source: SourceId,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column.
    pub column: u32,
    /// The symbol this node resolves to, when the front end bound it.
    #[serde(default)]
    pub binding: Option<SymbolRef>,
    /// Rule ids suppressed at this node (front-end-parsed annotations).
    #[serde(default)]
    pub suppressed_rules: Vec<String>,
}

/// Node-to-symbol bindings for one source unit.
///
/// Built on demand by [`Compilation::semantic_model`]; construction walks
/// the node pool, so callers that resolve many nodes from the same source
/// should memoize the model rather than re-request it per node.
#[derive(Debug, Clone)]
pub struct SemanticModel {
    bindings: HashMap<NodeId, SymbolRef>,
}

impl SemanticModel {
    pub fn resolve(&self, node: NodeId) -> Option<SymbolRef> {
        self.bindings.get(&node).copied()
    }

    pub fn resolve_method(&self, node: NodeId) -> Option<MethodId> {
        match self.resolve(node) {
            Some(SymbolRef::Method(m)) => Some(m),
            _ => None,
        }
    }

    pub fn resolve_property(&self, node: NodeId) -> Option<PropertyId> {
        match self.resolve(node) {
            Some(SymbolRef::Property(p)) => Some(p),
            _ => None,
        }
    }
}

/// An immutable symbol-graph snapshot of one compilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Compilation {
    pub assembly_name: String,
    /// Test assemblies are not analyzed.
    #[serde(default)]
    pub is_test_assembly: bool,
    #[serde(default)]
    pub sources: Vec<SourceUnit>,
    #[serde(default)]
    pub nodes: Vec<NodeData>,
    #[serde(default)]
    pub types: Vec<TypeData>,
    #[serde(default)]
    pub methods: Vec<MethodData>,
    #[serde(default)]
    pub properties: Vec<PropertyData>,
    /// Full-name lookup; rebuilt after deserialization.
    #[serde(skip)]
    type_index: HashMap<String, TypeId>,
}

impl Compilation {
    /// Load a snapshot from its JSON form and rebuild derived indexes.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let mut compilation: Compilation = serde_json::from_str(json)?;
        compilation.reindex();
        Ok(compilation)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub(crate) fn reindex(&mut self) {
        self.type_index = self
            .types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.full_name.clone(), TypeId(i as u32)))
            .collect();
    }

    pub fn type_data(&self, id: TypeId) -> &TypeData {
        &self.types[id.0 as usize]
    }

    pub fn method(&self, id: MethodId) -> &MethodData {
        &self.methods[id.0 as usize]
    }

    pub fn property(&self, id: PropertyId) -> &PropertyData {
        &self.properties[id.0 as usize]
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }

    pub fn source(&self, id: SourceId) -> &SourceUnit {
        &self.sources[id.0 as usize]
    }

    /// Iterate all types with their ids.
    pub fn all_types(&self) -> impl Iterator<Item = (TypeId, &TypeData)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId(i as u32), t))
    }

    /// Look a type up by its namespace-qualified name.
    pub fn type_by_full_name(&self, full_name: &str) -> Option<TypeId> {
        self.type_index.get(full_name).copied()
    }

    /// Build the node-to-symbol binding model for one source unit.
    pub fn semantic_model(&self, source: SourceId) -> SemanticModel {
        let bindings = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.source == source)
            .filter_map(|(i, n)| n.binding.map(|b| (NodeId(i as u32), b)))
            .collect();

        SemanticModel { bindings }
    }

    /// Diagnostic location for a node.
    pub fn location_of(&self, node: NodeId) -> Location {
        let data = self.node(node);
        Location {
            file: self.source(data.source).name.clone(),
            line: data.line,
            column: data.column,
        }
    }

    /// Whether a rule is suppressed at the given node.
    pub fn is_suppressed_at(&self, node: NodeId, rule: &str) -> bool {
        self.node(node)
            .suppressed_rules
            .iter()
            .any(|r| r == rule || r == "*")
    }
}
