//! Programmatic construction of compilation snapshots.
//!
//! Front ends assemble a [`Compilation`] through this builder; tests use
//! it to declare small synthetic projects without a JSON fixture.

use super::{
    AttributeApplication, Body, Compilation, MethodData, MethodId, NodeData, NodeId, PropertyData,
    PropertyId, SourceId, SourceUnit, SymbolRef, TypeData, TypeId, TypeKind, TypeRef,
};

/// Builder for a [`Compilation`].
///
/// Declarations default to public, non-static, metadata-only (no source).
/// Mutators take the id returned by the corresponding `declare_*` call.
#[derive(Debug, Default)]
pub struct CompilationBuilder {
    compilation: Compilation,
}

impl CompilationBuilder {
    pub fn new(assembly_name: &str) -> Self {
        Self {
            compilation: Compilation {
                assembly_name: assembly_name.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn set_test_assembly(&mut self, is_test: bool) {
        self.compilation.is_test_assembly = is_test;
    }

    pub fn add_source(&mut self, name: &str) -> SourceId {
        self.compilation.sources.push(SourceUnit {
            name: name.to_string(),
        });
        SourceId(self.compilation.sources.len() as u32 - 1)
    }

    pub fn add_node(&mut self, source: SourceId, line: u32, column: u32) -> NodeId {
        self.compilation.nodes.push(NodeData {
            source,
            line,
            column,
            binding: None,
            suppressed_rules: Vec::new(),
        });
        NodeId(self.compilation.nodes.len() as u32 - 1)
    }

    /// Record the symbol a node resolves to.
    pub fn bind(&mut self, node: NodeId, symbol: SymbolRef) {
        self.compilation.nodes[node.0 as usize].binding = Some(symbol);
    }

    /// Add a suppression annotation for a rule id at a node.
    pub fn suppress(&mut self, node: NodeId, rule: &str) {
        self.compilation.nodes[node.0 as usize]
            .suppressed_rules
            .push(rule.to_string());
    }

    /// Declare a public class. The simple name is the last `.`/`+` segment
    /// of `full_name`.
    pub fn declare_type(&mut self, full_name: &str) -> TypeId {
        self.declare_type_of_kind(full_name, TypeKind::Class)
    }

    pub fn declare_interface(&mut self, full_name: &str) -> TypeId {
        self.declare_type_of_kind(full_name, TypeKind::Interface)
    }

    fn declare_type_of_kind(&mut self, full_name: &str, kind: TypeKind) -> TypeId {
        let name = simple_name(full_name).to_string();
        self.compilation.types.push(TypeData {
            name,
            full_name: full_name.to_string(),
            kind,
            is_public: true,
            is_static: false,
            base: None,
            interfaces: Vec::new(),
            containing_type: None,
            nested_types: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            attributes: Vec::new(),
            doc_summary: None,
            declared_at: None,
        });
        TypeId(self.compilation.types.len() as u32 - 1)
    }

    pub fn type_full_name(&self, ty: TypeId) -> &str {
        &self.compilation.types[ty.0 as usize].full_name
    }

    pub fn set_base(&mut self, ty: TypeId, base: TypeRef) {
        self.compilation.types[ty.0 as usize].base = Some(base);
    }

    pub fn add_interface(&mut self, ty: TypeId, interface: TypeId) {
        self.compilation.types[ty.0 as usize].interfaces.push(interface);
    }

    /// Link a nested type to its containing type.
    pub fn nest(&mut self, outer: TypeId, inner: TypeId) {
        self.compilation.types[inner.0 as usize].containing_type = Some(outer);
        self.compilation.types[outer.0 as usize].nested_types.push(inner);
    }

    pub fn set_type_public(&mut self, ty: TypeId, is_public: bool) {
        self.compilation.types[ty.0 as usize].is_public = is_public;
    }

    pub fn set_type_static(&mut self, ty: TypeId, is_static: bool) {
        self.compilation.types[ty.0 as usize].is_static = is_static;
    }

    pub fn set_type_doc(&mut self, ty: TypeId, summary: &str) {
        self.compilation.types[ty.0 as usize].doc_summary = Some(summary.to_string());
    }

    pub fn set_type_declared(&mut self, ty: TypeId, node: NodeId) {
        self.compilation.types[ty.0 as usize].declared_at = Some(node);
    }

    pub fn add_type_attribute(&mut self, ty: TypeId, attribute: AttributeApplication) {
        self.compilation.types[ty.0 as usize].attributes.push(attribute);
    }

    /// Declare a public instance method with no parameters and no body.
    pub fn declare_method(&mut self, ty: TypeId, name: &str) -> MethodId {
        self.compilation.methods.push(MethodData {
            name: name.to_string(),
            containing_type: ty,
            params: Vec::new(),
            return_type: None,
            is_public: true,
            is_static: false,
            doc_summary: None,
            declared_at: None,
            body: None,
        });
        let id = MethodId(self.compilation.methods.len() as u32 - 1);
        self.compilation.types[ty.0 as usize].methods.push(id);
        id
    }

    pub fn set_params(&mut self, method: MethodId, params: Vec<TypeRef>) {
        self.compilation.methods[method.0 as usize].params = params;
    }

    pub fn set_return_type(&mut self, method: MethodId, ty: TypeRef) {
        self.compilation.methods[method.0 as usize].return_type = Some(ty);
    }

    pub fn set_method_static(&mut self, method: MethodId, is_static: bool) {
        self.compilation.methods[method.0 as usize].is_static = is_static;
    }

    pub fn set_method_declared(&mut self, method: MethodId, node: NodeId) {
        self.compilation.methods[method.0 as usize].declared_at = Some(node);
    }

    pub fn set_body(&mut self, method: MethodId, body: Body) {
        self.compilation.methods[method.0 as usize].body = Some(body);
    }

    /// Declare a public property of the given type.
    pub fn declare_property(&mut self, ty: TypeId, name: &str, property_type: TypeRef) -> PropertyId {
        self.compilation.properties.push(PropertyData {
            name: name.to_string(),
            containing_type: ty,
            ty: property_type,
            is_public: true,
            getter: None,
            setter: None,
            attributes: Vec::new(),
            doc_summary: None,
            declared_at: None,
        });
        let id = PropertyId(self.compilation.properties.len() as u32 - 1);
        self.compilation.types[ty.0 as usize].properties.push(id);
        id
    }

    pub fn set_property_public(&mut self, property: PropertyId, is_public: bool) {
        self.compilation.properties[property.0 as usize].is_public = is_public;
    }

    pub fn set_property_doc(&mut self, property: PropertyId, summary: &str) {
        self.compilation.properties[property.0 as usize].doc_summary = Some(summary.to_string());
    }

    pub fn set_property_declared(&mut self, property: PropertyId, node: NodeId) {
        self.compilation.properties[property.0 as usize].declared_at = Some(node);
    }

    pub fn set_getter(&mut self, property: PropertyId, getter: MethodId) {
        self.compilation.properties[property.0 as usize].getter = Some(getter);
    }

    pub fn set_setter(&mut self, property: PropertyId, setter: MethodId) {
        self.compilation.properties[property.0 as usize].setter = Some(setter);
    }

    pub fn add_property_attribute(&mut self, property: PropertyId, attribute: AttributeApplication) {
        self.compilation.properties[property.0 as usize]
            .attributes
            .push(attribute);
    }

    /// Finish construction, building derived indexes.
    pub fn build(mut self) -> Compilation {
        self.compilation.reindex();
        self.compilation
    }
}

fn simple_name(full_name: &str) -> &str {
    full_name
        .rsplit(|c| c == '.' || c == '+')
        .next()
        .unwrap_or(full_name)
}
