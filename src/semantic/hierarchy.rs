//! Primitive queries over the type/symbol graph.
//!
//! Everything here is a pure function over a borrowed [`Compilation`]:
//! inheritance chains, interface sets, nested-type flattening, inheritance
//! depth. No derived state, no failure modes beyond empty answers.

use std::collections::{HashSet, VecDeque};

use crate::cancel::{Cancelled, CancellationToken};
use crate::symbols::{Compilation, TypeId, TypeRef};

/// Base types of `ty` from the most derived to the most base, including
/// `ty` itself.
pub fn base_types_and_self(compilation: &Compilation, ty: TypeId) -> Vec<TypeId> {
    base_chain(compilation, ty, true)
}

/// Base types of `ty` from the most derived to the most base, excluding
/// `ty` itself.
pub fn base_types(compilation: &Compilation, ty: TypeId) -> Vec<TypeId> {
    base_chain(compilation, ty, false)
}

fn base_chain(compilation: &Compilation, ty: TypeId, include_self: bool) -> Vec<TypeId> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = if include_self {
        Some(ty)
    } else {
        compilation.type_data(ty).base.as_ref().map(|b| b.definition)
    };

    // The seen set tolerates malformed snapshots with cyclic base links.
    while let Some(id) = current {
        if !seen.insert(id) {
            break;
        }
        chain.push(id);
        current = compilation.type_data(id).base.as_ref().map(|b| b.definition);
    }

    chain
}

/// All interfaces implemented by `ty`, directly or through its base chain,
/// including interfaces extended by those interfaces.
pub fn all_interfaces(compilation: &Compilation, ty: TypeId) -> Vec<TypeId> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();
    let mut queue: VecDeque<TypeId> = base_types_and_self(compilation, ty)
        .into_iter()
        .flat_map(|t| compilation.type_data(t).interfaces.iter().copied())
        .collect();

    while let Some(interface) = queue.pop_front() {
        if !seen.insert(interface) {
            continue;
        }
        result.push(interface);
        queue.extend(compilation.type_data(interface).interfaces.iter().copied());
    }

    result
}

/// Whether `ty` is `base` or inherits from it, optionally looking through
/// implemented interfaces.
pub fn inherits_from_or_equals(
    compilation: &Compilation,
    ty: TypeId,
    base: TypeId,
    include_interfaces: bool,
) -> bool {
    if base_types_and_self(compilation, ty).contains(&base) {
        return true;
    }

    include_interfaces && all_interfaces(compilation, ty).contains(&base)
}

/// Whether `ty` strictly inherits from `base`.
pub fn inherits_from(compilation: &Compilation, ty: TypeId, base: TypeId) -> bool {
    base_types(compilation, ty).contains(&base)
}

/// Whether `ty` implements `interface`. An interface is treated as
/// implementing itself.
pub fn implements_interface(compilation: &Compilation, ty: TypeId, interface: TypeId) -> bool {
    if compilation.type_data(ty).is_interface() && ty == interface {
        return true;
    }

    all_interfaces(compilation, ty).contains(&interface)
}

/// Nested types of `ty`, flattened breadth-first.
///
/// `descend` decides whether to walk through a nested type's own nested
/// types; `None` walks through everything.
pub fn flattened_nested_types(
    compilation: &Compilation,
    ty: TypeId,
    descend: Option<&dyn Fn(TypeId) -> bool>,
    cancellation: &CancellationToken,
) -> Result<Vec<TypeId>, Cancelled> {
    let mut result = Vec::new();
    let mut queue: VecDeque<TypeId> = compilation
        .type_data(ty)
        .nested_types
        .iter()
        .copied()
        .collect();

    while let Some(current) = queue.pop_front() {
        cancellation.check()?;

        let walk_through = descend.map(|p| p(current)).unwrap_or(true);
        if walk_through {
            queue.extend(compilation.type_data(current).nested_types.iter().copied());
        }

        result.push(current);
    }

    Ok(result)
}

/// Containing types of `ty` from the innermost outward, including `ty`.
pub fn containing_types_and_self(compilation: &Compilation, ty: TypeId) -> Vec<TypeId> {
    let mut result = Vec::new();
    let mut current = Some(ty);

    while let Some(id) = current {
        result.push(id);
        current = compilation.type_data(id).containing_type;
    }

    result
}

/// Number of inheritance steps from `ty` down to `base`; `None` when
/// `base` is not an ancestor of `ty`.
pub fn inheritance_depth(compilation: &Compilation, ty: TypeId, base: TypeId) -> Option<usize> {
    base_types_and_self(compilation, ty)
        .iter()
        .position(|&t| t == base)
}

/// For a `Nullable<T>` reference, the underlying `T`.
pub fn underlying_type_from_nullable(ty: &TypeRef, nullable: TypeId) -> Option<TypeId> {
    if ty.definition == nullable && ty.args.len() == 1 {
        Some(ty.args[0])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::CompilationBuilder;

    fn chain_of_three() -> (Compilation, TypeId, TypeId, TypeId) {
        let mut builder = CompilationBuilder::new("Test");
        let root = builder.declare_type("App.Root");
        let middle = builder.declare_type("App.Middle");
        let leaf = builder.declare_type("App.Leaf");
        builder.set_base(middle, TypeRef::new(root));
        builder.set_base(leaf, TypeRef::new(middle));
        (builder.build(), root, middle, leaf)
    }

    #[test]
    fn test_base_types_order() {
        let (compilation, root, middle, leaf) = chain_of_three();
        assert_eq!(
            base_types_and_self(&compilation, leaf),
            vec![leaf, middle, root]
        );
        assert_eq!(base_types(&compilation, leaf), vec![middle, root]);
        assert_eq!(base_types(&compilation, root), vec![]);
    }

    #[test]
    fn test_inherits_from_or_equals() {
        let (compilation, root, _, leaf) = chain_of_three();
        assert!(inherits_from_or_equals(&compilation, leaf, root, false));
        assert!(inherits_from_or_equals(&compilation, leaf, leaf, false));
        assert!(!inherits_from_or_equals(&compilation, root, leaf, false));
        assert!(inherits_from(&compilation, leaf, root));
        assert!(!inherits_from(&compilation, leaf, leaf));
    }

    #[test]
    fn test_interfaces_seen_through_base_chain() {
        let mut builder = CompilationBuilder::new("Test");
        let marker = builder.declare_interface("App.IMarker");
        let extended = builder.declare_interface("App.IExtended");
        builder.add_interface(extended, marker);
        let base = builder.declare_type("App.Base");
        builder.add_interface(base, extended);
        let derived = builder.declare_type("App.Derived");
        builder.set_base(derived, TypeRef::new(base));
        let compilation = builder.build();

        assert!(implements_interface(&compilation, derived, extended));
        // Interface inherited through another interface.
        assert!(implements_interface(&compilation, derived, marker));
        assert!(implements_interface(&compilation, marker, marker));
        assert!(inherits_from_or_equals(&compilation, derived, marker, true));
        assert!(!inherits_from_or_equals(&compilation, derived, marker, false));
    }

    #[test]
    fn test_inheritance_depth() {
        let (compilation, root, middle, leaf) = chain_of_three();
        assert_eq!(inheritance_depth(&compilation, leaf, root), Some(2));
        assert_eq!(inheritance_depth(&compilation, leaf, middle), Some(1));
        assert_eq!(inheritance_depth(&compilation, leaf, leaf), Some(0));
        assert_eq!(inheritance_depth(&compilation, root, leaf), None);
    }

    #[test]
    fn test_flattened_nested_types_breadth_first() {
        let mut builder = CompilationBuilder::new("Test");
        let outer = builder.declare_type("App.Outer");
        let a = builder.declare_type("App.Outer+A");
        let b = builder.declare_type("App.Outer+B");
        let a_inner = builder.declare_type("App.Outer+A+Inner");
        builder.nest(outer, a);
        builder.nest(outer, b);
        builder.nest(a, a_inner);
        let compilation = builder.build();

        let all = flattened_nested_types(&compilation, outer, None, &CancellationToken::new())
            .unwrap();
        assert_eq!(all, vec![a, b, a_inner]);

        // Prune predicate stops descent but still yields the pruned type.
        let pruned = flattened_nested_types(
            &compilation,
            outer,
            Some(&|t| t != a),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(pruned, vec![a, b]);
    }

    #[test]
    fn test_containing_types_walk_outward() {
        let mut builder = CompilationBuilder::new("Test");
        let outer = builder.declare_type("App.Outer");
        let inner = builder.declare_type("App.Outer+Inner");
        let innermost = builder.declare_type("App.Outer+Inner+Leaf");
        builder.nest(outer, inner);
        builder.nest(inner, innermost);
        let compilation = builder.build();

        assert_eq!(
            containing_types_and_self(&compilation, innermost),
            vec![innermost, inner, outer]
        );
        assert_eq!(containing_types_and_self(&compilation, outer), vec![outer]);
    }

    #[test]
    fn test_cyclic_base_chain_terminates() {
        let mut builder = CompilationBuilder::new("Test");
        let a = builder.declare_type("App.A");
        let b = builder.declare_type("App.B");
        builder.set_base(a, TypeRef::new(b));
        builder.set_base(b, TypeRef::new(a));
        let compilation = builder.build();

        assert_eq!(base_types_and_self(&compilation, a), vec![a, b]);
    }

    #[test]
    fn test_nullable_unwrap() {
        let mut builder = CompilationBuilder::new("Test");
        let nullable = builder.declare_type("System.Nullable");
        let int32 = builder.declare_type("System.Int32");
        let _ = builder.build();

        let wrapped = TypeRef::generic(nullable, vec![int32]);
        assert_eq!(underlying_type_from_nullable(&wrapped, nullable), Some(int32));
        assert_eq!(
            underlying_type_from_nullable(&TypeRef::new(int32), nullable),
            None
        );
    }
}
