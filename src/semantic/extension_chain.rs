//! Extension hierarchy reconstruction.
//!
//! Extensions chain through generic arguments, not through language-level
//! subclassing: `RecordExtension<Ext2, Ext1, Order>` declares a third-level
//! extension whose logical bases are `Ext2`, `Ext1`, and finally the
//! entity `Order`. The most derived prior extension comes first among the
//! arguments; the terminal entity (or graph) is always last.
//!
//! Chain construction validates the whole shape and fails closed: if any
//! argument except the last is not a recognized extension, or the last is
//! not a recognized entity/graph, the result is empty.

use std::collections::HashSet;

use crate::platform::PlatformContext;
use crate::symbols::{Compilation, TypeId, TypeRef};

/// Order of a reconstructed chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// From the entity/graph and base extensions up to the most derived
    /// extension.
    Ascending,
    /// From the most derived extension down to the entity/graph.
    Descending,
}

/// The family-specific pieces of chain reconstruction: how to recognize
/// extensions, how to recognize the terminal type, and which plain base
/// types of each participate.
trait ExtensionFamily {
    fn extension_base(&self, compilation: &Compilation, ty: TypeId) -> Option<TypeRef>;
    fn is_extension(&self, compilation: &Compilation, ty: TypeId) -> bool;
    fn is_terminal(&self, compilation: &Compilation, ty: TypeId) -> bool;
    /// Terminal type and its relevant base types, most derived first.
    fn terminal_with_bases(&self, compilation: &Compilation, ty: TypeId) -> Vec<TypeId>;
    /// The extension type and its plain (subclassing) base types, most
    /// derived first.
    fn extension_with_bases(&self, compilation: &Compilation, ty: TypeId) -> Vec<TypeId>;
}

struct EntityFamily<'a>(&'a PlatformContext);

impl ExtensionFamily for EntityFamily<'_> {
    fn extension_base(&self, compilation: &Compilation, ty: TypeId) -> Option<TypeRef> {
        self.0.entity_extension_base(compilation, ty)
    }

    fn is_extension(&self, compilation: &Compilation, ty: TypeId) -> bool {
        self.0.is_entity_extension(compilation, ty)
    }

    fn is_terminal(&self, compilation: &Compilation, ty: TypeId) -> bool {
        self.0.is_entity(compilation, ty)
    }

    fn terminal_with_bases(&self, compilation: &Compilation, ty: TypeId) -> Vec<TypeId> {
        self.0.entity_with_field_bases(compilation, ty)
    }

    fn extension_with_bases(&self, compilation: &Compilation, ty: TypeId) -> Vec<TypeId> {
        self.0.extension_with_bases(compilation, ty)
    }
}

struct GraphFamily<'a>(&'a PlatformContext);

impl ExtensionFamily for GraphFamily<'_> {
    fn extension_base(&self, compilation: &Compilation, ty: TypeId) -> Option<TypeRef> {
        self.0.graph_extension_base(compilation, ty)
    }

    fn is_extension(&self, compilation: &Compilation, ty: TypeId) -> bool {
        self.0.is_graph_extension(compilation, ty)
    }

    fn is_terminal(&self, compilation: &Compilation, ty: TypeId) -> bool {
        self.0.is_graph(compilation, ty)
    }

    fn terminal_with_bases(&self, compilation: &Compilation, ty: TypeId) -> Vec<TypeId> {
        self.0.graph_with_bases(compilation, ty)
    }

    fn extension_with_bases(&self, compilation: &Compilation, ty: TypeId) -> Vec<TypeId> {
        self.0.graph_with_bases(compilation, ty)
    }
}

/// Reconstruct the chain of an entity extension.
///
/// Returns the deduplicated sequence of extension types (plus the entity
/// and its field-storing base types when `include_entity`) in the
/// requested order, or an empty sequence when the extension's generic
/// shape is malformed.
pub fn entity_extension_chain(
    context: &PlatformContext,
    compilation: &Compilation,
    extension: TypeId,
    direction: SortDirection,
    include_entity: bool,
) -> Vec<TypeId> {
    chain(
        &EntityFamily(context),
        compilation,
        extension,
        direction,
        include_entity,
    )
}

/// Reconstruct the chain of a graph extension.
pub fn graph_extension_chain(
    context: &PlatformContext,
    compilation: &Compilation,
    extension: TypeId,
    direction: SortDirection,
    include_graph: bool,
) -> Vec<TypeId> {
    chain(
        &GraphFamily(context),
        compilation,
        extension,
        direction,
        include_graph,
    )
}

fn chain(
    family: &dyn ExtensionFamily,
    compilation: &Compilation,
    extension: TypeId,
    direction: SortDirection,
    include_terminal: bool,
) -> Vec<TypeId> {
    if !family.is_extension(compilation, extension) {
        return Vec::new();
    }

    let Some(base) = family.extension_base(compilation, extension) else {
        return Vec::new();
    };
    let Some(&terminal) = base.args.last() else {
        return Vec::new();
    };
    if !family.is_terminal(compilation, terminal) {
        return Vec::new();
    }

    // Prior extensions, most derived first. Extension chaining does not
    // mix with plain subclassing, so each must itself be an extension.
    let prior = &base.args[..base.args.len() - 1];

    let mut result = Vec::new();
    match direction {
        SortDirection::Ascending => {
            if include_terminal {
                let mut terminal_chain = family.terminal_with_bases(compilation, terminal);
                terminal_chain.reverse();
                result.extend(terminal_chain);
            }
            for &arg in prior.iter().rev() {
                if !family.is_extension(compilation, arg) {
                    return Vec::new();
                }
                result.push(arg);
            }
            let mut self_chain = family.extension_with_bases(compilation, extension);
            self_chain.reverse();
            result.extend(self_chain);
        }
        SortDirection::Descending => {
            result.extend(family.extension_with_bases(compilation, extension));
            for &arg in prior {
                if !family.is_extension(compilation, arg) {
                    return Vec::new();
                }
                result.push(arg);
            }
            if include_terminal {
                result.extend(family.terminal_with_bases(compilation, terminal));
            }
        }
    }

    let mut seen = HashSet::new();
    result.retain(|&t| seen.insert(t));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;

    #[test]
    fn test_single_extension_chain() {
        let (mut builder, platform) = testkit::platform_builder();
        let order = testkit::declare_entity(&mut builder, &platform, "MyApp.Order");
        let ext = testkit::declare_entity_extension(
            &mut builder,
            &platform,
            "MyApp.OrderExt",
            &[order],
        );
        let compilation = builder.build();
        let context = PlatformContext::resolve(&compilation).unwrap();

        let ascending =
            entity_extension_chain(&context, &compilation, ext, SortDirection::Ascending, true);
        assert_eq!(ascending, vec![order, ext]);

        let without_entity =
            entity_extension_chain(&context, &compilation, ext, SortDirection::Ascending, false);
        assert_eq!(without_entity, vec![ext]);
    }

    #[test]
    fn test_chained_extensions_round_trip() {
        let (mut builder, platform) = testkit::platform_builder();
        let order = testkit::declare_entity(&mut builder, &platform, "MyApp.Order");
        let ext1 = testkit::declare_entity_extension(
            &mut builder,
            &platform,
            "MyApp.OrderExt1",
            &[order],
        );
        let ext2 = testkit::declare_entity_extension(
            &mut builder,
            &platform,
            "MyApp.OrderExt2",
            &[ext1, order],
        );
        let ext3 = testkit::declare_entity_extension(
            &mut builder,
            &platform,
            "MyApp.OrderExt3",
            &[ext2, ext1, order],
        );
        let compilation = builder.build();
        let context = PlatformContext::resolve(&compilation).unwrap();

        let ascending =
            entity_extension_chain(&context, &compilation, ext3, SortDirection::Ascending, true);
        let descending =
            entity_extension_chain(&context, &compilation, ext3, SortDirection::Descending, true);

        assert_eq!(ascending, vec![order, ext1, ext2, ext3]);
        let mut reversed = descending.clone();
        reversed.reverse();
        assert_eq!(ascending, reversed);

        // N extensions + entity, no duplicates.
        assert_eq!(ascending.len(), 4);
        let unique: std::collections::HashSet<_> = ascending.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_malformed_chain_is_empty() {
        let (mut builder, platform) = testkit::platform_builder();
        let order = testkit::declare_entity(&mut builder, &platform, "MyApp.Order");
        let not_an_extension = builder.declare_type("MyApp.Helper");
        let bad = testkit::declare_entity_extension(
            &mut builder,
            &platform,
            "MyApp.BadExt",
            &[not_an_extension, order],
        );
        let compilation = builder.build();
        let context = PlatformContext::resolve(&compilation).unwrap();

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            assert!(entity_extension_chain(&context, &compilation, bad, direction, true)
                .is_empty());
        }
    }

    #[test]
    fn test_non_extension_input_is_empty() {
        let (mut builder, platform) = testkit::platform_builder();
        let order = testkit::declare_entity(&mut builder, &platform, "MyApp.Order");
        let compilation = builder.build();
        let context = PlatformContext::resolve(&compilation).unwrap();

        assert!(entity_extension_chain(
            &context,
            &compilation,
            order,
            SortDirection::Ascending,
            true
        )
        .is_empty());
    }

    #[test]
    fn test_terminal_must_be_entity() {
        let (mut builder, platform) = testkit::platform_builder();
        let not_entity = builder.declare_type("MyApp.NotARecord");
        let ext = testkit::declare_entity_extension(
            &mut builder,
            &platform,
            "MyApp.BadExt",
            &[not_entity],
        );
        let compilation = builder.build();
        let context = PlatformContext::resolve(&compilation).unwrap();

        assert!(entity_extension_chain(
            &context,
            &compilation,
            ext,
            SortDirection::Descending,
            true
        )
        .is_empty());
    }

    #[test]
    fn test_graph_extension_chain() {
        let (mut builder, platform) = testkit::platform_builder();
        let graph = testkit::declare_graph(&mut builder, &platform, "MyApp.OrderEntry");
        let ext1 = testkit::declare_graph_extension(
            &mut builder,
            &platform,
            "MyApp.OrderEntryExt1",
            &[graph],
        );
        let ext2 = testkit::declare_graph_extension(
            &mut builder,
            &platform,
            "MyApp.OrderEntryExt2",
            &[ext1, graph],
        );
        let compilation = builder.build();
        let context = PlatformContext::resolve(&compilation).unwrap();

        let ascending =
            graph_extension_chain(&context, &compilation, ext2, SortDirection::Ascending, true);
        assert_eq!(ascending, vec![graph, ext1, ext2]);

        let no_graph =
            graph_extension_chain(&context, &compilation, ext2, SortDirection::Ascending, false);
        assert_eq!(no_graph, vec![ext1, ext2]);
    }
}
