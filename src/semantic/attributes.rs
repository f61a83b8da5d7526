//! Attribute composition resolution.
//!
//! Platform attributes compose: an aggregate attribute's meaning is the
//! union of the attributes applied to its own class declaration, each of
//! which may itself be an aggregate. Expansion follows those edges plus
//! the base-type chain while it stays inside the event-subscriber
//! hierarchy, and stops at the usage-metadata marker attribute.
//!
//! Termination is guaranteed by a visited set; a depth ceiling remains as
//! a secondary guard against pathological attribute graphs.

use std::collections::HashSet;

use crate::cancel::{Cancelled, CancellationToken};
use crate::platform::PlatformContext;
use crate::semantic::hierarchy;
use crate::symbols::{Compilation, TypeId};

/// Secondary guard for aggregate recursion. The visited set is the
/// primary termination mechanism.
const MAX_AGGREGATE_DEPTH: usize = 10;

const USAGE_MARKER_NAME: &str = "AttributeUsageAttribute";

/// All attribute types `attribute` is composed of: itself, its base chain
/// within the event-subscriber hierarchy (when `include_base_chain`), and
/// the full closure of attributes pulled in through aggregates.
pub fn expand_attribute(
    context: &PlatformContext,
    compilation: &Compilation,
    attribute: TypeId,
    include_base_chain: bool,
    cancellation: &CancellationToken,
) -> Result<HashSet<TypeId>, Cancelled> {
    let mut results = HashSet::new();
    let mut visited = HashSet::new();

    results.insert(attribute);
    visited.insert(attribute);

    if include_base_chain {
        add_subscriber_base_chain(context, compilation, attribute, &mut results);
    }

    expand_aggregates(
        context,
        compilation,
        attribute,
        include_base_chain,
        &mut results,
        &mut visited,
        MAX_AGGREGATE_DEPTH,
        cancellation,
    )?;

    Ok(results)
}

/// Whether `attribute` is, or is composed of, an attribute derived from
/// `target`. Short-circuits on the first match.
pub fn is_derived_from(
    context: &PlatformContext,
    compilation: &Compilation,
    attribute: TypeId,
    target: TypeId,
    cancellation: &CancellationToken,
) -> Result<bool, Cancelled> {
    let mut visited = HashSet::new();
    visited.insert(attribute);
    derived_from_impl(
        context,
        compilation,
        attribute,
        target,
        &mut visited,
        MAX_AGGREGATE_DEPTH,
        cancellation,
    )
}

/// Whether `attribute` ultimately marks a database-bound field.
pub fn is_bound(
    context: &PlatformContext,
    compilation: &Compilation,
    attribute: TypeId,
    cancellation: &CancellationToken,
) -> Result<bool, Cancelled> {
    is_derived_from(
        context,
        compilation,
        attribute,
        context.db_field_attribute,
        cancellation,
    )
}

/// Whether any of the given attribute types marks a bound field.
pub fn contains_bound(
    context: &PlatformContext,
    compilation: &Compilation,
    attributes: impl IntoIterator<Item = TypeId>,
    cancellation: &CancellationToken,
) -> Result<bool, Cancelled> {
    for attribute in attributes {
        cancellation.check()?;
        if is_bound(context, compilation, attribute, cancellation)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Add `attribute`'s base types (and itself) while each link still
/// strictly derives from the event-subscriber marker. The first type that
/// does not breaks the chain.
fn add_subscriber_base_chain(
    context: &PlatformContext,
    compilation: &Compilation,
    attribute: TypeId,
    results: &mut HashSet<TypeId>,
) {
    for ty in hierarchy::base_types_and_self(compilation, attribute) {
        let derives = hierarchy::base_types(compilation, ty)
            .contains(&context.event_subscriber_attribute);
        if !derives {
            break;
        }
        results.insert(ty);
    }
}

fn is_aggregate(context: &PlatformContext, compilation: &Compilation, attribute: TypeId) -> bool {
    hierarchy::inherits_from_or_equals(compilation, attribute, context.aggregate_attribute, false)
        || hierarchy::inherits_from_or_equals(
            compilation,
            attribute,
            context.dynamic_aggregate_attribute,
            false,
        )
}

fn is_usage_marker(context: &PlatformContext, compilation: &Compilation, attribute: TypeId) -> bool {
    context.attribute_usage_attribute == Some(attribute)
        || compilation.type_data(attribute).name == USAGE_MARKER_NAME
}

/// Attribute types applied to `ty`'s own declaration and to those of its
/// base types.
fn applied_attributes(compilation: &Compilation, ty: TypeId) -> Vec<TypeId> {
    hierarchy::base_types_and_self(compilation, ty)
        .into_iter()
        .flat_map(|t| {
            compilation
                .type_data(t)
                .attributes
                .iter()
                .map(|a| a.attribute)
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn expand_aggregates(
    context: &PlatformContext,
    compilation: &Compilation,
    attribute: TypeId,
    include_base_chain: bool,
    results: &mut HashSet<TypeId>,
    visited: &mut HashSet<TypeId>,
    depth: usize,
    cancellation: &CancellationToken,
) -> Result<(), Cancelled> {
    if depth == 0 || !is_aggregate(context, compilation, attribute) {
        return Ok(());
    }

    for applied in applied_attributes(compilation, attribute) {
        cancellation.check()?;

        if is_usage_marker(context, compilation, applied) {
            break;
        }
        if !visited.insert(applied) {
            continue;
        }

        results.insert(applied);
        if include_base_chain {
            add_subscriber_base_chain(context, compilation, applied, results);
        }

        expand_aggregates(
            context,
            compilation,
            applied,
            include_base_chain,
            results,
            visited,
            depth - 1,
            cancellation,
        )?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn derived_from_impl(
    context: &PlatformContext,
    compilation: &Compilation,
    attribute: TypeId,
    target: TypeId,
    visited: &mut HashSet<TypeId>,
    depth: usize,
    cancellation: &CancellationToken,
) -> Result<bool, Cancelled> {
    cancellation.check()?;

    if hierarchy::inherits_from_or_equals(compilation, attribute, target, false) {
        return Ok(true);
    }

    if depth == 0 || !is_aggregate(context, compilation, attribute) {
        return Ok(false);
    }

    for applied in applied_attributes(compilation, attribute) {
        if is_usage_marker(context, compilation, applied) {
            break;
        }
        if !visited.insert(applied) {
            continue;
        }

        if derived_from_impl(
            context,
            compilation,
            applied,
            target,
            visited,
            depth - 1,
            cancellation,
        )? {
            return Ok(true);
        }
    }

    Ok(false)
}
