//! Entity field reconstruction.
//!
//! An entity field is the pairing of a nested query-field marker type with
//! the same-named (case-insensitive) data property. Fields are collected
//! from the entity's base-type chain, most base level first, so that
//! redeclarations at derived levels override earlier ones while keeping
//! the superseded entry reachable through the `base` backlink. A property
//! redeclared without its marker inherits the marker from the overridden
//! entry, and vice versa.

use std::collections::HashSet;

use crate::cancel::{Cancelled, CancellationToken};
use crate::platform::PlatformContext;
use crate::semantic::extension_chain::{entity_extension_chain, SortDirection};
use crate::semantic::hierarchy;
use crate::semantic::overridable::{OverridableCollection, OverridableItem};
use crate::symbols::{Compilation, PropertyId, TypeId};

/// One reconstructed entity field.
#[derive(Debug, Clone)]
pub struct EntityField {
    pub name: String,
    pub declaration_order: usize,
    /// The level of the hierarchy that declared this entry.
    pub declared_in: TypeId,
    /// The query-field marker type, possibly inherited from an overridden
    /// base entry.
    pub marker: Option<TypeId>,
    /// The data property, possibly inherited from an overridden base entry.
    pub property: Option<PropertyId>,
    /// The superseded entry from a less derived level, if any.
    pub base: Option<Box<EntityField>>,
}

impl OverridableItem for EntityField {
    fn item_key(&self) -> String {
        self.name.to_lowercase()
    }

    fn declaration_order(&self) -> usize {
        self.declaration_order
    }

    fn attach_base(&mut self, base: Self) {
        if self.marker.is_none() {
            self.marker = base.marker;
        }
        if self.property.is_none() {
            self.property = base.property;
        }
        self.base = Some(Box::new(base));
    }
}

/// Kind of type an [`EntityModel`] was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Entity,
    Extension,
}

/// The reconstructed field model of an entity or entity extension.
#[derive(Debug)]
pub struct EntityModel {
    pub symbol: TypeId,
    pub kind: EntityKind,
    pub fields: OverridableCollection<EntityField>,
    pub in_source: bool,
}

impl EntityModel {
    /// Build the model for `ty`. Returns `None` when `ty` is neither an
    /// entity nor an entity extension.
    pub fn infer(
        context: &PlatformContext,
        compilation: &Compilation,
        ty: TypeId,
        cancellation: &CancellationToken,
    ) -> Result<Option<Self>, Cancelled> {
        let kind = if context.is_entity(compilation, ty) {
            EntityKind::Entity
        } else if context.is_entity_extension(compilation, ty) {
            EntityKind::Extension
        } else {
            return Ok(None);
        };

        let fields = match kind {
            EntityKind::Entity => entity_fields(context, compilation, ty, true, cancellation)?,
            EntityKind::Extension => extension_fields(context, compilation, ty, cancellation)?,
        };

        Ok(Some(Self {
            symbol: ty,
            kind,
            fields,
            in_source: compilation.type_data(ty).in_source(),
        }))
    }
}

/// Fields of an entity, optionally merged across its base-type chain.
///
/// Returns an empty collection when `entity` is not a recognized entity.
pub fn entity_fields(
    context: &PlatformContext,
    compilation: &Compilation,
    entity: TypeId,
    include_inheritance_chain: bool,
    cancellation: &CancellationToken,
) -> Result<OverridableCollection<EntityField>, Cancelled> {
    if !context.is_entity(compilation, entity) {
        return Ok(OverridableCollection::new());
    }

    let mut levels = if include_inheritance_chain {
        context.entity_with_field_bases(compilation, entity)
    } else {
        vec![entity]
    };
    // Most base level first, so derived levels override.
    levels.reverse();

    collect_levels(context, compilation, &levels, cancellation)
}

/// Fields of an entity extension merged with its prior extensions and the
/// base entity, in ascending chain order.
///
/// Returns an empty collection when `extension` is not a recognized
/// extension or its chain is malformed.
pub fn extension_fields(
    context: &PlatformContext,
    compilation: &Compilation,
    extension: TypeId,
    cancellation: &CancellationToken,
) -> Result<OverridableCollection<EntityField>, Cancelled> {
    let chain = entity_extension_chain(
        context,
        compilation,
        extension,
        SortDirection::Ascending,
        true,
    );

    collect_levels(context, compilation, &chain, cancellation)
}

fn collect_levels(
    context: &PlatformContext,
    compilation: &Compilation,
    levels: &[TypeId],
    cancellation: &CancellationToken,
) -> Result<OverridableCollection<EntityField>, Cancelled> {
    let mut collection = OverridableCollection::new();
    let mut order = 0;

    for &level in levels {
        cancellation.check()?;
        add_level_fields(
            context,
            compilation,
            level,
            &mut order,
            &mut collection,
            cancellation,
        )?;
    }

    Ok(collection)
}

/// Add the fields declared directly at one hierarchy level: every field
/// marker (paired with its same-named property when present), then every
/// attribute-bearing or overriding property without a marker.
fn add_level_fields(
    context: &PlatformContext,
    compilation: &Compilation,
    level: TypeId,
    order: &mut usize,
    collection: &mut OverridableCollection<EntityField>,
    cancellation: &CancellationToken,
) -> Result<(), Cancelled> {
    let data = compilation.type_data(level);
    let mut claimed = HashSet::new();

    for &nested in &data.nested_types {
        cancellation.check()?;
        if !context.is_field_marker(compilation, nested) {
            continue;
        }

        let marker_name = &compilation.type_data(nested).name;
        let property = data
            .properties
            .iter()
            .copied()
            .find(|&p| compilation.property(p).name.eq_ignore_ascii_case(marker_name));

        let name = property
            .map(|p| compilation.property(p).name.clone())
            .unwrap_or_else(|| marker_name.clone());
        if let Some(p) = property {
            claimed.insert(p);
        }

        collection.add(EntityField {
            name,
            declaration_order: next_order(order),
            declared_in: level,
            marker: Some(nested),
            property,
            base: None,
        });
    }

    for &p in &data.properties {
        cancellation.check()?;
        if claimed.contains(&p) {
            continue;
        }

        let property = compilation.property(p);
        let overrides_existing = collection.get(&property.name).is_some();
        let has_subscriber_attribute = property.attributes.iter().any(|a| {
            hierarchy::inherits_from_or_equals(
                compilation,
                a.attribute,
                context.event_subscriber_attribute,
                false,
            )
        });

        // A bare property is not a field; it only participates when it
        // carries field attributes or redeclares a field from below.
        if !overrides_existing && !has_subscriber_attribute {
            continue;
        }

        collection.add(EntityField {
            name: property.name.clone(),
            declaration_order: next_order(order),
            declared_in: level,
            marker: None,
            property: Some(p),
            base: None,
        });
    }

    Ok(())
}

fn next_order(order: &mut usize) -> usize {
    let current = *order;
    *order += 1;
    current
}
