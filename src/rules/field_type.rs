//! Field attribute / property type compatibility.
//!
//! Every typed field attribute implies a property data type (a string
//! column wants a `String` property, an int column a `Nullable<Int32>`,
//! and so on). The implied types are discovered through attribute
//! composition expansion, so aggregates that bundle a typed attribute are
//! checked the same as direct applications.

use std::collections::BTreeSet;

use crate::cancel::Cancelled;
use crate::context::AnalysisContext;
use crate::diagnostics::{Descriptor, Diagnostic, Severity};
use crate::semantic::attributes;
use crate::semantic::entity_fields::EntityModel;
use crate::semantic::hierarchy;
use crate::symbols::{NodeId, TypeId};

use super::EntityAnalyzer;

pub const FIELD_TYPE_MISMATCH: Descriptor = Descriptor {
    id: "GC0101",
    title: "Field attribute type does not match the property type",
    severity: Severity::Error,
};

pub const MULTIPLE_FIELD_TYPE_ATTRIBUTES: Descriptor = Descriptor {
    id: "GC0102",
    title: "Conflicting typed field attributes on one property",
    severity: Severity::Error,
};

const DESCRIPTORS: [Descriptor; 2] = [FIELD_TYPE_MISMATCH, MULTIPLE_FIELD_TYPE_ATTRIBUTES];

/// Property bag key carrying the attribute-implied type full name, for
/// the property retyping fix.
pub const EXPECTED_TYPE_PROPERTY: &str = "expected_type";
pub const ACTUAL_TYPE_PROPERTY: &str = "actual_type";

pub struct FieldTypeAnalyzer;

impl EntityAnalyzer for FieldTypeAnalyzer {
    fn descriptors(&self) -> &'static [Descriptor] {
        &DESCRIPTORS
    }

    fn should_analyze(&self, _acx: &AnalysisContext<'_>, model: &EntityModel) -> bool {
        model.in_source
    }

    fn analyze(&self, acx: &AnalysisContext<'_>, model: &EntityModel) -> Result<(), Cancelled> {
        for field in model.fields.items() {
            acx.check_cancellation()?;

            // Inherited entries are analyzed with their declaring type.
            if field.declared_in != model.symbol {
                continue;
            }
            let Some(property_id) = field.property else {
                continue;
            };
            let property = acx.compilation.property(property_id);
            let Some(node) = property.declared_at else {
                continue;
            };

            let mut implied_types: BTreeSet<TypeId> = BTreeSet::new();
            let mut attribute_nodes: Vec<NodeId> = Vec::new();

            for application in &property.attributes {
                let expanded = attributes::expand_attribute(
                    acx.platform,
                    acx.compilation,
                    application.attribute,
                    true,
                    acx.cancellation,
                )?;

                for info in acx.platform.field_attributes() {
                    if !expanded.contains(&info.attribute) {
                        continue;
                    }
                    if let Some(data_type) = info.data_type {
                        implied_types.insert(data_type);
                        if let Some(attr_node) = application.node {
                            attribute_nodes.push(attr_node);
                        }
                    }
                }
            }

            if implied_types.len() > 1 {
                let mut diagnostic = Diagnostic::new(
                    &MULTIPLE_FIELD_TYPE_ATTRIBUTES,
                    acx.compilation.location_of(node),
                    format!(
                        "property '{}' carries field attributes implying {} different data types",
                        property.name,
                        implied_types.len()
                    ),
                );
                for attr_node in attribute_nodes {
                    diagnostic = diagnostic
                        .with_extra_location(acx.compilation.location_of(attr_node));
                }
                acx.report_diagnostic(diagnostic, node);
                continue;
            }

            let Some(&expected) = implied_types.iter().next() else {
                continue;
            };

            let actual = acx
                .platform
                .nullable
                .and_then(|nullable| {
                    hierarchy::underlying_type_from_nullable(&property.ty, nullable)
                })
                .unwrap_or(property.ty.definition);

            if actual != expected {
                let expected_name = &acx.compilation.type_data(expected).full_name;
                let actual_name = &acx.compilation.type_data(actual).full_name;
                let diagnostic = Diagnostic::new(
                    &FIELD_TYPE_MISMATCH,
                    acx.compilation.location_of(node),
                    format!(
                        "property '{}' is declared as '{}' but its field attribute expects '{}'",
                        property.name, actual_name, expected_name
                    ),
                )
                .with_property(EXPECTED_TYPE_PROPERTY, expected_name.clone())
                .with_property(ACTUAL_TYPE_PROPERTY, actual_name.clone());
                acx.report_diagnostic(diagnostic, node);
            }
        }

        Ok(())
    }
}
