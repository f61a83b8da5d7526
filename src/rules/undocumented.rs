//! Missing documentation on public entity members.
//!
//! Entities and their field properties form the public surface other
//! customization projects build against, so public ones must carry a
//! documentation summary. Only symbols declared on the analyzed type are
//! reported; inherited members belong to their declaring type's run.

use crate::cancel::Cancelled;
use crate::context::AnalysisContext;
use crate::diagnostics::{Descriptor, Severity};
use crate::semantic::entity_fields::EntityModel;

use super::EntityAnalyzer;

pub const UNDOCUMENTED_PUBLIC: Descriptor = Descriptor {
    id: "GC0302",
    title: "Public entity member has no documentation summary",
    severity: Severity::Warning,
};

const DESCRIPTORS: [Descriptor; 1] = [UNDOCUMENTED_PUBLIC];

pub struct UndocumentedPublicAnalyzer;

impl EntityAnalyzer for UndocumentedPublicAnalyzer {
    fn descriptors(&self) -> &'static [Descriptor] {
        &DESCRIPTORS
    }

    fn should_analyze(&self, acx: &AnalysisContext<'_>, model: &EntityModel) -> bool {
        acx.settings.document_public_members && model.in_source
    }

    fn analyze(&self, acx: &AnalysisContext<'_>, model: &EntityModel) -> Result<(), Cancelled> {
        let data = acx.compilation.type_data(model.symbol);

        if data.is_public && data.doc_summary.is_none() {
            if let Some(node) = data.declared_at {
                acx.report(
                    &UNDOCUMENTED_PUBLIC,
                    node,
                    format!("public type '{}' has no documentation summary", data.name),
                );
            }
        }

        for field in model.fields.items() {
            acx.check_cancellation()?;
            if field.declared_in != model.symbol {
                continue;
            }
            let Some(property_id) = field.property else {
                continue;
            };
            let property = acx.compilation.property(property_id);
            if !property.is_public || property.doc_summary.is_some() {
                continue;
            }
            if let Some(node) = property.declared_at {
                acx.report(
                    &UNDOCUMENTED_PUBLIC,
                    node,
                    format!(
                        "public property '{}' has no documentation summary",
                        property.name
                    ),
                );
            }
        }

        Ok(())
    }
}
