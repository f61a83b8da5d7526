//! Primary-key declaration checks.
//!
//! A bound entity declares its primary key either through `IsKey = true`
//! arguments on field attributes or through a database identity
//! attribute. Mixing the two on one entity breaks the platform's insert
//! pipeline, and a bound entity without any key cannot be updated or
//! deleted reliably.

use crate::cancel::Cancelled;
use crate::context::AnalysisContext;
use crate::diagnostics::{Descriptor, Diagnostic, Severity};
use crate::platform::names;
use crate::semantic::attributes;
use crate::semantic::entity_fields::{EntityKind, EntityModel};
use crate::symbols::NodeId;

use super::EntityAnalyzer;

pub const CONFLICTING_KEYS: Descriptor = Descriptor {
    id: "GC0103",
    title: "Identity key combined with regular key fields",
    severity: Severity::Error,
};

pub const MISSING_KEY: Descriptor = Descriptor {
    id: "GC0104",
    title: "Bound entity declares no key fields",
    severity: Severity::Warning,
};

const DESCRIPTORS: [Descriptor; 2] = [CONFLICTING_KEYS, MISSING_KEY];

pub struct KeyFieldsAnalyzer;

impl EntityAnalyzer for KeyFieldsAnalyzer {
    fn descriptors(&self) -> &'static [Descriptor] {
        &DESCRIPTORS
    }

    fn should_analyze(&self, _acx: &AnalysisContext<'_>, model: &EntityModel) -> bool {
        // Extensions attach to an entity whose keys are already declared.
        model.kind == EntityKind::Entity && model.in_source
    }

    fn analyze(&self, acx: &AnalysisContext<'_>, model: &EntityModel) -> Result<(), Cancelled> {
        let mut regular_key_sites: Vec<NodeId> = Vec::new();
        let mut identity_sites: Vec<NodeId> = Vec::new();
        let mut has_bound_field = false;

        for field in model.fields.items() {
            acx.check_cancellation()?;
            let Some(property_id) = field.property else {
                continue;
            };
            let property = acx.compilation.property(property_id);

            for application in &property.attributes {
                let expanded = attributes::expand_attribute(
                    acx.platform,
                    acx.compilation,
                    application.attribute,
                    true,
                    acx.cancellation,
                )?;

                if expanded.contains(&acx.platform.db_field_attribute) {
                    has_bound_field = true;
                }

                let is_identity = acx
                    .platform
                    .field_attributes()
                    .iter()
                    .any(|info| info.is_identity && expanded.contains(&info.attribute));

                let is_key = application
                    .named_args
                    .get(names::IS_KEY_ARGUMENT)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);

                let site = application.node.or(property.declared_at);
                if is_identity {
                    if let Some(node) = site {
                        identity_sites.push(node);
                    }
                } else if is_key {
                    if let Some(node) = site {
                        regular_key_sites.push(node);
                    }
                }
            }
        }

        if !identity_sites.is_empty() && !regular_key_sites.is_empty() {
            let all_sites: Vec<NodeId> = identity_sites
                .iter()
                .chain(regular_key_sites.iter())
                .copied()
                .collect();

            for &node in &all_sites {
                let mut diagnostic = Diagnostic::new(
                    &CONFLICTING_KEYS,
                    acx.compilation.location_of(node),
                    "entity mixes an identity column with regular key fields; keep one key strategy",
                );
                for &other in all_sites.iter().filter(|&&n| n != node) {
                    diagnostic =
                        diagnostic.with_extra_location(acx.compilation.location_of(other));
                }
                acx.report_diagnostic(diagnostic, node);
            }
            return Ok(());
        }

        if has_bound_field && identity_sites.is_empty() && regular_key_sites.is_empty() {
            if let Some(node) = acx.compilation.type_data(model.symbol).declared_at {
                acx.report(
                    &MISSING_KEY,
                    node,
                    format!(
                        "bound entity '{}' declares no key fields",
                        acx.compilation.type_data(model.symbol).name
                    ),
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::diagnostics::DiagnosticSink;
    use crate::platform::PlatformContext;
    use crate::settings::AnalysisSettings;
    use crate::symbols::{ArgValue, AttributeApplication};
    use crate::testkit;

    fn analyze(
        compilation: &crate::symbols::Compilation,
        entity: crate::symbols::TypeId,
    ) -> crate::diagnostics::AnalysisOutcome {
        let platform = PlatformContext::resolve(compilation).unwrap();
        let settings = AnalysisSettings::default();
        let sink = DiagnosticSink::new();
        let token = CancellationToken::new();
        let acx = AnalysisContext {
            compilation,
            platform: &platform,
            settings: &settings,
            sink: &sink,
            cancellation: &token,
        };

        let model = EntityModel::infer(&platform, compilation, entity, &token)
            .unwrap()
            .unwrap();
        let analyzer = KeyFieldsAnalyzer;
        if analyzer.should_analyze(&acx, &model) {
            analyzer.analyze(&acx, &model).unwrap();
        }
        sink.into_outcome(1)
    }

    fn key_attribute(
        platform: &testkit::PlatformTypes,
        builder: &mut crate::symbols::CompilationBuilder,
        source: crate::symbols::SourceId,
        line: u32,
    ) -> AttributeApplication {
        let node = builder.add_node(source, line, 1);
        let mut application = AttributeApplication::new(platform.db_string_attribute);
        application
            .named_args
            .insert("IsKey".to_string(), ArgValue::Bool(true));
        application.node = Some(node);
        application
    }

    #[test]
    fn test_identity_plus_regular_key_conflict() {
        let (mut builder, platform) = testkit::platform_builder();
        let order = testkit::declare_entity(&mut builder, &platform, "MyApp.Order");
        let source = builder.add_source("Order.cs");
        let type_node = builder.add_node(source, 1, 1);
        builder.set_type_declared(order, type_node);

        let (_, nbr) =
            testkit::declare_field(&mut builder, &platform, order, "OrderNbr", platform.string_type);
        let application = key_attribute(&platform, &mut builder, source, 5);
        builder.add_property_attribute(nbr, application);

        let (_, id_field) =
            testkit::declare_field(&mut builder, &platform, order, "OrderID", platform.int32);
        let id_node = builder.add_node(source, 9, 1);
        let mut identity = AttributeApplication::new(platform.db_identity_attribute);
        identity.node = Some(id_node);
        builder.add_property_attribute(id_field, identity);

        let compilation = builder.build();
        let outcome = analyze(&compilation, order);

        // One diagnostic per key site, each pointing at the other site.
        assert_eq!(outcome.diagnostics.len(), 2);
        for diagnostic in &outcome.diagnostics {
            assert_eq!(diagnostic.rule, "GC0103");
            assert_eq!(diagnostic.extra_locations.len(), 1);
        }
    }

    #[test]
    fn test_bound_entity_without_keys_warns() {
        let (mut builder, platform) = testkit::platform_builder();
        let order = testkit::declare_entity(&mut builder, &platform, "MyApp.Order");
        let source = builder.add_source("Order.cs");
        let type_node = builder.add_node(source, 1, 1);
        builder.set_type_declared(order, type_node);

        let (_, status) =
            testkit::declare_field(&mut builder, &platform, order, "Status", platform.string_type);
        builder.add_property_attribute(
            status,
            AttributeApplication::new(platform.db_string_attribute),
        );

        let compilation = builder.build();
        let outcome = analyze(&compilation, order);

        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].rule, "GC0104");
    }

    #[test]
    fn test_unbound_entity_is_silent() {
        let (mut builder, platform) = testkit::platform_builder();
        let filter = testkit::declare_entity(&mut builder, &platform, "MyApp.OrderFilter");
        let source = builder.add_source("OrderFilter.cs");
        let type_node = builder.add_node(source, 1, 1);
        builder.set_type_declared(filter, type_node);

        let (_, status) = testkit::declare_field(
            &mut builder,
            &platform,
            filter,
            "Status",
            platform.string_type,
        );
        builder.add_property_attribute(
            status,
            AttributeApplication::new(platform.string_attribute),
        );

        let compilation = builder.build();
        let outcome = analyze(&compilation, filter);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_single_key_strategy_is_silent() {
        let (mut builder, platform) = testkit::platform_builder();
        let order = testkit::declare_entity(&mut builder, &platform, "MyApp.Order");
        let source = builder.add_source("Order.cs");
        let type_node = builder.add_node(source, 1, 1);
        builder.set_type_declared(order, type_node);

        let (_, nbr) =
            testkit::declare_field(&mut builder, &platform, order, "OrderNbr", platform.string_type);
        let application = key_attribute(&platform, &mut builder, source, 5);
        builder.add_property_attribute(nbr, application);

        let compilation = builder.build();
        let outcome = analyze(&compilation, order);
        assert!(outcome.diagnostics.is_empty());
    }
}
