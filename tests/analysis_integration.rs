//! Integration tests for the full analysis pipeline.
//!
//! These tests assemble compilation snapshots through the public builder
//! API and validate that `run_analysis` surfaces the expected findings
//! end to end: model inference, rule dispatch, suppression, and the
//! platform gate all working together.

use graphcheck::rules;
use graphcheck::settings::AnalysisSettings;
use graphcheck::symbols::{
    ArgValue, AttributeApplication, Body, Expr, SymbolRef, TypeRef,
};
use graphcheck::testkit::{
    self, declare_entity, declare_field, declare_graph, declare_typed_row_handler,
};
use graphcheck::CancellationToken;

/// A project with one entity (mistyped field, conflicting keys, no docs)
/// and one graph (persist inside RowUpdated).
fn troubled_project() -> graphcheck::Compilation {
    let (mut builder, platform) = testkit::platform_builder();
    let source = builder.add_source("Order.cs");

    let order = declare_entity(&mut builder, &platform, "MyApp.Order");
    let order_node = builder.add_node(source, 1, 1);
    builder.set_type_declared(order, order_node);
    builder.set_type_doc(order, "Customer order header.");

    // Key field via IsKey on a string column.
    let (_, nbr) = declare_field(&mut builder, &platform, order, "OrderNbr", platform.string_type);
    let nbr_node = builder.add_node(source, 5, 5);
    builder.set_property_declared(nbr, nbr_node);
    builder.set_property_doc(nbr, "Order number.");
    let mut key_attr = AttributeApplication::new(platform.db_string_attribute);
    key_attr.named_args.insert("IsKey".to_string(), ArgValue::Bool(true));
    key_attr.node = Some(builder.add_node(source, 4, 5));
    builder.add_property_attribute(nbr, key_attr);

    // Conflicting identity column.
    let (_, id) = declare_field(&mut builder, &platform, order, "OrderID", platform.int32);
    let id_node = builder.add_node(source, 9, 5);
    builder.set_property_declared(id, id_node);
    builder.set_property_doc(id, "Surrogate identity.");
    let mut identity_attr = AttributeApplication::new(platform.db_identity_attribute);
    identity_attr.node = Some(builder.add_node(source, 8, 5));
    builder.add_property_attribute(id, identity_attr);

    // String column declared as an Int32 property.
    let (_, qty) = declare_field(&mut builder, &platform, order, "Qty", platform.int32);
    let qty_node = builder.add_node(source, 13, 5);
    builder.set_property_declared(qty, qty_node);
    builder.set_property_doc(qty, "Ordered quantity.");
    builder.add_property_attribute(
        qty,
        AttributeApplication::new(platform.db_string_attribute),
    );

    // Graph with a persist call inside a RowUpdated handler.
    let graph_source = builder.add_source("OrderEntry.cs");
    let graph = declare_graph(&mut builder, &platform, "MyApp.OrderEntry");
    let graph_node = builder.add_node(graph_source, 1, 1);
    builder.set_type_declared(graph, graph_node);

    let handler = declare_typed_row_handler(&mut builder, &platform, graph, "RowUpdated", order);
    let call_node = builder.add_node(graph_source, 12, 9);
    builder.bind(call_node, SymbolRef::Method(platform.graph_persist));
    builder.set_body(handler, Body::new(vec![Expr::invocation(call_node)]));

    builder.build()
}

#[test]
fn test_full_run_surfaces_findings_from_all_layers() {
    let compilation = troubled_project();
    let outcome = rules::run_analysis(
        &compilation,
        &AnalysisSettings::default(),
        &CancellationToken::new(),
    )
    .unwrap();

    let rules_found: Vec<&str> = outcome
        .diagnostics
        .iter()
        .map(|d| d.rule.as_str())
        .collect();

    // Field/attribute type mismatch on Qty.
    assert!(rules_found.contains(&"GC0101"), "found: {:?}", rules_found);
    // Identity + regular key conflict (one finding per key site).
    assert_eq!(
        rules_found.iter().filter(|&&r| r == "GC0103").count(),
        2,
        "found: {:?}",
        rules_found
    );
    // Persist inside RowUpdated.
    assert!(rules_found.contains(&"GC0201"), "found: {:?}", rules_found);
    // Everything relevant is documented, so no GC0302.
    assert!(!rules_found.contains(&"GC0302"), "found: {:?}", rules_found);
}

#[test]
fn test_suppression_annotation_moves_finding_aside() {
    let (mut builder, platform) = testkit::platform_builder();
    let source = builder.add_source("OrderEntry.cs");

    let order = declare_entity(&mut builder, &platform, "MyApp.Order");
    let graph = declare_graph(&mut builder, &platform, "MyApp.OrderEntry");
    let graph_node = builder.add_node(source, 1, 1);
    builder.set_type_declared(graph, graph_node);

    let handler = declare_typed_row_handler(&mut builder, &platform, graph, "RowUpdated", order);
    let call_node = builder.add_node(source, 12, 9);
    builder.bind(call_node, SymbolRef::Method(platform.graph_persist));
    builder.suppress(call_node, "GC0201");
    builder.set_body(handler, Body::new(vec![Expr::invocation(call_node)]));

    let compilation = builder.build();
    let outcome = rules::run_analysis(
        &compilation,
        &AnalysisSettings::default(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert!(outcome.diagnostics.iter().all(|d| d.rule != "GC0201"));
    assert_eq!(outcome.suppressed.len(), 1);
    assert_eq!(outcome.suppressed[0].rule, "GC0201");

    // With the mechanism off, the finding comes back.
    let settings = AnalysisSettings {
        suppression_mechanism_enabled: false,
        ..Default::default()
    };
    let outcome = rules::run_analysis(&compilation, &settings, &CancellationToken::new()).unwrap();
    assert!(outcome.diagnostics.iter().any(|d| d.rule == "GC0201"));
}

#[test]
fn test_derived_entity_field_merge_scenario() {
    // A base entity declares Status (marker + property); the derived
    // entity redeclares the ShipmentNbr property without its marker. The
    // merged view must keep the field count stable and source the marker
    // from the base level.
    let (mut builder, platform) = testkit::platform_builder();
    let base = declare_entity(&mut builder, &platform, "MyApp.BaseDac");
    declare_field(&mut builder, &platform, base, "Status", platform.string_type);
    let (base_marker, _) = declare_field(
        &mut builder,
        &platform,
        base,
        "ShipmentNbr",
        platform.string_type,
    );

    let derived = declare_entity(&mut builder, &platform, "MyApp.DerivedDac");
    builder.set_base(derived, TypeRef::new(base));
    let redeclared = builder.declare_property(
        derived,
        "ShipmentNbr",
        TypeRef::new(platform.string_type),
    );
    builder.add_property_attribute(
        redeclared,
        AttributeApplication::new(platform.db_string_attribute),
    );

    let compilation = builder.build();
    let platform_context = graphcheck::PlatformContext::resolve(&compilation).unwrap();
    let fields = graphcheck::semantic::entity_fields::entity_fields(
        &platform_context,
        &compilation,
        derived,
        true,
        &CancellationToken::new(),
    )
    .unwrap();

    // No field lost, none duplicated.
    assert_eq!(fields.len(), 2);
    let shipment = fields.get("ShipmentNbr").unwrap();
    assert_eq!(shipment.property, Some(redeclared));
    assert_eq!(shipment.marker, Some(base_marker));
    assert_eq!(shipment.declared_in, derived);
}

#[test]
fn test_compilation_without_platform_yields_nothing() {
    let mut builder = graphcheck::CompilationBuilder::new("Plain");
    let ty = builder.declare_type("Plain.Helper");
    let source = builder.add_source("Helper.cs");
    let node = builder.add_node(source, 1, 1);
    builder.set_type_declared(ty, node);

    let outcome = rules::run_analysis(
        &builder.build(),
        &AnalysisSettings::default(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert!(outcome.diagnostics.is_empty());
    assert_eq!(outcome.analyzed_types, 0);
}
