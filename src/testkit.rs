//! Test support: assembling compilation snapshots that reference the
//! platform.
//!
//! Most tests need a compilation with the platform's well-known types
//! already declared. [`platform_builder`] seeds a builder with all of
//! them and returns their ids so tests can wire entities, extensions,
//! graphs, and handlers with a few calls.

use std::collections::HashMap;

use crate::platform::names;
use crate::semantic::events::EventType;
use crate::symbols::{
    AttributeApplication, Compilation, CompilationBuilder, MethodId, PropertyId, TypeId, TypeRef,
};

/// Ids of the pre-declared platform types.
#[derive(Debug)]
pub struct PlatformTypes {
    pub table_record: TypeId,
    pub record_base: TypeId,
    pub record_field: TypeId,
    pub record_extension: TypeId,
    pub data_graph: TypeId,
    pub graph_extension: TypeId,
    pub record_cache: TypeId,
    pub data_view: TypeId,
    pub event_subscriber_attribute: TypeId,
    pub aggregate_attribute: TypeId,
    pub dynamic_aggregate_attribute: TypeId,
    pub attribute_usage_attribute: TypeId,
    pub db_field_attribute: TypeId,
    pub db_string_attribute: TypeId,
    pub string_attribute: TypeId,
    pub db_int_attribute: TypeId,
    pub int_attribute: TypeId,
    pub db_bool_attribute: TypeId,
    pub bool_attribute: TypeId,
    pub db_identity_attribute: TypeId,
    pub record_action: TypeId,
    pub save_action: TypeId,
    pub cancel_action: TypeId,
    pub events_container: TypeId,
    pub platform_exception: TypeId,
    pub setup_not_entered_exception: TypeId,
    pub nullable: TypeId,
    pub string_type: TypeId,
    pub int32: TypeId,
    pub boolean: TypeId,
    pub int64: TypeId,
    /// Persist method on `DataGraph`.
    pub graph_persist: MethodId,
    /// Persist method on `RecordCache`.
    pub cache_persist: MethodId,
    /// Press method on `SaveAction`.
    pub save_press: MethodId,
    event_args: HashMap<&'static str, TypeId>,
}

impl PlatformTypes {
    /// The typed event-args type for an event name, e.g. `"RowInserting"`.
    pub fn event_args(&self, name: &str) -> TypeId {
        *self
            .event_args
            .get(name)
            .unwrap_or_else(|| panic!("unknown event args type: {}", name))
    }
}

/// A builder pre-seeded with the platform's well-known types.
pub fn platform_builder() -> (CompilationBuilder, PlatformTypes) {
    let mut b = CompilationBuilder::new("TestProject");

    let string_type = b.declare_type(names::STRING);
    let int32 = b.declare_type("System.Int32");
    let boolean = b.declare_type("System.Boolean");
    b.declare_type("System.DateTime");
    b.declare_type("System.Decimal");
    b.declare_type("System.Guid");
    let int64 = b.declare_type("System.Int64");
    let nullable = b.declare_type(names::NULLABLE);
    let attribute_usage_attribute = b.declare_type(names::ATTRIBUTE_USAGE_ATTRIBUTE);

    let table_record = b.declare_interface(names::TABLE_RECORD);
    let record_base = b.declare_type(names::TABLE_RECORD_BASE);
    b.add_interface(record_base, table_record);
    let record_field = b.declare_interface(names::RECORD_FIELD);
    let record_extension = b.declare_type(names::RECORD_EXTENSION);

    let data_graph = b.declare_type(names::DATA_GRAPH);
    let graph_persist = b.declare_method(data_graph, "Persist");
    let graph_extension = b.declare_type(names::GRAPH_EXTENSION);

    let record_cache = b.declare_type(names::RECORD_CACHE);
    let cache_persist = b.declare_method(record_cache, "Persist");
    b.declare_method(record_cache, "PersistInserted");
    b.declare_method(record_cache, "PersistUpdated");
    b.declare_method(record_cache, "PersistDeleted");

    let data_view = b.declare_type(names::DATA_VIEW);

    let event_subscriber_attribute = b.declare_type(names::EVENT_SUBSCRIBER_ATTRIBUTE);
    let subscriber = TypeRef::new(event_subscriber_attribute);

    let aggregate_attribute = b.declare_type(names::AGGREGATE_ATTRIBUTE);
    b.set_base(aggregate_attribute, subscriber.clone());
    let dynamic_aggregate_attribute = b.declare_type(names::DYNAMIC_AGGREGATE_ATTRIBUTE);
    b.set_base(dynamic_aggregate_attribute, subscriber.clone());

    let db_field_attribute = b.declare_type(names::DB_FIELD_ATTRIBUTE);
    b.set_base(db_field_attribute, subscriber.clone());
    let bound = TypeRef::new(db_field_attribute);

    let db_string_attribute = b.declare_type("Summit.Data.DbStringAttribute");
    b.set_base(db_string_attribute, bound.clone());
    let string_attribute = b.declare_type("Summit.Data.StringAttribute");
    b.set_base(string_attribute, subscriber.clone());
    let db_int_attribute = b.declare_type("Summit.Data.DbIntAttribute");
    b.set_base(db_int_attribute, bound.clone());
    let int_attribute = b.declare_type("Summit.Data.IntAttribute");
    b.set_base(int_attribute, subscriber.clone());
    let db_bool_attribute = b.declare_type("Summit.Data.DbBoolAttribute");
    b.set_base(db_bool_attribute, bound.clone());
    let bool_attribute = b.declare_type("Summit.Data.BoolAttribute");
    b.set_base(bool_attribute, subscriber.clone());
    let db_identity_attribute = b.declare_type("Summit.Data.DbIdentityAttribute");
    b.set_base(db_identity_attribute, bound.clone());

    let record_action = b.declare_type(names::RECORD_ACTION);
    let save_action = b.declare_type(names::SAVE_ACTION);
    b.set_base(save_action, TypeRef::new(record_action));
    let save_press = b.declare_method(save_action, "Press");
    let cancel_action = b.declare_type("Summit.Data.CancelAction");
    b.set_base(cancel_action, TypeRef::new(record_action));

    let events_container = b.declare_type(names::EVENTS_CONTAINER);
    let mut event_args = HashMap::new();
    for event in EventType::ALL {
        let name = event.as_str();
        let args_type = b.declare_type(&format!("{}+{}", names::EVENTS_CONTAINER, name));
        b.nest(events_container, args_type);
        event_args.insert(name, args_type);
    }

    let platform_exception = b.declare_type(names::PLATFORM_EXCEPTION);
    let setup_not_entered_exception = b.declare_type(names::SETUP_NOT_ENTERED_EXCEPTION);
    b.set_base(setup_not_entered_exception, TypeRef::new(platform_exception));

    let platform = PlatformTypes {
        table_record,
        record_base,
        record_field,
        record_extension,
        data_graph,
        graph_extension,
        record_cache,
        data_view,
        event_subscriber_attribute,
        aggregate_attribute,
        dynamic_aggregate_attribute,
        attribute_usage_attribute,
        db_field_attribute,
        db_string_attribute,
        string_attribute,
        db_int_attribute,
        int_attribute,
        db_bool_attribute,
        bool_attribute,
        db_identity_attribute,
        record_action,
        save_action,
        cancel_action,
        events_container,
        platform_exception,
        setup_not_entered_exception,
        nullable,
        string_type,
        int32,
        boolean,
        int64,
        graph_persist,
        cache_persist,
        save_press,
        event_args,
    };

    (b, platform)
}

/// A finished compilation containing only the platform types.
pub fn platform_compilation() -> (Compilation, PlatformTypes) {
    let (builder, platform) = platform_builder();
    (builder.build(), platform)
}

/// Declare an entity: a class implementing the table-record interface.
pub fn declare_entity(
    builder: &mut CompilationBuilder,
    platform: &PlatformTypes,
    full_name: &str,
) -> TypeId {
    let ty = builder.declare_type(full_name);
    builder.add_interface(ty, platform.table_record);
    ty
}

/// Declare an entity extension. `args` are the generic arguments of the
/// `RecordExtension<...>` base, most derived prior extension first and the
/// entity last.
pub fn declare_entity_extension(
    builder: &mut CompilationBuilder,
    platform: &PlatformTypes,
    full_name: &str,
    args: &[TypeId],
) -> TypeId {
    let ty = builder.declare_type(full_name);
    builder.set_base(ty, TypeRef::generic(platform.record_extension, args.to_vec()));
    ty
}

pub fn declare_graph(
    builder: &mut CompilationBuilder,
    platform: &PlatformTypes,
    full_name: &str,
) -> TypeId {
    let ty = builder.declare_type(full_name);
    builder.set_base(ty, TypeRef::new(platform.data_graph));
    ty
}

pub fn declare_graph_extension(
    builder: &mut CompilationBuilder,
    platform: &PlatformTypes,
    full_name: &str,
    args: &[TypeId],
) -> TypeId {
    let ty = builder.declare_type(full_name);
    builder.set_base(ty, TypeRef::generic(platform.graph_extension, args.to_vec()));
    ty
}

/// Declare a query field on an entity or extension: the nested marker
/// type (camel-cased) plus the same-named data property.
pub fn declare_field(
    builder: &mut CompilationBuilder,
    platform: &PlatformTypes,
    owner: TypeId,
    name: &str,
    property_type: TypeId,
) -> (TypeId, PropertyId) {
    let owner_name = builder.type_full_name(owner).to_string();
    let marker_name = camel_case(name);
    let marker = builder.declare_type(&format!("{}+{}", owner_name, marker_name));
    builder.add_interface(marker, platform.record_field);
    builder.nest(owner, marker);

    let property = builder.declare_property(owner, name, TypeRef::new(property_type));
    (marker, property)
}

/// Declare a typed-convention row event handler on a graph type.
pub fn declare_typed_row_handler(
    builder: &mut CompilationBuilder,
    platform: &PlatformTypes,
    graph: TypeId,
    event_name: &str,
    record: TypeId,
) -> MethodId {
    let handler = builder.declare_method(graph, "_");
    builder.set_params(
        handler,
        vec![TypeRef::generic(platform.event_args(event_name), vec![record])],
    );
    handler
}

/// Declare an aggregate attribute composed of the given attributes.
pub fn declare_aggregate_attribute(
    builder: &mut CompilationBuilder,
    platform: &PlatformTypes,
    full_name: &str,
    components: &[TypeId],
) -> TypeId {
    let ty = builder.declare_type(full_name);
    builder.set_base(ty, TypeRef::new(platform.aggregate_attribute));
    for &component in components {
        builder.add_type_attribute(ty, AttributeApplication::new(component));
    }
    ty
}

fn camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
