//! Well-known platform types.
//!
//! [`PlatformContext`] resolves the Summit platform's core types by full
//! name against a compilation. Resolution fails closed: when the platform
//! is not referenced at all, [`PlatformContext::resolve`] returns `None`
//! and every analyzer built on top of it does nothing.

use std::collections::{HashMap, HashSet};

use crate::semantic::hierarchy;
use crate::symbols::{Compilation, MethodId, TypeId, TypeRef};

/// Full names of the platform types the analyzer recognizes.
pub mod names {
    pub const TABLE_RECORD: &str = "Summit.Data.ITableRecord";
    pub const TABLE_RECORD_BASE: &str = "Summit.Data.TableRecordBase";
    pub const RECORD_FIELD: &str = "Summit.Data.IRecordField";
    pub const RECORD_EXTENSION: &str = "Summit.Data.RecordExtension";
    pub const DATA_GRAPH: &str = "Summit.Data.DataGraph";
    pub const GRAPH_EXTENSION: &str = "Summit.Data.GraphExtension";
    pub const RECORD_CACHE: &str = "Summit.Data.RecordCache";
    pub const DATA_VIEW: &str = "Summit.Data.DataView";
    pub const EVENT_SUBSCRIBER_ATTRIBUTE: &str = "Summit.Data.EventSubscriberAttribute";
    pub const AGGREGATE_ATTRIBUTE: &str = "Summit.Data.AggregateAttribute";
    pub const DYNAMIC_AGGREGATE_ATTRIBUTE: &str = "Summit.Data.DynamicAggregateAttribute";
    pub const ATTRIBUTE_USAGE_ATTRIBUTE: &str = "System.AttributeUsageAttribute";
    pub const DB_FIELD_ATTRIBUTE: &str = "Summit.Data.DbFieldAttribute";
    pub const RECORD_ACTION: &str = "Summit.Data.RecordAction";
    pub const EVENTS_CONTAINER: &str = "Summit.Data.Events";
    pub const PLATFORM_EXCEPTION: &str = "Summit.Data.PlatformException";
    pub const SETUP_NOT_ENTERED_EXCEPTION: &str = "Summit.Data.SetupNotEnteredException";
    pub const NULLABLE: &str = "System.Nullable";
    pub const STRING: &str = "System.String";

    /// Typed field attributes: full name, implied property data type,
    /// whether the attribute declares a database identity.
    pub static FIELD_ATTRIBUTES: phf::Map<&'static str, (&'static str, bool)> = phf::phf_map! {
        "Summit.Data.DbStringAttribute" => ("System.String", false),
        "Summit.Data.StringAttribute" => ("System.String", false),
        "Summit.Data.DbIntAttribute" => ("System.Int32", false),
        "Summit.Data.IntAttribute" => ("System.Int32", false),
        "Summit.Data.DbBoolAttribute" => ("System.Boolean", false),
        "Summit.Data.BoolAttribute" => ("System.Boolean", false),
        "Summit.Data.DbDateAttribute" => ("System.DateTime", false),
        "Summit.Data.DateAttribute" => ("System.DateTime", false),
        "Summit.Data.DbDecimalAttribute" => ("System.Decimal", false),
        "Summit.Data.DecimalAttribute" => ("System.Decimal", false),
        "Summit.Data.DbGuidAttribute" => ("System.Guid", false),
        "Summit.Data.GuidAttribute" => ("System.Guid", false),
        "Summit.Data.DbLongAttribute" => ("System.Int64", false),
        "Summit.Data.LongAttribute" => ("System.Int64", false),
        "Summit.Data.DbIdentityAttribute" => ("System.Int32", true),
        "Summit.Data.DbLongIdentityAttribute" => ("System.Int64", true),
    };

    /// Predefined action types the platform ships with.
    pub const SYSTEM_ACTIONS: &[&str] = &[
        "Summit.Data.SaveAction",
        "Summit.Data.CancelAction",
        "Summit.Data.InsertAction",
        "Summit.Data.DeleteAction",
    ];

    pub const SAVE_ACTION: &str = "Summit.Data.SaveAction";

    /// Named argument marking a field attribute as a primary-key column.
    pub const IS_KEY_ARGUMENT: &str = "IsKey";
}

/// Classification of a persistence entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOperationKind {
    /// `DataGraph.Persist`.
    GraphPersist,
    /// The `RecordCache.Persist*` family.
    CachePersist,
    /// `SaveAction.Press`.
    ActionPress,
}

/// A registered typed field attribute.
#[derive(Debug, Clone)]
pub struct FieldAttributeInfo {
    pub attribute: TypeId,
    /// Property data type the attribute implies, when that type is
    /// present in the compilation.
    pub data_type: Option<TypeId>,
    pub is_identity: bool,
}

/// Resolved well-known platform types for one compilation.
#[derive(Debug)]
pub struct PlatformContext {
    pub table_record: TypeId,
    pub record_field: TypeId,
    pub record_extension: TypeId,
    pub data_graph: TypeId,
    pub graph_extension: TypeId,
    pub record_cache: TypeId,
    pub data_view: TypeId,
    pub event_subscriber_attribute: TypeId,
    pub aggregate_attribute: TypeId,
    pub dynamic_aggregate_attribute: TypeId,
    pub db_field_attribute: TypeId,
    pub record_action: TypeId,
    pub events_container: TypeId,
    pub platform_exception: TypeId,
    /// Entity base class introduced by newer platform versions; absent on
    /// older ones.
    pub record_base: Option<TypeId>,
    pub attribute_usage_attribute: Option<TypeId>,
    pub setup_not_entered_exception: Option<TypeId>,
    pub nullable: Option<TypeId>,
    pub string_type: Option<TypeId>,
    system_actions: HashSet<TypeId>,
    field_attributes: Vec<FieldAttributeInfo>,
    save_operations: HashMap<MethodId, SaveOperationKind>,
}

impl PlatformContext {
    /// Resolve the platform's core types. `None` means the compilation
    /// does not reference the platform and must not be analyzed.
    pub fn resolve(compilation: &Compilation) -> Option<Self> {
        let lookup = |name: &str| compilation.type_by_full_name(name);

        let data_graph = lookup(names::DATA_GRAPH)?;
        let record_cache = lookup(names::RECORD_CACHE)?;

        let mut context = Self {
            table_record: lookup(names::TABLE_RECORD)?,
            record_field: lookup(names::RECORD_FIELD)?,
            record_extension: lookup(names::RECORD_EXTENSION)?,
            data_graph,
            graph_extension: lookup(names::GRAPH_EXTENSION)?,
            record_cache,
            data_view: lookup(names::DATA_VIEW)?,
            event_subscriber_attribute: lookup(names::EVENT_SUBSCRIBER_ATTRIBUTE)?,
            aggregate_attribute: lookup(names::AGGREGATE_ATTRIBUTE)?,
            dynamic_aggregate_attribute: lookup(names::DYNAMIC_AGGREGATE_ATTRIBUTE)?,
            db_field_attribute: lookup(names::DB_FIELD_ATTRIBUTE)?,
            record_action: lookup(names::RECORD_ACTION)?,
            events_container: lookup(names::EVENTS_CONTAINER)?,
            platform_exception: lookup(names::PLATFORM_EXCEPTION)?,
            record_base: lookup(names::TABLE_RECORD_BASE),
            attribute_usage_attribute: lookup(names::ATTRIBUTE_USAGE_ATTRIBUTE),
            setup_not_entered_exception: lookup(names::SETUP_NOT_ENTERED_EXCEPTION),
            nullable: lookup(names::NULLABLE),
            string_type: lookup(names::STRING),
            system_actions: HashSet::new(),
            field_attributes: Vec::new(),
            save_operations: HashMap::new(),
        };

        context.system_actions = names::SYSTEM_ACTIONS
            .iter()
            .filter_map(|n| lookup(n))
            .collect();

        for (attr_name, (data_type_name, is_identity)) in names::FIELD_ATTRIBUTES.entries() {
            if let Some(attribute) = lookup(attr_name) {
                context.field_attributes.push(FieldAttributeInfo {
                    attribute,
                    data_type: lookup(data_type_name),
                    is_identity: *is_identity,
                });
            }
        }

        context.register_save_operations(compilation);

        Some(context)
    }

    fn register_save_operations(&mut self, compilation: &Compilation) {
        let mut register = |ty: TypeId, method_names: &[&str], kind: SaveOperationKind| {
            for &method in &compilation.type_data(ty).methods {
                if method_names.contains(&compilation.method(method).name.as_str()) {
                    self.save_operations.insert(method, kind);
                }
            }
        };

        register(self.data_graph, &["Persist"], SaveOperationKind::GraphPersist);
        register(
            self.record_cache,
            &[
                "Persist",
                "PersistInserted",
                "PersistUpdated",
                "PersistDeleted",
            ],
            SaveOperationKind::CachePersist,
        );

        if let Some(save_action) = compilation.type_by_full_name(names::SAVE_ACTION) {
            register(save_action, &["Press"], SaveOperationKind::ActionPress);
        }
    }

    /// Whether `ty` is an entity (a table record).
    pub fn is_entity(&self, compilation: &Compilation, ty: TypeId) -> bool {
        !compilation.type_data(ty).is_interface()
            && hierarchy::implements_interface(compilation, ty, self.table_record)
    }

    /// Whether `ty` is an entity extension.
    pub fn is_entity_extension(&self, compilation: &Compilation, ty: TypeId) -> bool {
        hierarchy::base_types(compilation, ty)
            .iter()
            .any(|&t| t == self.record_extension)
    }

    pub fn is_entity_or_extension(&self, compilation: &Compilation, ty: TypeId) -> bool {
        self.is_entity(compilation, ty) || self.is_entity_extension(compilation, ty)
    }

    /// Whether a nested type is a query-field marker.
    pub fn is_field_marker(&self, compilation: &Compilation, ty: TypeId) -> bool {
        hierarchy::implements_interface(compilation, ty, self.record_field)
    }

    pub fn is_graph(&self, compilation: &Compilation, ty: TypeId) -> bool {
        hierarchy::inherits_from(compilation, ty, self.data_graph)
    }

    pub fn is_graph_extension(&self, compilation: &Compilation, ty: TypeId) -> bool {
        hierarchy::inherits_from(compilation, ty, self.graph_extension)
    }

    pub fn is_graph_or_extension(&self, compilation: &Compilation, ty: TypeId) -> bool {
        self.is_graph(compilation, ty) || self.is_graph_extension(compilation, ty)
    }

    /// The applied `RecordExtension<...>` base of an entity extension,
    /// with its generic arguments.
    pub fn entity_extension_base(
        &self,
        compilation: &Compilation,
        ty: TypeId,
    ) -> Option<TypeRef> {
        self.generic_base_of(compilation, ty, self.record_extension)
    }

    /// The applied `GraphExtension<...>` base of a graph extension.
    pub fn graph_extension_base(&self, compilation: &Compilation, ty: TypeId) -> Option<TypeRef> {
        self.generic_base_of(compilation, ty, self.graph_extension)
    }

    fn generic_base_of(
        &self,
        compilation: &Compilation,
        ty: TypeId,
        definition: TypeId,
    ) -> Option<TypeRef> {
        // The seen set tolerates malformed snapshots with cyclic bases.
        let mut seen = HashSet::new();
        let mut current = ty;
        loop {
            if !seen.insert(current) {
                return None;
            }
            let base = compilation.type_data(current).base.as_ref()?;
            if base.definition == definition {
                return Some(base.clone());
            }
            current = base.definition;
        }
    }

    /// The entity and those of its base types that may declare fields,
    /// most derived first. The walk stops at the platform's entity base
    /// class so that plain shared base classes still contribute fields.
    pub fn entity_with_field_bases(
        &self,
        compilation: &Compilation,
        entity: TypeId,
    ) -> Vec<TypeId> {
        hierarchy::base_types_and_self(compilation, entity)
            .into_iter()
            .take_while(|&t| Some(t) != self.record_base)
            .collect()
    }

    /// The extension type and its base types up to (excluding) the
    /// `RecordExtension` base itself.
    pub fn extension_with_bases(&self, compilation: &Compilation, extension: TypeId) -> Vec<TypeId> {
        hierarchy::base_types_and_self(compilation, extension)
            .into_iter()
            .take_while(|&t| t != self.record_extension)
            .collect()
    }

    /// Graph (or graph extension) base types up to the platform base,
    /// most derived first, excluding the platform types themselves.
    pub fn graph_with_bases(&self, compilation: &Compilation, graph: TypeId) -> Vec<TypeId> {
        hierarchy::base_types_and_self(compilation, graph)
            .into_iter()
            .take_while(|&t| t != self.data_graph && t != self.graph_extension)
            .collect()
    }

    pub fn save_operation_kind(&self, method: MethodId) -> Option<SaveOperationKind> {
        self.save_operations.get(&method).copied()
    }

    pub fn is_system_action_type(&self, ty: TypeId) -> bool {
        self.system_actions.contains(&ty)
    }

    pub fn field_attributes(&self) -> &[FieldAttributeInfo] {
        &self.field_attributes
    }

    pub fn field_attribute_info(&self, attribute: TypeId) -> Option<&FieldAttributeInfo> {
        self.field_attributes
            .iter()
            .find(|info| info.attribute == attribute)
    }

    /// Whether a type derives from (or is) an action type.
    pub fn is_action_type(&self, compilation: &Compilation, ty: TypeId) -> bool {
        hierarchy::inherits_from_or_equals(compilation, ty, self.record_action, false)
    }
}
