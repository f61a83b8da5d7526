//! Lifecycle event classification.
//!
//! Maps method declarations onto the platform's closed taxonomy of
//! lifecycle events. Two signature conventions are recognized:
//!
//! - **Typed argument** (current): a single parameter of a generic
//!   event-args type nested in `Summit.Data.Events`, e.g.
//!   `void _(Events.RowInserting<Order> e)`.
//! - **Legacy named** (historic): an underscore-separated name plus a
//!   leading `RecordCache` parameter, e.g.
//!   `void Order_RowInserting(RecordCache cache, ...)` or
//!   `void Order_Status_FieldUpdated(RecordCache cache, ...)`.
//!
//! Methods matching neither convention are silently ignored.

use std::fmt;

use crate::platform::PlatformContext;
use crate::symbols::{Compilation, MethodId};

/// The closed set of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    CacheAttached,
    RowSelecting,
    RowSelected,
    RowInserting,
    RowInserted,
    RowUpdating,
    RowUpdated,
    RowDeleting,
    RowDeleted,
    RowPersisting,
    RowPersisted,
    FieldSelecting,
    FieldDefaulting,
    FieldVerifying,
    FieldUpdating,
    FieldUpdated,
    CommandPreparing,
    ExceptionHandling,
}

impl EventType {
    pub const ALL: [EventType; 18] = [
        EventType::CacheAttached,
        EventType::RowSelecting,
        EventType::RowSelected,
        EventType::RowInserting,
        EventType::RowInserted,
        EventType::RowUpdating,
        EventType::RowUpdated,
        EventType::RowDeleting,
        EventType::RowDeleted,
        EventType::RowPersisting,
        EventType::RowPersisted,
        EventType::FieldSelecting,
        EventType::FieldDefaulting,
        EventType::FieldVerifying,
        EventType::FieldUpdating,
        EventType::FieldUpdated,
        EventType::CommandPreparing,
        EventType::ExceptionHandling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::CacheAttached => "CacheAttached",
            EventType::RowSelecting => "RowSelecting",
            EventType::RowSelected => "RowSelected",
            EventType::RowInserting => "RowInserting",
            EventType::RowInserted => "RowInserted",
            EventType::RowUpdating => "RowUpdating",
            EventType::RowUpdated => "RowUpdated",
            EventType::RowDeleting => "RowDeleting",
            EventType::RowDeleted => "RowDeleted",
            EventType::RowPersisting => "RowPersisting",
            EventType::RowPersisted => "RowPersisted",
            EventType::FieldSelecting => "FieldSelecting",
            EventType::FieldDefaulting => "FieldDefaulting",
            EventType::FieldVerifying => "FieldVerifying",
            EventType::FieldUpdating => "FieldUpdating",
            EventType::FieldUpdated => "FieldUpdated",
            EventType::CommandPreparing => "CommandPreparing",
            EventType::ExceptionHandling => "ExceptionHandling",
        }
    }

    /// Whether the event targets a single field rather than a whole row.
    /// Field-scoped events carry a field marker in their signature.
    pub fn is_field_scoped(&self) -> bool {
        matches!(
            self,
            EventType::CacheAttached
                | EventType::FieldSelecting
                | EventType::FieldDefaulting
                | EventType::FieldVerifying
                | EventType::FieldUpdating
                | EventType::FieldUpdated
                | EventType::CommandPreparing
                | EventType::ExceptionHandling
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event names recognized by both signature conventions.
static EVENT_NAMES: phf::Map<&'static str, EventType> = phf::phf_map! {
    "CacheAttached" => EventType::CacheAttached,
    "RowSelecting" => EventType::RowSelecting,
    "RowSelected" => EventType::RowSelected,
    "RowInserting" => EventType::RowInserting,
    "RowInserted" => EventType::RowInserted,
    "RowUpdating" => EventType::RowUpdating,
    "RowUpdated" => EventType::RowUpdated,
    "RowDeleting" => EventType::RowDeleting,
    "RowDeleted" => EventType::RowDeleted,
    "RowPersisting" => EventType::RowPersisting,
    "RowPersisted" => EventType::RowPersisted,
    "FieldSelecting" => EventType::FieldSelecting,
    "FieldDefaulting" => EventType::FieldDefaulting,
    "FieldVerifying" => EventType::FieldVerifying,
    "FieldUpdating" => EventType::FieldUpdating,
    "FieldUpdated" => EventType::FieldUpdated,
    "CommandPreparing" => EventType::CommandPreparing,
    "ExceptionHandling" => EventType::ExceptionHandling,
};

/// Which signature convention a handler follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    LegacyNamed,
    TypedArgument,
}

/// A successful event classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventClassification {
    pub event_type: EventType,
    pub signature_kind: SignatureKind,
    /// Simple name of the entity the handler subscribes to.
    pub record_name: String,
    /// Field name for field-scoped events.
    pub field_name: Option<String>,
}

/// Classify a method as a lifecycle event handler.
///
/// Returns `None` for anything that is not an event handler; that is a
/// normal outcome, not an error.
pub fn classify_event(
    compilation: &Compilation,
    context: &PlatformContext,
    method: MethodId,
) -> Option<EventClassification> {
    let data = compilation.method(method);
    if data.is_static {
        return None;
    }

    classify_typed(compilation, context, method)
        .or_else(|| classify_legacy(compilation, context, method))
}

fn classify_typed(
    compilation: &Compilation,
    context: &PlatformContext,
    method: MethodId,
) -> Option<EventClassification> {
    let data = compilation.method(method);
    if data.params.len() != 1 {
        return None;
    }

    let param = &data.params[0];
    let definition = compilation.type_data(param.definition);
    if definition.containing_type != Some(context.events_container) {
        return None;
    }

    let event_type = *EVENT_NAMES.get(definition.name.as_str())?;

    let (record, field) = if event_type.is_field_scoped() {
        if param.args.len() != 2 {
            return None;
        }
        (param.args[0], Some(param.args[1]))
    } else {
        if param.args.len() != 1 {
            return None;
        }
        (param.args[0], None)
    };

    Some(EventClassification {
        event_type,
        signature_kind: SignatureKind::TypedArgument,
        record_name: compilation.type_data(record).name.clone(),
        field_name: field.map(|f| compilation.type_data(f).name.clone()),
    })
}

fn classify_legacy(
    compilation: &Compilation,
    context: &PlatformContext,
    method: MethodId,
) -> Option<EventClassification> {
    let data = compilation.method(method);
    let first_param = data.params.first()?;
    if first_param.definition != context.record_cache {
        return None;
    }

    let segments: Vec<&str> = data.name.split('_').collect();
    match segments.len() {
        2 => {
            let event_type = *EVENT_NAMES.get(segments[1])?;
            if event_type.is_field_scoped() {
                return None;
            }
            Some(EventClassification {
                event_type,
                signature_kind: SignatureKind::LegacyNamed,
                record_name: segments[0].to_string(),
                field_name: None,
            })
        }
        3 => {
            let event_type = *EVENT_NAMES.get(segments[2])?;
            if !event_type.is_field_scoped() {
                return None;
            }
            Some(EventClassification {
                event_type,
                signature_kind: SignatureKind::LegacyNamed,
                record_name: segments[0].to_string(),
                field_name: Some(segments[1].to_string()),
            })
        }
        _ => None,
    }
}
