//! Semantic models derived from the compilation snapshot.
//!
//! This layer reconstructs the platform's domain concepts on top of the
//! raw symbol graph: entity field collections, extension hierarchies,
//! attribute composition, and graph lifecycle-event models. Everything is
//! rebuilt from scratch per compilation pass; nothing is cached across
//! passes.
//!
//! A shared policy applies throughout: when an input does not have the
//! expected shape (a non-entity asked for fields, a malformed extension
//! chain), the operation returns an empty result. Absence is a valid
//! answer; exceptions are not used for shape mismatches.

pub mod attributes;
pub mod entity_fields;
pub mod events;
pub mod extension_chain;
pub mod graph_model;
pub mod hierarchy;
pub mod overridable;

pub use entity_fields::{EntityField, EntityModel};
pub use events::{classify_event, EventClassification, EventType, SignatureKind};
pub use extension_chain::{entity_extension_chain, graph_extension_chain, SortDirection};
pub use graph_model::{ActionInfo, GraphEventInfo, GraphEventModel, GraphKind, GraphModel};
pub use overridable::{OverridableCollection, OverridableItem};
