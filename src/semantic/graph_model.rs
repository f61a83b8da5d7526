//! Business-graph semantic models.
//!
//! [`GraphModel`] identifies a graph or graph extension and collects its
//! declared actions. [`GraphEventModel`] additionally classifies every
//! method reachable through the declaration walk (base graph types first,
//! then the extension chain) against the lifecycle event taxonomy. The
//! walk order is load-bearing: override resolution relies on base-to-
//! derived declaration order, matching the platform's own dispatch rules.

use crate::cancel::{Cancelled, CancellationToken};
use crate::platform::PlatformContext;
use crate::semantic::events::{classify_event, EventType, SignatureKind};
use crate::semantic::extension_chain::{graph_extension_chain, SortDirection};
use crate::semantic::overridable::{OverridableCollection, OverridableItem};
use crate::symbols::{Compilation, MethodId, PropertyId, TypeId};

/// Kind of type a graph model was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Graph,
    GraphExtension,
}

/// An action declared on a graph, with its override chain.
#[derive(Debug, Clone)]
pub struct ActionInfo {
    pub property: PropertyId,
    pub name: String,
    /// Definition of the action's declared type.
    pub action_type: TypeId,
    pub declaration_order: usize,
    pub declared_in: TypeId,
    /// Whether the action type is one of the platform's predefined ones.
    pub is_system: bool,
    pub base: Option<Box<ActionInfo>>,
}

impl OverridableItem for ActionInfo {
    fn item_key(&self) -> String {
        self.name.to_lowercase()
    }

    fn declaration_order(&self) -> usize {
        self.declaration_order
    }

    fn attach_base(&mut self, base: Self) {
        self.base = Some(Box::new(base));
    }
}

/// One classified event handler.
#[derive(Debug, Clone)]
pub struct GraphEventInfo {
    pub method: MethodId,
    pub event_type: EventType,
    pub signature_kind: SignatureKind,
    pub record_name: String,
    pub field_name: Option<String>,
    pub declaration_order: usize,
    pub declared_in: TypeId,
    /// The overridden handler from a less derived level, if any.
    pub base: Option<Box<GraphEventInfo>>,
}

impl OverridableItem for GraphEventInfo {
    fn item_key(&self) -> String {
        format!(
            "{}::{}::{}",
            self.record_name.to_lowercase(),
            self.field_name.as_deref().unwrap_or("").to_lowercase(),
            self.event_type.as_str()
        )
    }

    fn declaration_order(&self) -> usize {
        self.declaration_order
    }

    fn attach_base(&mut self, base: Self) {
        self.base = Some(Box::new(base));
    }
}

/// Identification of a graph or graph extension plus its actions.
#[derive(Debug)]
pub struct GraphModel {
    /// The analyzed type.
    pub symbol: TypeId,
    pub kind: GraphKind,
    /// The concrete graph being extended; equals `symbol` for graphs.
    pub graph_symbol: TypeId,
    pub actions: OverridableCollection<ActionInfo>,
    pub in_source: bool,
}

impl GraphModel {
    /// Identify `ty` as a graph or graph extension and collect actions.
    /// Returns `None` for anything else; an extension whose generic
    /// arguments do not name a real graph also yields `None`.
    pub fn infer(
        context: &PlatformContext,
        compilation: &Compilation,
        ty: TypeId,
        cancellation: &CancellationToken,
    ) -> Result<Option<Self>, Cancelled> {
        let (kind, graph_symbol) = if context.is_graph(compilation, ty) {
            (GraphKind::Graph, ty)
        } else if context.is_graph_extension(compilation, ty) {
            let Some(base) = context.graph_extension_base(compilation, ty) else {
                return Ok(None);
            };
            let Some(&graph) = base.args.last() else {
                return Ok(None);
            };
            if !context.is_graph(compilation, graph) {
                return Ok(None);
            }
            (GraphKind::GraphExtension, graph)
        } else {
            return Ok(None);
        };

        let levels = declaration_levels(context, compilation, kind, graph_symbol, ty);
        let mut actions = OverridableCollection::new();
        let mut order = 0;

        for &level in &levels {
            cancellation.check()?;
            for &property in &compilation.type_data(level).properties {
                let definition = compilation.property(property).ty.definition;
                if !context.is_action_type(compilation, definition) {
                    continue;
                }
                actions.add(ActionInfo {
                    property,
                    name: compilation.property(property).name.clone(),
                    action_type: definition,
                    declaration_order: order,
                    declared_in: level,
                    is_system: context.is_system_action_type(definition),
                    base: None,
                });
                order += 1;
            }
        }

        Ok(Some(Self {
            symbol: ty,
            kind,
            graph_symbol,
            actions,
            in_source: compilation.type_data(ty).in_source(),
        }))
    }
}

/// A graph model with every reachable method classified against the event
/// taxonomy.
#[derive(Debug)]
pub struct GraphEventModel {
    pub graph: GraphModel,
    events: OverridableCollection<GraphEventInfo>,
}

impl GraphEventModel {
    /// Build the event model for `ty`. Returns `None` for non-graph types.
    pub fn infer(
        context: &PlatformContext,
        compilation: &Compilation,
        ty: TypeId,
        cancellation: &CancellationToken,
    ) -> Result<Option<Self>, Cancelled> {
        let Some(graph) = GraphModel::infer(context, compilation, ty, cancellation)? else {
            return Ok(None);
        };

        let levels =
            declaration_levels(context, compilation, graph.kind, graph.graph_symbol, graph.symbol);
        let mut events = OverridableCollection::new();
        let mut order = 0;

        for &level in &levels {
            cancellation.check()?;
            for &method in &compilation.type_data(level).methods {
                cancellation.check()?;
                let Some(classification) = classify_event(compilation, context, method) else {
                    continue;
                };
                events.add(GraphEventInfo {
                    method,
                    event_type: classification.event_type,
                    signature_kind: classification.signature_kind,
                    record_name: classification.record_name,
                    field_name: classification.field_name,
                    declaration_order: order,
                    declared_in: level,
                    base: None,
                });
                order += 1;
            }
        }

        Ok(Some(Self { graph, events }))
    }

    /// Live (most derived) events in declaration order.
    pub fn events(&self) -> Vec<&GraphEventInfo> {
        self.events.items()
    }

    pub fn events_of_type(&self, event_type: EventType) -> Vec<&GraphEventInfo> {
        self.events
            .items()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Events declared directly on the analyzed type, not inherited.
    pub fn events_declared_in_symbol(&self) -> Vec<&GraphEventInfo> {
        self.events
            .items()
            .into_iter()
            .filter(|e| e.declared_in == self.graph.symbol)
            .collect()
    }

    /// The winning handler for one (record, field, event) slot.
    pub fn event_for(
        &self,
        record: &str,
        field: Option<&str>,
        event_type: EventType,
    ) -> Option<&GraphEventInfo> {
        self.events
            .items()
            .into_iter()
            .find(|e| {
                e.event_type == event_type
                    && e.record_name.eq_ignore_ascii_case(record)
                    && match (field, &e.field_name) {
                        (None, None) => true,
                        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                        _ => false,
                    }
            })
    }
}

/// Types contributing member declarations, least derived first: the base
/// graph chain, then (for extensions) the extension chain in ascending
/// order.
fn declaration_levels(
    context: &PlatformContext,
    compilation: &Compilation,
    kind: GraphKind,
    graph_symbol: TypeId,
    symbol: TypeId,
) -> Vec<TypeId> {
    let mut levels = context.graph_with_bases(compilation, graph_symbol);
    levels.reverse();

    if kind == GraphKind::GraphExtension {
        levels.extend(graph_extension_chain(
            context,
            compilation,
            symbol,
            SortDirection::Ascending,
            false,
        ));
    }

    levels
}
