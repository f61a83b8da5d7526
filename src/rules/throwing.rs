//! Exceptions thrown inside lifecycle event handlers.
//!
//! `RowPersisted` runs after the database transaction completed, so an
//! exception there leaves caches and the database out of sync; nothing
//! may throw from it, even transitively. `SetupNotEnteredException` is a
//! navigation signal for screen setup checks and must not surface from
//! inside any event handler.

use crate::cancel::Cancelled;
use crate::context::AnalysisContext;
use crate::diagnostics::{Descriptor, Severity};
use crate::semantic::events::EventType;
use crate::semantic::graph_model::GraphEventModel;
use crate::semantic::hierarchy;
use crate::symbols::{Compilation, TypeId};
use crate::walker::{DeepVisitor, NestedInvocationWalker, ThrowSite, WalkReporter};

use super::GraphAnalyzer;

pub const THROW_IN_ROW_PERSISTED: Descriptor = Descriptor {
    id: "GC0202",
    title: "Exception thrown inside a RowPersisted handler",
    severity: Severity::Error,
};

pub const SETUP_NOT_ENTERED_IN_EVENT: Descriptor = Descriptor {
    id: "GC0203",
    title: "SetupNotEnteredException thrown inside an event handler",
    severity: Severity::Error,
};

const DESCRIPTORS: [Descriptor; 2] = [THROW_IN_ROW_PERSISTED, SETUP_NOT_ENTERED_IN_EVENT];

pub struct ThrowingInEventsAnalyzer;

impl GraphAnalyzer for ThrowingInEventsAnalyzer {
    fn descriptors(&self) -> &'static [Descriptor] {
        &DESCRIPTORS
    }

    fn should_analyze(&self, acx: &AnalysisContext<'_>, model: &GraphEventModel) -> bool {
        model.graph.in_source
            && !acx.compilation.type_data(model.graph.symbol).is_static
    }

    fn analyze(
        &self,
        acx: &AnalysisContext<'_>,
        model: &GraphEventModel,
    ) -> Result<(), Cancelled> {
        for event in model.events_declared_in_symbol() {
            acx.check_cancellation()?;

            let mut walker = NestedInvocationWalker::new(*acx);
            let mut visitor = ThrowVisitor {
                compilation: acx.compilation,
                setup_not_entered: acx.platform.setup_not_entered_exception,
                event_type: event.event_type,
            };
            walker.walk(event.method, &mut visitor)?;
        }

        Ok(())
    }
}

struct ThrowVisitor<'a> {
    compilation: &'a Compilation,
    setup_not_entered: Option<TypeId>,
    event_type: EventType,
}

impl DeepVisitor for ThrowVisitor<'_> {
    fn on_throw(&mut self, reporter: &mut WalkReporter<'_, '_>, site: &ThrowSite) {
        if self.event_type == EventType::RowPersisted {
            reporter.report(
                &THROW_IN_ROW_PERSISTED,
                site.report_node,
                "an exception can be thrown from this RowPersisted handler; \
                 the database transaction is already complete here",
            );
        }

        if let Some(setup) = self.setup_not_entered {
            if hierarchy::inherits_from_or_equals(self.compilation, site.exception, setup, false) {
                reporter.report(
                    &SETUP_NOT_ENTERED_IN_EVENT,
                    site.report_node,
                    format!(
                        "a setup-not-entered exception can be thrown from this {} handler",
                        self.event_type
                    ),
                );
            }
        }
    }
}
