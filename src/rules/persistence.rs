//! Persistence calls inside lifecycle event handlers.
//!
//! Event handlers run in the middle of the platform's own save pipeline;
//! starting another save from there reenters the pipeline. The walker
//! follows helper calls, so a persist buried several methods deep is
//! still found and reported at the handler-level call site. The one
//! allowed combination is the cache-persist family inside `RowPersisting`,
//! which the pipeline itself expects.

use crate::cancel::Cancelled;
use crate::context::AnalysisContext;
use crate::diagnostics::{Descriptor, Severity};
use crate::platform::{PlatformContext, SaveOperationKind};
use crate::semantic::events::EventType;
use crate::semantic::graph_model::GraphEventModel;
use crate::walker::{CallSite, DeepVisitor, NestedInvocationWalker, WalkReporter};

use super::GraphAnalyzer;

pub const PERSIST_IN_EVENT: Descriptor = Descriptor {
    id: "GC0201",
    title: "Persistence operation started inside an event handler",
    severity: Severity::Error,
};

const DESCRIPTORS: [Descriptor; 1] = [PERSIST_IN_EVENT];

pub struct PersistenceInEventsAnalyzer;

impl GraphAnalyzer for PersistenceInEventsAnalyzer {
    fn descriptors(&self) -> &'static [Descriptor] {
        &DESCRIPTORS
    }

    fn should_analyze(&self, _acx: &AnalysisContext<'_>, model: &GraphEventModel) -> bool {
        model.graph.in_source
    }

    fn analyze(
        &self,
        acx: &AnalysisContext<'_>,
        model: &GraphEventModel,
    ) -> Result<(), Cancelled> {
        for event in model.events_declared_in_symbol() {
            acx.check_cancellation()?;

            let mut walker = NestedInvocationWalker::new(*acx);
            let mut visitor = SaveOperationVisitor {
                platform: acx.platform,
                event_type: event.event_type,
            };
            walker.walk(event.method, &mut visitor)?;
        }

        Ok(())
    }
}

struct SaveOperationVisitor<'a> {
    platform: &'a PlatformContext,
    event_type: EventType,
}

impl DeepVisitor for SaveOperationVisitor<'_> {
    fn on_call(&mut self, reporter: &mut WalkReporter<'_, '_>, site: &CallSite) {
        let Some(kind) = self.platform.save_operation_kind(site.method) else {
            return;
        };

        // The save pipeline calls RowPersisting precisely so handlers can
        // persist through the cache.
        let allowed = self.event_type == EventType::RowPersisting
            && kind == SaveOperationKind::CachePersist;
        if allowed {
            return;
        }

        reporter.report(
            &PERSIST_IN_EVENT,
            site.report_node,
            format!(
                "a persistence operation is reachable from this {} handler",
                self.event_type
            ),
        );
    }
}
