//! Shared per-pass analysis context.
//!
//! One [`AnalysisContext`] is assembled per compilation pass and passed
//! explicitly into every analyzer entry point. It owns nothing: all
//! fields are borrows whose lifetimes end with the pass.

use crate::cancel::{Cancelled, CancellationToken};
use crate::diagnostics::{Descriptor, Diagnostic, DiagnosticSink};
use crate::platform::PlatformContext;
use crate::settings::AnalysisSettings;
use crate::symbols::{Compilation, NodeId};

/// Borrowed bundle of everything an analyzer needs.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub compilation: &'a Compilation,
    pub platform: &'a PlatformContext,
    pub settings: &'a AnalysisSettings,
    pub sink: &'a DiagnosticSink,
    pub cancellation: &'a CancellationToken,
}

impl<'a> AnalysisContext<'a> {
    pub fn check_cancellation(&self) -> Result<(), Cancelled> {
        self.cancellation.check()
    }

    /// Report a plain finding at a node.
    pub fn report(&self, descriptor: &Descriptor, node: NodeId, message: impl Into<String>) {
        let diagnostic =
            Diagnostic::new(descriptor, self.compilation.location_of(node), message);
        self.report_diagnostic(diagnostic, node);
    }

    /// Report a prepared diagnostic, honoring suppression annotations at
    /// the node when the suppression mechanism is enabled.
    pub fn report_diagnostic(&self, diagnostic: Diagnostic, node: NodeId) {
        let suppressed = self.settings.suppression_mechanism_enabled
            && self.compilation.is_suppressed_at(node, &diagnostic.rule);

        if suppressed {
            self.sink.push_suppressed(diagnostic);
        } else {
            self.sink.push(diagnostic);
        }
    }
}
