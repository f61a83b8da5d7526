//! Contract rules and the analysis entry point.
//!
//! Each rule declares the descriptors it owns and analyzes one of the
//! derived semantic models. Rules keyed off the same symbol kind share a
//! single dispatch through [`AnalyzerAggregator`], which builds each
//! model once and fans the rules out over it.

pub mod aggregator;

mod banned_api;
mod field_type;
mod key_fields;
mod persistence;
mod throwing;
mod undocumented;

pub use aggregator::AnalyzerAggregator;
pub use banned_api::BannedApiAnalyzer;
pub use field_type::FieldTypeAnalyzer;
pub use key_fields::KeyFieldsAnalyzer;
pub use persistence::PersistenceInEventsAnalyzer;
pub use throwing::ThrowingInEventsAnalyzer;
pub use undocumented::UndocumentedPublicAnalyzer;

use crate::cancel::{Cancelled, CancellationToken};
use crate::context::AnalysisContext;
use crate::diagnostics::{AnalysisOutcome, Descriptor, DiagnosticSink};
use crate::platform::PlatformContext;
use crate::semantic::entity_fields::EntityModel;
use crate::semantic::graph_model::GraphEventModel;
use crate::settings::AnalysisSettings;
use crate::symbols::{Compilation, TypeId};

/// A rule operating on the entity field model.
pub trait EntityAnalyzer: Send + Sync {
    fn descriptors(&self) -> &'static [Descriptor];

    fn should_analyze(&self, acx: &AnalysisContext<'_>, model: &EntityModel) -> bool {
        let _ = (acx, model);
        true
    }

    fn analyze(&self, acx: &AnalysisContext<'_>, model: &EntityModel) -> Result<(), Cancelled>;
}

/// A rule operating on the graph event model.
pub trait GraphAnalyzer: Send + Sync {
    fn descriptors(&self) -> &'static [Descriptor];

    fn should_analyze(&self, acx: &AnalysisContext<'_>, model: &GraphEventModel) -> bool {
        let _ = (acx, model);
        true
    }

    fn analyze(&self, acx: &AnalysisContext<'_>, model: &GraphEventModel)
        -> Result<(), Cancelled>;
}

/// A rule operating on any type symbol.
pub trait TypeAnalyzer: Send + Sync {
    fn descriptors(&self) -> &'static [Descriptor];

    fn analyze(&self, acx: &AnalysisContext<'_>, ty: TypeId) -> Result<(), Cancelled>;
}

/// Run all default rules against a compilation.
///
/// The whole analysis is gated off - returning an empty outcome - when
/// static analysis is disabled, the compilation is a test assembly, or
/// the platform is not referenced at all.
pub fn run_analysis(
    compilation: &Compilation,
    settings: &AnalysisSettings,
    cancellation: &CancellationToken,
) -> Result<AnalysisOutcome, Cancelled> {
    if !settings.static_analysis_enabled || compilation.is_test_assembly {
        return Ok(AnalysisOutcome::default());
    }

    let Some(platform) = PlatformContext::resolve(compilation) else {
        return Ok(AnalysisOutcome::default());
    };

    let sink = DiagnosticSink::new();
    let aggregator = AnalyzerAggregator::with_default_rules(settings);

    let analyzed_types = {
        let acx = AnalysisContext {
            compilation,
            platform: &platform,
            settings,
            sink: &sink,
            cancellation,
        };
        aggregator.run(&acx)?
    };

    Ok(sink.into_outcome(analyzed_types))
}

/// Descriptors of every default rule, for listing and documentation.
pub fn all_descriptors() -> Vec<Descriptor> {
    AnalyzerAggregator::with_default_rules(&AnalysisSettings::default()).descriptors()
}
