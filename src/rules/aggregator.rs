//! Shared dispatch for rules keyed off the same symbol kind.
//!
//! The aggregator walks the compilation's source-declared types once,
//! builds the relevant semantic model per type, and fans the registered
//! rules out against it: zero rules is a no-op, one runs inline, more
//! than one runs in parallel. Cancellation observed in any parallel
//! branch surfaces as a plain [`Cancelled`], never as a batch failure.

use rayon::prelude::*;

use crate::cancel::Cancelled;
use crate::context::AnalysisContext;
use crate::diagnostics::Descriptor;
use crate::semantic::entity_fields::EntityModel;
use crate::semantic::graph_model::GraphEventModel;
use crate::settings::AnalysisSettings;
use crate::symbols::TypeId;

use super::{
    BannedApiAnalyzer, EntityAnalyzer, FieldTypeAnalyzer, GraphAnalyzer, KeyFieldsAnalyzer,
    PersistenceInEventsAnalyzer, ThrowingInEventsAnalyzer, TypeAnalyzer,
    UndocumentedPublicAnalyzer,
};

/// Aggregated rule dispatch over one compilation.
#[derive(Default)]
pub struct AnalyzerAggregator {
    entity_analyzers: Vec<Box<dyn EntityAnalyzer>>,
    graph_analyzers: Vec<Box<dyn GraphAnalyzer>>,
    type_analyzers: Vec<Box<dyn TypeAnalyzer>>,
}

impl AnalyzerAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default rule set.
    pub fn with_default_rules(settings: &AnalysisSettings) -> Self {
        let mut aggregator = Self::new();
        aggregator.add_entity_analyzer(Box::new(FieldTypeAnalyzer));
        aggregator.add_entity_analyzer(Box::new(KeyFieldsAnalyzer));
        aggregator.add_entity_analyzer(Box::new(UndocumentedPublicAnalyzer));
        aggregator.add_graph_analyzer(Box::new(PersistenceInEventsAnalyzer));
        aggregator.add_graph_analyzer(Box::new(ThrowingInEventsAnalyzer));
        aggregator.add_type_analyzer(Box::new(BannedApiAnalyzer::new(settings)));
        aggregator
    }

    pub fn add_entity_analyzer(&mut self, analyzer: Box<dyn EntityAnalyzer>) {
        self.entity_analyzers.push(analyzer);
    }

    pub fn add_graph_analyzer(&mut self, analyzer: Box<dyn GraphAnalyzer>) {
        self.graph_analyzers.push(analyzer);
    }

    pub fn add_type_analyzer(&mut self, analyzer: Box<dyn TypeAnalyzer>) {
        self.type_analyzers.push(analyzer);
    }

    /// Descriptors owned by every registered rule.
    pub fn descriptors(&self) -> Vec<Descriptor> {
        let entity = self.entity_analyzers.iter().flat_map(|a| a.descriptors());
        let graph = self.graph_analyzers.iter().flat_map(|a| a.descriptors());
        let ty = self.type_analyzers.iter().flat_map(|a| a.descriptors());
        entity.chain(graph).chain(ty).copied().collect()
    }

    /// Analyze every source-declared type. Returns the number of types
    /// examined.
    pub fn run(&self, acx: &AnalysisContext<'_>) -> Result<usize, Cancelled> {
        let mut analyzed = 0;

        for (ty, data) in acx.compilation.all_types() {
            acx.check_cancellation()?;
            if !data.in_source() {
                continue;
            }
            analyzed += 1;
            self.analyze_type(acx, ty)?;
        }

        Ok(analyzed)
    }

    fn analyze_type(&self, acx: &AnalysisContext<'_>, ty: TypeId) -> Result<(), Cancelled> {
        if let Some(model) =
            EntityModel::infer(acx.platform, acx.compilation, ty, acx.cancellation)?
        {
            let effective: Vec<&dyn EntityAnalyzer> = self
                .entity_analyzers
                .iter()
                .map(|a| a.as_ref())
                .filter(|a| a.should_analyze(acx, &model))
                .collect();
            run_aggregated(&effective, |analyzer| analyzer.analyze(acx, &model))?;
        } else if let Some(model) =
            GraphEventModel::infer(acx.platform, acx.compilation, ty, acx.cancellation)?
        {
            let effective: Vec<&dyn GraphAnalyzer> = self
                .graph_analyzers
                .iter()
                .map(|a| a.as_ref())
                .filter(|a| a.should_analyze(acx, &model))
                .collect();
            run_aggregated(&effective, |analyzer| analyzer.analyze(acx, &model))?;
        }

        let type_rules: Vec<&dyn TypeAnalyzer> =
            self.type_analyzers.iter().map(|a| a.as_ref()).collect();
        run_aggregated(&type_rules, |analyzer| analyzer.analyze(acx, ty))
    }
}

/// Fan a set of rules out against one model: none is a no-op, one runs
/// inline, several run in parallel. Any cancelled branch cancels the
/// whole dispatch.
fn run_aggregated<A: ?Sized + Sync>(
    analyzers: &[&A],
    action: impl Fn(&A) -> Result<(), Cancelled> + Sync,
) -> Result<(), Cancelled> {
    match analyzers.len() {
        0 => Ok(()),
        1 => action(analyzers[0]),
        _ => analyzers
            .par_iter()
            .map(|analyzer| action(analyzer))
            .collect::<Result<(), Cancelled>>(),
    }
}
