//! Graphcheck - framework contract analyzer.
//!
//! Graphcheck inspects code written against the Summit application
//! platform's domain model (table records, record extensions, business
//! graphs, lifecycle event handlers) and reports semantic violations of
//! the platform's contracts. It performs purely static reasoning over a
//! compilation snapshot supplied by an external compiler front end; no
//! analyzed code is ever executed.
//!
//! # Architecture
//!
//! - `symbols`: the compilation snapshot (symbol arena, syntax nodes,
//!   semantic models) - the input boundary
//! - `platform`: well-known platform type resolution; fails closed when
//!   the platform is not referenced
//! - `semantic`: derived models - entity fields, extension chains,
//!   attribute composition, graph event classification
//! - `walker`: bounded-depth, cycle-safe interprocedural body walker
//! - `rules`: contract rules plus the aggregator that fans them out
//! - `diagnostics` / `report`: findings and their renderings
//! - `settings`: feature toggles passed explicitly through every entry
//!   point
//!
//! # Adding a New Rule
//!
//! Implement one of the analyzer traits in `rules` (entity, graph, or
//! type scoped), declare its descriptors, and register it in
//! `AnalyzerAggregator::with_default_rules`.

pub mod cancel;
pub mod cli;
pub mod context;
pub mod diagnostics;
pub mod platform;
pub mod report;
pub mod rules;
pub mod semantic;
pub mod settings;
pub mod symbols;
pub mod testkit;
pub mod walker;

pub use cancel::{CancellationToken, Cancelled};
pub use context::AnalysisContext;
pub use diagnostics::{AnalysisOutcome, Diagnostic, Severity};
pub use platform::PlatformContext;
pub use rules::{run_analysis, AnalyzerAggregator};
pub use settings::AnalysisSettings;
pub use symbols::{Compilation, CompilationBuilder};
pub use walker::NestedInvocationWalker;
