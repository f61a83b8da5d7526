//! Interprocedural body walker.
//!
//! [`NestedInvocationWalker`] follows invocations, property accessors,
//! object creations, and conditional-access chains from a root method
//! body into the bodies of the callees, when those have source, and keeps
//! walking there. Deep analyzers use it to detect conditions anywhere in
//! a call chain without re-walking methods or looping on recursion:
//!
//! - a method already on the current call path is never re-entered;
//! - a depth ceiling guards against call graphs that evade the path
//!   check (e.g. through differing generic instantiations);
//! - lambdas and anonymous methods are treated as opaque;
//! - a fixed set of platform core types is never descended into.
//!
//! Diagnostics raised during a walk are attributed to the outermost call
//! site of the current path, not the node where the condition was found,
//! and are deduplicated per (node, rule) pair. Messages must therefore
//! read sensibly when reported "at a distance".

use std::collections::{HashMap, HashSet};

use crate::cancel::Cancelled;
use crate::context::AnalysisContext;
use crate::diagnostics::{Descriptor, Diagnostic};
use crate::symbols::{
    Body, Expr, MethodId, NodeId, PropertyId, SemanticModel, SourceId, SymbolRef, TypeId,
};

/// Depth ceiling for the interprocedural walk; overridable through
/// settings.
pub const DEFAULT_MAX_WALK_DEPTH: usize = 100;

/// A resolved call site handed to visitor callbacks.
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    pub method: MethodId,
    /// The node of the call expression itself.
    pub node: NodeId,
    /// The node diagnostics should be reported on: the outermost call
    /// site of the current walk.
    pub report_node: NodeId,
}

/// A throw site handed to visitor callbacks.
#[derive(Debug, Clone, Copy)]
pub struct ThrowSite {
    pub exception: TypeId,
    pub node: NodeId,
    pub report_node: NodeId,
}

/// Callbacks a deep analyzer plugs into the walker.
pub trait DeepVisitor {
    /// Called for every resolved invocation, at any depth.
    fn on_call(&mut self, reporter: &mut WalkReporter<'_, '_>, site: &CallSite) {
        let _ = (reporter, site);
    }

    /// Called for every throw, at any depth.
    fn on_throw(&mut self, reporter: &mut WalkReporter<'_, '_>, site: &ThrowSite) {
        let _ = (reporter, site);
    }

    /// Whether to step into the callee's body. The walker's own guards
    /// (call path, depth, bypass set) apply regardless.
    fn descend_into(&mut self, method: MethodId) -> bool {
        let _ = method;
        true
    }
}

/// Deduplicating diagnostic reporter handed to visitor callbacks.
///
/// All reporting inside a walk must go through this reporter: it is what
/// enforces the one-diagnostic-per-(node, rule) contract.
pub struct WalkReporter<'w, 'a> {
    acx: AnalysisContext<'a>,
    reported: &'w mut HashSet<(NodeId, &'static str)>,
}

impl WalkReporter<'_, '_> {
    pub fn report(&mut self, descriptor: &Descriptor, node: NodeId, message: impl Into<String>) {
        if self.reported.insert((node, descriptor.id)) {
            self.acx.report(descriptor, node, message);
        }
    }

    pub fn report_diagnostic(
        &mut self,
        descriptor: &Descriptor,
        node: NodeId,
        diagnostic: Diagnostic,
    ) {
        if self.reported.insert((node, descriptor.id)) {
            self.acx.report_diagnostic(diagnostic, node);
        }
    }
}

/// Stateful, single-use-per-root interprocedural walker.
pub struct NestedInvocationWalker<'a> {
    acx: AnalysisContext<'a>,
    /// Per-source binding models, memoized for the walker's lifetime.
    semantic_models: HashMap<SourceId, SemanticModel>,
    reported: HashSet<(NodeId, &'static str)>,
    nodes_stack: Vec<NodeId>,
    methods_in_stack: HashSet<MethodId>,
    original_node: Option<NodeId>,
    bypass: HashSet<TypeId>,
    max_depth: usize,
}

impl<'a> NestedInvocationWalker<'a> {
    /// Create a walker with the default bypass set: the platform's graph,
    /// view, and cache types are never descended into.
    pub fn new(acx: AnalysisContext<'a>) -> Self {
        let bypass = [
            acx.platform.data_graph,
            acx.platform.data_view,
            acx.platform.record_cache,
        ]
        .into_iter()
        .collect();
        Self::with_bypass(acx, bypass)
    }

    pub fn with_bypass(acx: AnalysisContext<'a>, bypass: HashSet<TypeId>) -> Self {
        Self {
            acx,
            semantic_models: HashMap::new(),
            reported: HashSet::new(),
            nodes_stack: Vec::new(),
            methods_in_stack: HashSet::new(),
            original_node: None,
            bypass,
            max_depth: acx.settings.effective_walk_depth(),
        }
    }

    /// Walk the body of `root`, firing visitor callbacks along the way.
    /// A root without source is a no-op.
    pub fn walk(&mut self, root: MethodId, visitor: &mut dyn DeepVisitor) -> Result<(), Cancelled> {
        let compilation = self.acx.compilation;
        let Some(body) = compilation.method(root).body.as_ref() else {
            return Ok(());
        };
        self.walk_body(body, visitor)
    }

    fn walk_body(&mut self, body: &Body, visitor: &mut dyn DeepVisitor) -> Result<(), Cancelled> {
        self.walk_exprs(&body.exprs, visitor)
    }

    fn walk_exprs(
        &mut self,
        exprs: &[Expr],
        visitor: &mut dyn DeepVisitor,
    ) -> Result<(), Cancelled> {
        for expr in exprs {
            self.walk_expr(expr, visitor)?;
        }
        Ok(())
    }

    fn walk_expr(&mut self, expr: &Expr, visitor: &mut dyn DeepVisitor) -> Result<(), Cancelled> {
        self.acx.check_cancellation()?;

        match expr {
            Expr::Invocation { node, children } => {
                if let Some(method) = self.resolve_method(*node) {
                    let site = CallSite {
                        method,
                        node: *node,
                        report_node: self.report_node(*node),
                    };
                    let mut reporter = WalkReporter {
                        acx: self.acx,
                        reported: &mut self.reported,
                    };
                    visitor.on_call(&mut reporter, &site);
                    self.try_descend(method, *node, visitor)?;
                }
                self.walk_exprs(children, visitor)
            }
            Expr::PropertyGet { node, children } => {
                if let Some(getter) = self.resolve_property(*node).and_then(|p| {
                    self.acx.compilation.property(p).getter
                }) {
                    self.try_descend(getter, *node, visitor)?;
                }
                self.walk_exprs(children, visitor)
            }
            Expr::PropertySet { node, children } => {
                if let Some(setter) = self.resolve_property(*node).and_then(|p| {
                    self.acx.compilation.property(p).setter
                }) {
                    self.try_descend(setter, *node, visitor)?;
                }
                self.walk_exprs(children, visitor)
            }
            Expr::ObjectCreation { node, children } => {
                if let Some(constructor) = self.resolve_method(*node) {
                    self.try_descend(constructor, *node, visitor)?;
                }
                self.walk_exprs(children, visitor)
            }
            Expr::ConditionalAccess { node, children } => {
                let accessed = match self.resolve(*node) {
                    Some(SymbolRef::Method(m)) => Some(m),
                    Some(SymbolRef::Property(p)) => self.acx.compilation.property(p).getter,
                    _ => None,
                };
                if let Some(method) = accessed {
                    self.try_descend(method, *node, visitor)?;
                }
                self.walk_exprs(children, visitor)
            }
            Expr::Throw {
                node,
                exception,
                children,
            } => {
                let site = ThrowSite {
                    exception: *exception,
                    node: *node,
                    report_node: self.report_node(*node),
                };
                let mut reporter = WalkReporter {
                    acx: self.acx,
                    reported: &mut self.reported,
                };
                visitor.on_throw(&mut reporter, &site);
                self.walk_exprs(children, visitor)
            }
            // Lambdas are opaque: neither descended into nor scanned.
            Expr::Lambda { .. } => Ok(()),
            Expr::Block { children } => self.walk_exprs(children, visitor),
        }
    }

    fn try_descend(
        &mut self,
        method: MethodId,
        node: NodeId,
        visitor: &mut dyn DeepVisitor,
    ) -> Result<(), Cancelled> {
        if !self.recursion_enabled() {
            return Ok(());
        }

        let compilation = self.acx.compilation;
        let data = compilation.method(method);
        let Some(body) = data.body.as_ref() else {
            return Ok(());
        };
        if self.methods_in_stack.contains(&method)
            || self.bypass.contains(&data.containing_type)
            || !visitor.descend_into(method)
        {
            return Ok(());
        }

        self.push(node, method);
        let result = self.walk_body(body, visitor);
        self.pop(method);
        result
    }

    fn recursion_enabled(&self) -> bool {
        self.acx.settings.recursive_analysis_enabled && self.nodes_stack.len() <= self.max_depth
    }

    fn report_node(&self, node: NodeId) -> NodeId {
        self.original_node.unwrap_or(node)
    }

    fn push(&mut self, node: NodeId, method: MethodId) {
        if self.nodes_stack.is_empty() {
            self.original_node = Some(node);
        }
        self.nodes_stack.push(node);
        self.methods_in_stack.insert(method);
    }

    fn pop(&mut self, method: MethodId) {
        self.nodes_stack.pop();
        self.methods_in_stack.remove(&method);
        if self.nodes_stack.is_empty() {
            self.original_node = None;
        }
    }

    fn resolve(&mut self, node: NodeId) -> Option<SymbolRef> {
        let compilation = self.acx.compilation;
        let source = compilation.node(node).source;
        let model = self
            .semantic_models
            .entry(source)
            .or_insert_with(|| compilation.semantic_model(source));
        model.resolve(node)
    }

    fn resolve_method(&mut self, node: NodeId) -> Option<MethodId> {
        match self.resolve(node) {
            Some(SymbolRef::Method(m)) => Some(m),
            _ => None,
        }
    }

    fn resolve_property(&mut self, node: NodeId) -> Option<PropertyId> {
        match self.resolve(node) {
            Some(SymbolRef::Property(p)) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::diagnostics::{DiagnosticSink, Severity};
    use crate::platform::PlatformContext;
    use crate::settings::AnalysisSettings;
    use crate::symbols::{CompilationBuilder, SourceId};
    use crate::testkit;

    static WALK_RULE: Descriptor = Descriptor {
        id: "GC9997",
        title: "walker test rule",
        severity: Severity::Warning,
    };

    /// Visitor that reports on every call to a specific method.
    struct MatchVisitor {
        target: MethodId,
        calls_seen: usize,
    }

    impl DeepVisitor for MatchVisitor {
        fn on_call(&mut self, reporter: &mut WalkReporter<'_, '_>, site: &CallSite) {
            self.calls_seen += 1;
            if site.method == self.target {
                reporter.report(&WALK_RULE, site.report_node, "target reached");
            }
        }
    }

    struct TestProject {
        builder: CompilationBuilder,
        source: SourceId,
        graph: crate::symbols::TypeId,
        next_line: u32,
    }

    impl TestProject {
        fn new() -> (Self, testkit::PlatformTypes) {
            let (mut builder, platform) = testkit::platform_builder();
            let graph = testkit::declare_graph(&mut builder, &platform, "MyApp.OrderEntry");
            let source = builder.add_source("OrderEntry.cs");
            (
                Self {
                    builder,
                    source,
                    graph,
                    next_line: 1,
                },
                platform,
            )
        }

        fn method(&mut self, name: &str) -> MethodId {
            self.builder.declare_method(self.graph, name)
        }

        /// A node whose binding is the given method, plus the invocation
        /// expression referencing it.
        fn call(&mut self, callee: MethodId) -> Expr {
            let node = self.builder.add_node(self.source, self.next_line, 1);
            self.next_line += 1;
            self.builder.bind(node, SymbolRef::Method(callee));
            Expr::invocation(node)
        }

        fn finish(
            self,
        ) -> crate::symbols::Compilation {
            self.builder.build()
        }
    }

    fn run_walk(
        compilation: &crate::symbols::Compilation,
        root: MethodId,
        target: MethodId,
        settings: &AnalysisSettings,
    ) -> (crate::diagnostics::AnalysisOutcome, usize) {
        let platform = PlatformContext::resolve(compilation).unwrap();
        let sink = DiagnosticSink::new();
        let token = CancellationToken::new();
        let acx = AnalysisContext {
            compilation,
            platform: &platform,
            settings,
            sink: &sink,
            cancellation: &token,
        };

        let mut walker = NestedInvocationWalker::new(acx);
        let mut visitor = MatchVisitor {
            target,
            calls_seen: 0,
        };
        walker.walk(root, &mut visitor).unwrap();
        (sink.into_outcome(1), visitor.calls_seen)
    }

    #[test]
    fn test_deep_call_reported_at_root_call_site() {
        let (mut project, _platform) = TestProject::new();
        let root = project.method("Handler");
        let helper = project.method("Helper");
        let target = project.method("DoPersist");

        // Handler -> Helper -> DoPersist; the diagnostic must land on the
        // Handler-level call to Helper.
        let helper_call = project.call(helper);
        let root_call_node = match &helper_call {
            Expr::Invocation { node, .. } => *node,
            _ => unreachable!(),
        };
        let target_call = project.call(target);

        project.builder.set_body(root, Body::new(vec![helper_call]));
        project.builder.set_body(helper, Body::new(vec![target_call]));
        project.builder.set_body(target, Body::new(vec![]));

        let compilation = project.finish();
        let (outcome, _) = run_walk(&compilation, root, target, &AnalysisSettings::default());

        assert_eq!(outcome.diagnostics.len(), 1);
        let expected = compilation.location_of(root_call_node);
        assert_eq!(outcome.diagnostics[0].location, expected);
    }

    #[test]
    fn test_direct_recursion_terminates() {
        let (mut project, _platform) = TestProject::new();
        let root = project.method("Recursive");
        let target = project.method("DoPersist");

        let self_call = project.call(root);
        let target_call = project.call(target);
        project
            .builder
            .set_body(root, Body::new(vec![self_call, target_call]));
        project.builder.set_body(target, Body::new(vec![]));

        let compilation = project.finish();
        let (outcome, _) = run_walk(&compilation, root, target, &AnalysisSettings::default());

        // One finding attributed to the recursive call site (the walk
        // entered the body once more through it), one at the direct call.
        assert_eq!(outcome.diagnostics.len(), 2);
    }

    #[test]
    fn test_mutual_recursion_terminates_and_dedups() {
        let (mut project, _platform) = TestProject::new();
        let a = project.method("A");
        let b = project.method("B");
        let target = project.method("DoPersist");

        let b_call = project.call(b);
        let target_call_in_a = project.call(target);
        let a_call = project.call(a);
        let target_call_in_b = project.call(target);

        project
            .builder
            .set_body(a, Body::new(vec![b_call, target_call_in_a]));
        project
            .builder
            .set_body(b, Body::new(vec![a_call, target_call_in_b]));
        project.builder.set_body(target, Body::new(vec![]));

        let compilation = project.finish();
        let (outcome, calls_seen) = run_walk(&compilation, a, target, &AnalysisSettings::default());

        // Terminates, sees a bounded number of calls, and reports once per
        // distinct report node.
        assert!(calls_seen >= 2);
        assert_eq!(outcome.diagnostics.len(), 2);
    }

    #[test]
    fn test_recursive_analysis_toggle_stops_descent() {
        let (mut project, _platform) = TestProject::new();
        let root = project.method("Handler");
        let helper = project.method("Helper");
        let target = project.method("DoPersist");

        let helper_call = project.call(helper);
        let target_call = project.call(target);
        project.builder.set_body(root, Body::new(vec![helper_call]));
        project.builder.set_body(helper, Body::new(vec![target_call]));
        project.builder.set_body(target, Body::new(vec![]));

        let compilation = project.finish();
        let settings = AnalysisSettings {
            recursive_analysis_enabled: false,
            ..Default::default()
        };
        let (outcome, calls_seen) = run_walk(&compilation, root, target, &settings);

        // The direct call is still observed; the nested one is not.
        assert_eq!(calls_seen, 1);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_bypassed_platform_types_are_not_descended() {
        let (mut builder, platform) = testkit::platform_builder();
        let graph = testkit::declare_graph(&mut builder, &platform, "MyApp.OrderEntry");
        let source = builder.add_source("OrderEntry.cs");
        let root = builder.declare_method(graph, "Handler");
        let target = builder.declare_method(graph, "DoPersist");

        // Give the platform cache method a body that calls the target; it
        // must not be followed because RecordCache is bypassed.
        let inner_node = builder.add_node(source, 1, 1);
        builder.bind(inner_node, SymbolRef::Method(target));
        builder.set_body(
            platform.cache_persist,
            Body::new(vec![Expr::invocation(inner_node)]),
        );

        let outer_node = builder.add_node(source, 2, 1);
        builder.bind(outer_node, SymbolRef::Method(platform.cache_persist));
        builder.set_body(root, Body::new(vec![Expr::invocation(outer_node)]));
        builder.set_body(target, Body::new(vec![]));

        let compilation = builder.build();
        let (outcome, calls_seen) =
            run_walk(&compilation, root, target, &AnalysisSettings::default());

        assert_eq!(calls_seen, 1);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_lambda_bodies_are_opaque() {
        let (mut project, _platform) = TestProject::new();
        let root = project.method("Handler");
        let target = project.method("DoPersist");

        let inner_call = project.call(target);
        project.builder.set_body(
            root,
            Body::new(vec![Expr::Lambda {
                body: vec![inner_call],
            }]),
        );
        project.builder.set_body(target, Body::new(vec![]));

        let compilation = project.finish();
        let (outcome, calls_seen) =
            run_walk(&compilation, root, target, &AnalysisSettings::default());

        assert_eq!(calls_seen, 0);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_property_getter_is_descended() {
        let (mut project, platform) = TestProject::new();
        let root = project.method("Handler");
        let target = project.method("DoPersist");
        let getter = project.method("get_Total");

        let target_call = project.call(target);
        project.builder.set_body(getter, Body::new(vec![target_call]));
        project.builder.set_body(target, Body::new(vec![]));

        let graph = project.graph;
        let total = project.builder.declare_property(
            graph,
            "Total",
            crate::symbols::TypeRef::new(platform.string_type),
        );
        project.builder.set_getter(total, getter);

        let get_node = project.builder.add_node(project.source, 50, 1);
        project.builder.bind(get_node, SymbolRef::Property(total));
        project
            .builder
            .set_body(root, Body::new(vec![Expr::property_get(get_node)]));

        let compilation = project.finish();
        let (outcome, _) = run_walk(&compilation, root, target, &AnalysisSettings::default());

        assert_eq!(outcome.diagnostics.len(), 1);
        // Attributed to the property access at the root.
        assert_eq!(outcome.diagnostics[0].location.line, 50);
    }
}
