//! Forbidden API usage.
//!
//! The settings file lists full symbol names (or globs) that analyzed
//! code must not reference. Unlike the deep event rules this is a direct
//! usage scan: every bound call, property access, and construction in
//! every source-declared body of the type is matched, including inside
//! lambdas, but calls are not followed into other methods.

use std::collections::HashMap;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::cancel::Cancelled;
use crate::context::AnalysisContext;
use crate::diagnostics::{Descriptor, Severity};
use crate::settings::{AnalysisSettings, BannedApi};
use crate::symbols::{Compilation, Expr, NodeId, SemanticModel, SourceId, SymbolRef, TypeId};

use super::TypeAnalyzer;

pub const BANNED_API: Descriptor = Descriptor {
    id: "GC0301",
    title: "Use of a banned API",
    severity: Severity::Error,
};

const DESCRIPTORS: [Descriptor; 1] = [BANNED_API];

pub struct BannedApiAnalyzer {
    matcher: Option<GlobSet>,
    entries: Vec<BannedApi>,
}

impl BannedApiAnalyzer {
    /// Precompile the ban list. An invalid pattern is skipped here;
    /// settings validation reports it to the user up front.
    pub fn new(settings: &AnalysisSettings) -> Self {
        if settings.banned_apis.is_empty() {
            return Self {
                matcher: None,
                entries: Vec::new(),
            };
        }

        let mut builder = GlobSetBuilder::new();
        let mut entries = Vec::new();
        for banned in &settings.banned_apis {
            if let Ok(glob) = Glob::new(&banned.path) {
                builder.add(glob);
                entries.push(banned.clone());
            }
        }

        Self {
            matcher: builder.build().ok(),
            entries,
        }
    }

    fn check_node(
        &self,
        acx: &AnalysisContext<'_>,
        models: &mut HashMap<SourceId, SemanticModel>,
        node: NodeId,
    ) {
        let Some(matcher) = &self.matcher else {
            return;
        };
        let compilation = acx.compilation;
        let source = compilation.node(node).source;
        let model = models
            .entry(source)
            .or_insert_with(|| compilation.semantic_model(source));

        let Some(symbol) = model.resolve(node) else {
            return;
        };
        let full_name = symbol_full_name(compilation, symbol);

        let matches = matcher.matches(&full_name);
        let Some(&first) = matches.first() else {
            return;
        };

        let mut message = format!("'{}' is a banned API", full_name);
        if let Some(reason) = &self.entries[first].reason {
            message.push_str(": ");
            message.push_str(reason);
        }
        acx.report(&BANNED_API, node, message);
    }

    fn scan_exprs(
        &self,
        acx: &AnalysisContext<'_>,
        models: &mut HashMap<SourceId, SemanticModel>,
        exprs: &[Expr],
    ) -> Result<(), Cancelled> {
        for expr in exprs {
            acx.check_cancellation()?;
            match expr {
                Expr::Invocation { node, children }
                | Expr::PropertyGet { node, children }
                | Expr::PropertySet { node, children }
                | Expr::ObjectCreation { node, children }
                | Expr::ConditionalAccess { node, children } => {
                    self.check_node(acx, models, *node);
                    self.scan_exprs(acx, models, children)?;
                }
                Expr::Throw { children, .. } | Expr::Block { children } => {
                    self.scan_exprs(acx, models, children)?;
                }
                Expr::Lambda { body } => {
                    self.scan_exprs(acx, models, body)?;
                }
            }
        }
        Ok(())
    }
}

impl TypeAnalyzer for BannedApiAnalyzer {
    fn descriptors(&self) -> &'static [Descriptor] {
        &DESCRIPTORS
    }

    fn analyze(&self, acx: &AnalysisContext<'_>, ty: TypeId) -> Result<(), Cancelled> {
        if self.matcher.is_none() {
            return Ok(());
        }

        let mut models: HashMap<SourceId, SemanticModel> = HashMap::new();
        for &method in &acx.compilation.type_data(ty).methods {
            acx.check_cancellation()?;
            let Some(body) = acx.compilation.method(method).body.as_ref() else {
                continue;
            };
            self.scan_exprs(acx, &mut models, &body.exprs)?;
        }

        Ok(())
    }
}

fn symbol_full_name(compilation: &Compilation, symbol: SymbolRef) -> String {
    match symbol {
        SymbolRef::Type(t) => compilation.type_data(t).full_name.clone(),
        SymbolRef::Method(m) => {
            let method = compilation.method(m);
            format!(
                "{}.{}",
                compilation.type_data(method.containing_type).full_name,
                method.name
            )
        }
        SymbolRef::Property(p) => {
            let property = compilation.property(p);
            format!(
                "{}.{}",
                compilation.type_data(property.containing_type).full_name,
                property.name
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::diagnostics::DiagnosticSink;
    use crate::symbols::Body;
    use crate::testkit;

    fn settings_banning(path: &str, reason: Option<&str>) -> AnalysisSettings {
        AnalysisSettings {
            banned_apis: vec![BannedApi {
                path: path.to_string(),
                reason: reason.map(|r| r.to_string()),
            }],
            ..Default::default()
        }
    }

    fn run(
        builder: crate::symbols::CompilationBuilder,
        ty: crate::symbols::TypeId,
        settings: &AnalysisSettings,
    ) -> crate::diagnostics::AnalysisOutcome {
        let compilation = builder.build();
        let platform = crate::platform::PlatformContext::resolve(&compilation).unwrap();
        let sink = DiagnosticSink::new();
        let token = CancellationToken::new();
        let acx = AnalysisContext {
            compilation: &compilation,
            platform: &platform,
            settings,
            sink: &sink,
            cancellation: &token,
        };

        BannedApiAnalyzer::new(settings).analyze(&acx, ty).unwrap();
        sink.into_outcome(1)
    }

    #[test]
    fn test_banned_call_reported_with_reason() {
        let (mut builder, platform) = testkit::platform_builder();
        let graph = testkit::declare_graph(&mut builder, &platform, "MyApp.OrderEntry");
        let source = builder.add_source("OrderEntry.cs");

        let method = builder.declare_method(graph, "DoWork");
        let node = builder.add_node(source, 3, 1);
        builder.bind(node, SymbolRef::Method(platform.graph_persist));
        builder.set_body(method, Body::new(vec![Expr::invocation(node)]));

        let settings = settings_banning(
            "Summit.Data.DataGraph.Persist",
            Some("use the save action instead"),
        );
        let outcome = run(builder, graph, &settings);

        assert_eq!(outcome.diagnostics.len(), 1);
        let diagnostic = &outcome.diagnostics[0];
        assert_eq!(diagnostic.rule, "GC0301");
        assert!(diagnostic.message.contains("use the save action instead"));
    }

    #[test]
    fn test_glob_pattern_matches_namespace() {
        let (mut builder, platform) = testkit::platform_builder();
        let reflection = builder.declare_type("System.Reflection.Assembly");
        let load = builder.declare_method(reflection, "Load");

        let graph = testkit::declare_graph(&mut builder, &platform, "MyApp.OrderEntry");
        let source = builder.add_source("OrderEntry.cs");
        let method = builder.declare_method(graph, "DoWork");
        let node = builder.add_node(source, 3, 1);
        builder.bind(node, SymbolRef::Method(load));

        // Banned usage inside a lambda is still a direct usage.
        builder.set_body(
            method,
            Body::new(vec![Expr::Lambda {
                body: vec![Expr::invocation(node)],
            }]),
        );

        let settings = settings_banning("System.Reflection.*", None);
        let outcome = run(builder, graph, &settings);
        assert_eq!(outcome.diagnostics.len(), 1);
    }

    #[test]
    fn test_empty_ban_list_is_noop() {
        let (mut builder, platform) = testkit::platform_builder();
        let graph = testkit::declare_graph(&mut builder, &platform, "MyApp.OrderEntry");
        let source = builder.add_source("OrderEntry.cs");
        let method = builder.declare_method(graph, "DoWork");
        let node = builder.add_node(source, 3, 1);
        builder.bind(node, SymbolRef::Method(platform.graph_persist));
        builder.set_body(method, Body::new(vec![Expr::invocation(node)]));

        let outcome = run(builder, graph, &AnalysisSettings::default());
        assert!(outcome.diagnostics.is_empty());
    }
}
