//! Top-level `await` detection.
//!
//! CommonJS, AMD and UMD modules are evaluated synchronously, so an `await`
//! outside any function has nowhere to suspend. The output is still printed
//! as written; the uses are reported as diagnostics.

use swc_common::Span;
use swc_ecma_ast::{ArrowExpr, AwaitExpr, ForOfStmt, Function, Module, UsingDecl};
use swc_ecma_visit::{Visit, VisitWith};

/// Message attached to every reported use.
pub(crate) const MESSAGE: &str =
    "Top-level 'await' is only supported when the module kind is 'system' or 'esmodule'";

/// Returns the spans of `await` expressions, `for await` loops and
/// `await using` declarations that are not inside a function.
pub(crate) fn find(module: &Module) -> Vec<Span> {
    let mut finder = AwaitFinder::default();
    module.visit_with(&mut finder);
    finder.spans
}

#[derive(Default)]
struct AwaitFinder {
    function_depth: usize,
    spans: Vec<Span>,
}

impl AwaitFinder {
    fn record(&mut self, span: Span) {
        if self.function_depth == 0 {
            self.spans.push(span);
        }
    }
}

impl Visit for AwaitFinder {
    fn visit_function(&mut self, func: &Function) {
        self.function_depth += 1;
        func.visit_children_with(self);
        self.function_depth -= 1;
    }

    fn visit_arrow_expr(&mut self, func: &ArrowExpr) {
        self.function_depth += 1;
        func.visit_children_with(self);
        self.function_depth -= 1;
    }

    fn visit_await_expr(&mut self, expr: &AwaitExpr) {
        self.record(expr.span);
        expr.visit_children_with(self);
    }

    fn visit_for_of_stmt(&mut self, stmt: &ForOfStmt) {
        if stmt.is_await {
            self.record(stmt.span);
        }
        stmt.visit_children_with(self);
    }

    fn visit_using_decl(&mut self, decl: &UsingDecl) {
        if decl.is_await {
            self.record(decl.span);
        }
        decl.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_common::{sync::Lrc, FileName, SourceMap};
    use swc_ecma_ast::EsVersion;
    use swc_ecma_parser::{parse_file_as_module, Syntax, TsSyntax};

    fn awaits(source: &str) -> Vec<String> {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(Lrc::new(FileName::Anon), source.to_string());
        let module = parse_file_as_module(
            &fm,
            Syntax::Typescript(TsSyntax::default()),
            EsVersion::latest(),
            None,
            &mut vec![],
        )
        .unwrap();

        find(&module)
            .into_iter()
            .map(|span| {
                let lo = (span.lo.0 - fm.start_pos.0) as usize;
                let hi = (span.hi.0 - fm.start_pos.0) as usize;
                source[lo..hi].to_string()
            })
            .collect()
    }

    #[test]
    fn test_top_level_await_expression() {
        assert_eq!(
            awaits("export const config = await load();\n"),
            vec!["await load()"]
        );
    }

    #[test]
    fn test_await_inside_functions_is_ignored() {
        let source = r#"export async function a() { await x; }
export const b = async () => { await y; };
export class C { async run() { for await (const z of zs) {} } }
"#;
        assert!(awaits(source).is_empty());
    }

    #[test]
    fn test_top_level_for_await() {
        let found = awaits("for await (const line of lines) {}\nexport {};\n");
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with("for await"));
    }

    #[test]
    fn test_nested_await_inside_top_level_await() {
        let found = awaits("export const v = await Promise.all([await a, (async () => await b)()]);\n");
        assert_eq!(found.len(), 2);
    }
}
