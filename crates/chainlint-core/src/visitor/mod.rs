//! Visitor pattern for AST traversal.
//!
//! Provides a uniform way to traverse AST nodes with context information.
//! Hooks run before a node's children, so a visitor sees parents first.

mod context;
mod traits;

pub use context::VisitorContext;
pub use traits::AstVisitor;

use std::ops::ControlFlow;

use swc_ecma_ast::Module;
use swc_ecma_visit::{Visit, VisitWith};

struct Walker<'a, V: AstVisitor> {
    visitor: &'a mut V,
    ctx: &'a VisitorContext<'a>,
    stopped: bool,
}

macro_rules! walk_hook {
    ($method:ident, $node:ty) => {
        fn $method(&mut self, node: &$node) {
            if self.stopped {
                return;
            }
            if let ControlFlow::Break(()) = self.visitor.$method(node, self.ctx) {
                self.stopped = true;
                return;
            }
            node.visit_children_with(self);
        }
    };
}

impl<V: AstVisitor> Visit for Walker<'_, V> {
    walk_hook!(visit_bin_expr, swc_ecma_ast::BinExpr);
    walk_hook!(visit_member_expr, swc_ecma_ast::MemberExpr);
    walk_hook!(visit_tpl, swc_ecma_ast::Tpl);
    walk_hook!(visit_expr_or_spread, swc_ecma_ast::ExprOrSpread);
    walk_hook!(visit_spread_element, swc_ecma_ast::SpreadElement);
    walk_hook!(visit_jsx_expr_container, swc_ecma_ast::JSXExprContainer);
    walk_hook!(visit_jsx_spread_child, swc_ecma_ast::JSXSpreadChild);
}

pub fn walk_ast<V: AstVisitor>(module: &Module, visitor: &mut V, ctx: &VisitorContext) {
    let mut walker = Walker {
        visitor,
        ctx,
        stopped: false,
    };
    module.visit_with(&mut walker);
}
