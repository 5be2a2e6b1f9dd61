//! AstVisitor trait for uniform AST traversal.

use std::ops::ControlFlow;

use swc_ecma_ast::{
    BinExpr, ExprOrSpread, JSXExprContainer, JSXSpreadChild, MemberExpr, SpreadElement, Tpl,
};

use super::context::VisitorContext;

pub trait AstVisitor {
    fn visit_bin_expr(&mut self, _node: &BinExpr, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_member_expr(&mut self, _node: &MemberExpr, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_tpl(&mut self, _node: &Tpl, _ctx: &VisitorContext) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called for call/new arguments and array elements, spread or not.
    fn visit_expr_or_spread(
        &mut self,
        _node: &ExprOrSpread,
        _ctx: &VisitorContext,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_spread_element(
        &mut self,
        _node: &SpreadElement,
        _ctx: &VisitorContext,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_jsx_expr_container(
        &mut self,
        _node: &JSXExprContainer,
        _ctx: &VisitorContext,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn visit_jsx_spread_child(
        &mut self,
        _node: &JSXSpreadChild,
        _ctx: &VisitorContext,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}
