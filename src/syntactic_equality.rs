// SPDX-License-Identifier: Apache-2.0

//! Exact syntactic comparison of two blocks modulo a positional renaming of
//! their free identifiers.

use std::collections::HashMap;

use crate::ast::{Block, Expression, Statement, TypedName};
use crate::identifier_classifier::Identity;

/// Decides whether two blocks are identical once every free reference is
/// replaced by its position in that block's own free-reference list.
///
/// Implementations must be pure and deterministic: position `i` of
/// `lhs_free` is aligned with position `i` of `rhs_free`.
pub trait EqualityOracle {
    fn equal(&self, lhs: &Block, lhs_free: &[String], rhs: &Block, rhs_free: &[String]) -> bool;
}

/// Lockstep structural comparison.
///
/// Names declared inside the compared blocks are paired up in declaration
/// order; a declaration is visible to its own initializer, the same rule the
/// fingerprinting uses. Names that resolve neither to a declaration nor to a
/// free-list position make the blocks unequal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntacticEquality;

impl EqualityOracle for SyntacticEquality {
    fn equal(&self, lhs: &Block, lhs_free: &[String], rhs: &Block, rhs_free: &[String]) -> bool {
        if lhs_free.len() != rhs_free.len() {
            return false;
        }
        let mut comparer = LockstepComparer::new(lhs_free, rhs_free);
        let result = comparer.block_equal(lhs, rhs);
        log::trace!("SyntacticEquality::equal; result: {}", result);
        result
    }
}

struct Scopes {
    frames: Vec<HashMap<String, Identity>>,
}

impl Scopes {
    fn with_free_names(free: &[String]) -> Self {
        let mut frame = HashMap::new();
        for (i, name) in free.iter().enumerate() {
            frame.entry(name.clone()).or_insert(Identity::Free(i));
        }
        Self {
            frames: vec![frame],
        }
    }

    fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn declare(&mut self, name: &str, identity: Identity) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), identity);
        }
    }

    fn resolve(&self, name: &str) -> Option<Identity> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }
}

struct LockstepComparer {
    lhs: Scopes,
    rhs: Scopes,
    next_local: usize,
}

impl LockstepComparer {
    fn new(lhs_free: &[String], rhs_free: &[String]) -> Self {
        Self {
            lhs: Scopes::with_free_names(lhs_free),
            rhs: Scopes::with_free_names(rhs_free),
            next_local: 0,
        }
    }

    fn push_scope(&mut self) {
        self.lhs.push();
        self.rhs.push();
    }

    fn pop_scope(&mut self) {
        self.lhs.pop();
        self.rhs.pop();
    }

    /// Declares the pairs `(lhs[i], rhs[i])` as the same fresh local. Types
    /// must match.
    fn declare_pairwise(&mut self, lhs: &[TypedName], rhs: &[TypedName]) -> bool {
        if lhs.len() != rhs.len() {
            return false;
        }
        for (l, r) in lhs.iter().zip(rhs.iter()) {
            if l.ty != r.ty {
                return false;
            }
            let identity = Identity::Local(self.next_local);
            self.next_local += 1;
            self.lhs.declare(&l.name, identity);
            self.rhs.declare(&r.name, identity);
        }
        true
    }

    fn name_equal(&self, lhs: &str, rhs: &str) -> bool {
        match (self.lhs.resolve(lhs), self.rhs.resolve(rhs)) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        }
    }

    fn block_equal(&mut self, lhs: &Block, rhs: &Block) -> bool {
        if lhs.statements.len() != rhs.statements.len() {
            return false;
        }
        self.push_scope();
        let result = self.statements_equal(&lhs.statements, &rhs.statements);
        self.pop_scope();
        result
    }

    fn statements_equal(&mut self, lhs: &[Statement], rhs: &[Statement]) -> bool {
        lhs.len() == rhs.len()
            && lhs
                .iter()
                .zip(rhs.iter())
                .all(|(l, r)| self.statement_equal(l, r))
    }

    fn statement_equal(&mut self, lhs: &Statement, rhs: &Statement) -> bool {
        match (lhs, rhs) {
            (Statement::ExpressionStatement(l), Statement::ExpressionStatement(r)) => {
                self.expression_equal(&l.expression, &r.expression)
            }
            (Statement::Assignment(l), Statement::Assignment(r)) => {
                l.variable_names.len() == r.variable_names.len()
                    && l.variable_names
                        .iter()
                        .zip(r.variable_names.iter())
                        .all(|(lv, rv)| self.name_equal(&lv.name, &rv.name))
                    && self.expression_equal(&l.value, &r.value)
            }
            (Statement::VariableDeclaration(l), Statement::VariableDeclaration(r)) => {
                if !self.declare_pairwise(&l.variables, &r.variables) {
                    return false;
                }
                match (&l.value, &r.value) {
                    (None, None) => true,
                    (Some(lv), Some(rv)) => self.expression_equal(lv, rv),
                    _ => false,
                }
            }
            (Statement::FunctionDefinition(l), Statement::FunctionDefinition(r)) => {
                if l.name != r.name {
                    return false;
                }
                self.push_scope();
                let result = self.declare_pairwise(&l.parameters, &r.parameters)
                    && self.declare_pairwise(&l.return_variables, &r.return_variables)
                    && self.block_equal(&l.body, &r.body);
                self.pop_scope();
                result
            }
            (Statement::If(l), Statement::If(r)) => {
                self.expression_equal(&l.condition, &r.condition)
                    && self.block_equal(&l.body, &r.body)
            }
            (Statement::Switch(l), Statement::Switch(r)) => {
                self.expression_equal(&l.expression, &r.expression)
                    && l.cases.len() == r.cases.len()
                    && l.cases
                        .iter()
                        .zip(r.cases.iter())
                        .all(|(lc, rc)| lc.value == rc.value && self.block_equal(&lc.body, &rc.body))
            }
            (Statement::ForLoop(l), Statement::ForLoop(r)) => {
                // The init block's declarations stay visible for the whole loop.
                self.push_scope();
                let result = self.statements_equal(&l.pre.statements, &r.pre.statements)
                    && self.expression_equal(&l.condition, &r.condition)
                    && self.block_equal(&l.post, &r.post)
                    && self.block_equal(&l.body, &r.body);
                self.pop_scope();
                result
            }
            (Statement::Break, Statement::Break) => true,
            (Statement::Continue, Statement::Continue) => true,
            (Statement::Block(l), Statement::Block(r)) => self.block_equal(l, r),
            _ => false,
        }
    }

    fn expression_equal(&mut self, lhs: &Expression, rhs: &Expression) -> bool {
        match (lhs, rhs) {
            (Expression::Literal(l), Expression::Literal(r)) => l == r,
            (Expression::Identifier(l), Expression::Identifier(r)) => {
                self.name_equal(&l.name, &r.name)
            }
            (Expression::BuiltinCall(l), Expression::BuiltinCall(r)) => {
                l.builtin == r.builtin && self.arguments_equal(&l.arguments, &r.arguments)
            }
            (Expression::FunctionCall(l), Expression::FunctionCall(r)) => {
                l.function_name == r.function_name
                    && self.arguments_equal(&l.arguments, &r.arguments)
            }
            _ => false,
        }
    }

    fn arguments_equal(&mut self, lhs: &[Expression], rhs: &[Expression]) -> bool {
        lhs.len() == rhs.len()
            && lhs
                .iter()
                .zip(rhs.iter())
                .all(|(l, r)| self.expression_equal(l, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_block;
    use test_case::test_case;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn oracle_equal(lhs: &str, lhs_free: &[&str], rhs: &str, rhs_free: &[&str]) -> bool {
        let lhs = parse_block(lhs).unwrap();
        let rhs = parse_block(rhs).unwrap();
        SyntacticEquality.equal(&lhs, &names(lhs_free), &rhs, &names(rhs_free))
    }

    #[test_case("{ x := add(a, 1) }", &["x", "a"], "{ y := add(b, 1) }", &["y", "b"], true; "renamed free names")]
    #[test_case("{ x := add(a, 1) }", &["x", "a"], "{ y := add(b, 1) }", &["b", "y"], false; "misaligned free lists")]
    #[test_case("{ x := add(a, 1) }", &["x", "a"], "{ x := sub(a, 1) }", &["x", "a"], false; "different builtin")]
    #[test_case("{ x := add(a, 1) }", &["x", "a"], "{ x := add(a, 2) }", &["x", "a"], false; "different literal")]
    #[test_case("{ let t := a }", &["a"], "{ let u := b }", &["b"], true; "renamed locals")]
    #[test_case("{ let t := a t := 1 }", &["a"], "{ let u := b b := 1 }", &["b"], false; "local vs free target")]
    #[test_case("{ f(a) }", &["a"], "{ g(a) }", &["a"], false; "different callee")]
    #[test_case("{ break }", &[], "{ continue }", &[], false; "break vs continue")]
    #[test_case("{ x := a }", &["x", "a"], "{ x := a }", &["x"], false; "free list length differs")]
    fn test_equality(lhs: &str, lhs_free: &[&str], rhs: &str, rhs_free: &[&str], want: bool) {
        assert_eq!(oracle_equal(lhs, lhs_free, rhs, rhs_free), want);
    }

    #[test]
    fn test_for_loop_init_scope_spans_loop() {
        assert!(oracle_equal(
            "{ for { let i := 0 } lt(i, n) { i := add(i, 1) } { mstore(i, 0) } }",
            &["n"],
            "{ for { let j := 0 } lt(j, m) { j := add(j, 1) } { mstore(j, 0) } }",
            &["m"],
        ));
    }

    #[test]
    fn test_function_parameters_pair_by_position() {
        assert!(oracle_equal(
            "{ function f(a, b) -> r { r := sub(a, b) } }",
            &[],
            "{ function f(x, y) -> z { z := sub(x, y) } }",
            &[],
        ));
        assert!(!oracle_equal(
            "{ function f(a, b) -> r { r := sub(a, b) } }",
            &[],
            "{ function f(x, y) -> z { z := sub(y, x) } }",
            &[],
        ));
    }

    #[test]
    fn test_unresolved_name_is_unequal() {
        assert!(!oracle_equal("{ pop(a) }", &[], "{ pop(a) }", &[]));
    }

    #[test]
    fn test_inner_declaration_does_not_leak_out_of_block() {
        // After the nested block, `t` refers to the free `t` again on the left
        // but to a different free name on the right.
        assert!(!oracle_equal(
            "{ { let t := 1 } pop(t) pop(s) }",
            &["t", "s"],
            "{ { let t := 1 } pop(s) pop(t) }",
            &["t", "s"],
        ));
        assert!(oracle_equal(
            "{ { let t := 1 } pop(t) }",
            &["t"],
            "{ { let u := 1 } pop(v) }",
            &["v"],
        ));
    }
}
