// SPDX-License-Identifier: Apache-2.0

//! Generic pre-order traversal over the AST.
//!
//! Implementors override the hooks for the node kinds they care about and
//! call the matching `walk_*` function wherever the default descent into
//! children is wanted.

use crate::ast::{
    Assignment, Block, BuiltinCall, Expression, ExpressionStatement, ForLoop, FunctionCall,
    FunctionDefinition, Identifier, If, Literal, Statement, Switch, VariableDeclaration,
};

pub trait AstVisitor<'a>: Sized {
    type Error;

    fn visit_statement(&mut self, statement: &'a Statement) -> Result<(), Self::Error> {
        walk_statement(self, statement)
    }

    fn visit_expression(&mut self, expression: &'a Expression) -> Result<(), Self::Error> {
        walk_expression(self, expression)
    }

    fn visit_literal(&mut self, _literal: &'a Literal) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_identifier(&mut self, _identifier: &'a Identifier) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_builtin_call(&mut self, call: &'a BuiltinCall) -> Result<(), Self::Error> {
        walk_arguments(self, &call.arguments)
    }

    fn visit_function_call(&mut self, call: &'a FunctionCall) -> Result<(), Self::Error> {
        walk_arguments(self, &call.arguments)
    }

    fn visit_expression_statement(
        &mut self,
        statement: &'a ExpressionStatement,
    ) -> Result<(), Self::Error> {
        self.visit_expression(&statement.expression)
    }

    fn visit_assignment(&mut self, assignment: &'a Assignment) -> Result<(), Self::Error> {
        walk_assignment(self, assignment)
    }

    fn visit_variable_declaration(
        &mut self,
        declaration: &'a VariableDeclaration,
    ) -> Result<(), Self::Error> {
        walk_variable_declaration(self, declaration)
    }

    fn visit_if(&mut self, if_: &'a If) -> Result<(), Self::Error> {
        self.visit_expression(&if_.condition)?;
        self.visit_block(&if_.body)
    }

    fn visit_switch(&mut self, switch: &'a Switch) -> Result<(), Self::Error> {
        walk_switch(self, switch)
    }

    fn visit_for_loop(&mut self, for_loop: &'a ForLoop) -> Result<(), Self::Error> {
        walk_for_loop(self, for_loop)
    }

    fn visit_break(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_continue(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_function_definition(
        &mut self,
        definition: &'a FunctionDefinition,
    ) -> Result<(), Self::Error> {
        self.visit_block(&definition.body)
    }

    fn visit_block(&mut self, block: &'a Block) -> Result<(), Self::Error> {
        walk_block(self, block)
    }
}

pub fn walk_statement<'a, V: AstVisitor<'a>>(
    visitor: &mut V,
    statement: &'a Statement,
) -> Result<(), V::Error> {
    match statement {
        Statement::ExpressionStatement(s) => visitor.visit_expression_statement(s),
        Statement::Assignment(a) => visitor.visit_assignment(a),
        Statement::VariableDeclaration(d) => visitor.visit_variable_declaration(d),
        Statement::FunctionDefinition(d) => visitor.visit_function_definition(d),
        Statement::If(i) => visitor.visit_if(i),
        Statement::Switch(s) => visitor.visit_switch(s),
        Statement::ForLoop(l) => visitor.visit_for_loop(l),
        Statement::Break => visitor.visit_break(),
        Statement::Continue => visitor.visit_continue(),
        Statement::Block(b) => visitor.visit_block(b),
    }
}

pub fn walk_expression<'a, V: AstVisitor<'a>>(
    visitor: &mut V,
    expression: &'a Expression,
) -> Result<(), V::Error> {
    match expression {
        Expression::Literal(l) => visitor.visit_literal(l),
        Expression::Identifier(i) => visitor.visit_identifier(i),
        Expression::BuiltinCall(c) => visitor.visit_builtin_call(c),
        Expression::FunctionCall(c) => visitor.visit_function_call(c),
    }
}

pub fn walk_arguments<'a, V: AstVisitor<'a>>(
    visitor: &mut V,
    arguments: &'a [Expression],
) -> Result<(), V::Error> {
    for argument in arguments.iter() {
        visitor.visit_expression(argument)?;
    }
    Ok(())
}

pub fn walk_assignment<'a, V: AstVisitor<'a>>(
    visitor: &mut V,
    assignment: &'a Assignment,
) -> Result<(), V::Error> {
    for name in assignment.variable_names.iter() {
        visitor.visit_identifier(name)?;
    }
    visitor.visit_expression(&assignment.value)
}

pub fn walk_variable_declaration<'a, V: AstVisitor<'a>>(
    visitor: &mut V,
    declaration: &'a VariableDeclaration,
) -> Result<(), V::Error> {
    match &declaration.value {
        Some(value) => visitor.visit_expression(value),
        None => Ok(()),
    }
}

pub fn walk_switch<'a, V: AstVisitor<'a>>(
    visitor: &mut V,
    switch: &'a Switch,
) -> Result<(), V::Error> {
    visitor.visit_expression(&switch.expression)?;
    for case in switch.cases.iter() {
        if let Some(value) = &case.value {
            visitor.visit_literal(value)?;
        }
        visitor.visit_block(&case.body)?;
    }
    Ok(())
}

pub fn walk_for_loop<'a, V: AstVisitor<'a>>(
    visitor: &mut V,
    for_loop: &'a ForLoop,
) -> Result<(), V::Error> {
    visitor.visit_block(&for_loop.pre)?;
    visitor.visit_expression(&for_loop.condition)?;
    visitor.visit_block(&for_loop.post)?;
    visitor.visit_block(&for_loop.body)
}

pub fn walk_block<'a, V: AstVisitor<'a>>(
    visitor: &mut V,
    block: &'a Block,
) -> Result<(), V::Error> {
    for statement in block.statements.iter() {
        visitor.visit_statement(statement)?;
    }
    Ok(())
}

/// Collects every block of a tree in pre-order, the root included.
pub fn collect_blocks(root: &Block) -> Vec<&Block> {
    struct Collector<'a> {
        blocks: Vec<&'a Block>,
    }

    impl<'a> AstVisitor<'a> for Collector<'a> {
        type Error = std::convert::Infallible;

        fn visit_block(&mut self, block: &'a Block) -> Result<(), Self::Error> {
            self.blocks.push(block);
            walk_block(self, block)
        }
    }

    let mut collector = Collector { blocks: Vec::new() };
    match collector.visit_block(root) {
        Ok(()) => collector.blocks,
        Err(never) => match never {},
    }
}
