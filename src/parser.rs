// SPDX-License-Identifier: Apache-2.0

//! Parser for the textual form of the block-structured IR, e.g.
//!
//! ```text
//! {
//!     let x := add(a, 1)
//!     if lt(x, 10) { x := 0 }
//! }
//! ```

use crate::ast::{
    name_to_builtin, Assignment, Block, BuiltinCall, Case, Expression, ExpressionStatement,
    ForLoop, FunctionCall, FunctionDefinition, Identifier, If, Literal, LiteralKind, Statement,
    Switch, TypedName, VariableDeclaration,
};

pub fn parse_path_to_block(path: &std::path::Path) -> Result<Block, ParseError> {
    let file_content = std::fs::read_to_string(path)
        .map_err(|e| ParseError::new(format!("failed to read file: {}", e)))?;
    parse_block(&file_content)
}

/// Parses `input` as a single top-level block.
pub fn parse_block(input: &str) -> Result<Block, ParseError> {
    let mut parser = Parser::new(input);
    parser.parse_top_block()
}

#[derive(Debug)]
pub struct ParseError {
    msg: String,
}

impl ParseError {
    fn new(msg: String) -> Self {
        Self { msg }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParseError: {}", self.msg)
    }
}

impl std::error::Error for ParseError {}

const KEYWORDS: &[&str] = &[
    "let", "function", "if", "switch", "case", "default", "for", "break", "continue", "true",
    "false",
];

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_rest(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '.'
}

pub struct Parser {
    chars: Vec<char>,
    offset: usize,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            offset: 0,
        }
    }

    fn rest_of_line(&self) -> String {
        self.chars[self.offset.min(self.chars.len())..]
            .iter()
            .take_while(|c| **c != '\n')
            .collect::<String>()
    }

    fn at_eof(&mut self) -> bool {
        self.drop_whitespace_and_comments();
        self.offset >= self.chars.len()
    }

    /// Drops a "//" style comment if one is present at the current offset.
    fn drop_comment(&mut self) -> bool {
        if self.peek_is("//") {
            self.offset += 2;
            while let Some(c) = self.popc() {
                if c == '\n' {
                    break;
                }
            }
            true
        } else {
            false
        }
    }

    fn drop_whitespace_and_comments(&mut self) {
        loop {
            while let Some(c) = self.peekc() {
                if !c.is_whitespace() {
                    break;
                }
                self.offset += 1;
            }
            if !self.drop_comment() {
                break;
            }
        }
    }

    fn peekc(&self) -> Option<char> {
        self.chars.get(self.offset).copied()
    }

    fn popc(&mut self) -> Option<char> {
        let c = self.peekc();
        if c.is_some() {
            self.offset += 1;
        }
        c
    }

    fn peek_is(&self, s: &str) -> bool {
        for (i, c) in s.chars().enumerate() {
            match self.chars.get(self.offset + i) {
                Some(have) if *have == c => {}
                _ => return false,
            }
        }
        true
    }

    /// Like `peek_is` but `s` must not continue as a longer identifier.
    fn peek_is_keyword(&mut self, s: &str) -> bool {
        self.drop_whitespace_and_comments();
        if !self.peek_is(s) {
            return false;
        }
        match self.chars.get(self.offset + s.chars().count()) {
            Some(c) => !is_identifier_rest(*c),
            None => true,
        }
    }

    fn try_drop(&mut self, s: &str) -> bool {
        self.drop_whitespace_and_comments();
        if self.peek_is(s) {
            self.offset += s.chars().count();
            true
        } else {
            false
        }
    }

    fn try_drop_keyword(&mut self, s: &str) -> bool {
        if self.peek_is_keyword(s) {
            self.offset += s.chars().count();
            true
        } else {
            false
        }
    }

    fn drop_or_error_with_ctx(&mut self, s: &str, ctx: &str) -> Result<(), ParseError> {
        if self.try_drop(s) {
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "expected {:?} in {}; rest_of_line: {:?}",
                s,
                ctx,
                self.rest_of_line()
            )))
        }
    }

    fn pop_identifier_or_error(&mut self, ctx: &str) -> Result<String, ParseError> {
        self.drop_whitespace_and_comments();
        match self.peekc() {
            Some(c) if is_identifier_start(c) => {}
            other => {
                return Err(ParseError::new(format!(
                    "in {} expected identifier, got {:?}; rest_of_line: {:?}",
                    ctx,
                    other,
                    self.rest_of_line()
                )));
            }
        }
        let mut identifier = String::new();
        while let Some(c) = self.peekc() {
            if !is_identifier_rest(c) {
                break;
            }
            identifier.push(c);
            self.offset += 1;
        }
        if KEYWORDS.contains(&identifier.as_str()) {
            return Err(ParseError::new(format!(
                "in {} expected identifier, got keyword {:?}",
                ctx, identifier
            )));
        }
        Ok(identifier)
    }

    fn pop_string_or_error(&mut self) -> Result<String, ParseError> {
        self.drop_or_error_with_ctx("\"", "string literal")?;
        let mut string = String::new();
        loop {
            match self.popc() {
                Some('"') => return Ok(string),
                Some('\\') => match self.popc() {
                    Some(escaped) => {
                        string.push('\\');
                        string.push(escaped);
                    }
                    None => break,
                },
                Some(c) => string.push(c),
                None => break,
            }
        }
        Err(ParseError::new("unterminated string literal".to_string()))
    }

    fn pop_number_string_or_error(&mut self, ctx: &str) -> Result<String, ParseError> {
        self.drop_whitespace_and_comments();
        let mut number = String::new();
        if self.peek_is("0x") || self.peek_is("0X") {
            number.push('0');
            number.push('x');
            self.offset += 2;
            while let Some(c) = self.peekc() {
                if !c.is_ascii_hexdigit() {
                    break;
                }
                number.push(c.to_ascii_lowercase());
                self.offset += 1;
            }
            if number.len() == 2 {
                number.clear();
            }
        } else {
            while let Some(c) = self.peekc() {
                if !c.is_ascii_digit() {
                    break;
                }
                number.push(c);
                self.offset += 1;
            }
        }
        if number.is_empty() {
            Err(ParseError::new(format!(
                "expected number in {}; rest_of_line: {:?}",
                ctx,
                self.rest_of_line()
            )))
        } else {
            Ok(number)
        }
    }

    /// Parses an optional `:type` suffix. Must be called directly after the
    /// annotated token; `:=` is not a type annotation.
    fn pop_optional_type(&mut self) -> Result<Option<String>, ParseError> {
        if self.peek_is(":") && !self.peek_is(":=") {
            self.offset += 1;
            Ok(Some(self.pop_identifier_or_error("type annotation")?))
        } else {
            Ok(None)
        }
    }

    fn parse_typed_name(&mut self, ctx: &str) -> Result<TypedName, ParseError> {
        let name = self.pop_identifier_or_error(ctx)?;
        let ty = self.pop_optional_type()?;
        Ok(TypedName { name, ty })
    }

    /// Parses a comma-separated, non-empty list of typed names.
    fn parse_typed_names(&mut self, ctx: &str) -> Result<Vec<TypedName>, ParseError> {
        let mut names = vec![self.parse_typed_name(ctx)?];
        while self.try_drop(",") {
            names.push(self.parse_typed_name(ctx)?);
        }
        Ok(names)
    }

    fn peek_is_literal_start(&mut self) -> bool {
        self.drop_whitespace_and_comments();
        match self.peekc() {
            Some(c) if c.is_ascii_digit() || c == '"' => true,
            _ => self.peek_is_keyword("true") || self.peek_is_keyword("false"),
        }
    }

    pub fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        self.drop_whitespace_and_comments();
        let (kind, value) = if self.try_drop_keyword("true") {
            (LiteralKind::Boolean, "true".to_string())
        } else if self.try_drop_keyword("false") {
            (LiteralKind::Boolean, "false".to_string())
        } else if self.peek_is("\"") {
            (LiteralKind::String, self.pop_string_or_error()?)
        } else {
            (
                LiteralKind::Number,
                self.pop_number_string_or_error("literal")?,
            )
        };
        let ty = self.pop_optional_type()?;
        Ok(Literal { kind, value, ty })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut arguments = Vec::new();
        if self.try_drop(")") {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_expression()?);
            if self.try_drop(")") {
                return Ok(arguments);
            }
            self.drop_or_error_with_ctx(",", "argument list")?;
        }
    }

    /// Completes a call whose callee name has already been consumed.
    fn parse_call(&mut self, name: String) -> Result<Expression, ParseError> {
        let arguments = self.parse_arguments()?;
        Ok(match name_to_builtin(&name) {
            Some(builtin) => Expression::BuiltinCall(BuiltinCall { builtin, arguments }),
            None => Expression::FunctionCall(FunctionCall {
                function_name: name,
                arguments,
            }),
        })
    }

    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        if self.peek_is_literal_start() {
            return Ok(Expression::Literal(self.parse_literal()?));
        }
        let name = self.pop_identifier_or_error("expression")?;
        if self.try_drop("(") {
            self.parse_call(name)
        } else {
            Ok(Expression::Identifier(Identifier { name }))
        }
    }

    fn parse_switch(&mut self) -> Result<Switch, ParseError> {
        let expression = self.parse_expression()?;
        let mut cases = Vec::new();
        loop {
            if self.try_drop_keyword("case") {
                let value = self.parse_literal()?;
                let body = self.parse_block()?;
                cases.push(Case {
                    value: Some(value),
                    body,
                });
            } else if self.try_drop_keyword("default") {
                let body = self.parse_block()?;
                cases.push(Case { value: None, body });
                break;
            } else {
                break;
            }
        }
        if cases.is_empty() {
            return Err(ParseError::new(format!(
                "switch without cases; rest_of_line: {:?}",
                self.rest_of_line()
            )));
        }
        Ok(Switch { expression, cases })
    }

    fn parse_function_definition(&mut self) -> Result<FunctionDefinition, ParseError> {
        let name = self.pop_identifier_or_error("function name")?;
        self.drop_or_error_with_ctx("(", "function parameters")?;
        let parameters = if self.try_drop(")") {
            Vec::new()
        } else {
            let parameters = self.parse_typed_names("function parameters")?;
            self.drop_or_error_with_ctx(")", "function parameters")?;
            parameters
        };
        let return_variables = if self.try_drop("->") {
            self.parse_typed_names("function return variables")?
        } else {
            Vec::new()
        };
        let body = self.parse_block()?;
        Ok(FunctionDefinition {
            name,
            parameters,
            return_variables,
            body,
        })
    }

    /// Parses a statement that starts with an identifier: an assignment or a
    /// call used as a statement.
    fn parse_assignment_or_call(&mut self) -> Result<Statement, ParseError> {
        let first = self.pop_identifier_or_error("statement")?;
        self.drop_whitespace_and_comments();
        if self.peek_is(",") || self.peek_is(":=") {
            let mut variable_names = vec![Identifier { name: first }];
            while self.try_drop(",") {
                let name = self.pop_identifier_or_error("assignment target")?;
                variable_names.push(Identifier { name });
            }
            self.drop_or_error_with_ctx(":=", "assignment")?;
            let value = self.parse_expression()?;
            return Ok(Statement::Assignment(Assignment {
                variable_names,
                value,
            }));
        }
        if self.try_drop("(") {
            let expression = self.parse_call(first)?;
            return Ok(Statement::ExpressionStatement(ExpressionStatement {
                expression,
            }));
        }
        Err(ParseError::new(format!(
            "expected assignment or call after {:?}; rest_of_line: {:?}",
            first,
            self.rest_of_line()
        )))
    }

    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        self.drop_whitespace_and_comments();
        log::trace!("parse_statement; rest_of_line: {:?}", self.rest_of_line());
        if self.peek_is("{") {
            return Ok(Statement::Block(self.parse_block()?));
        }
        if self.try_drop_keyword("let") {
            let variables = self.parse_typed_names("variable declaration")?;
            let value = if self.try_drop(":=") {
                Some(self.parse_expression()?)
            } else {
                None
            };
            return Ok(Statement::VariableDeclaration(VariableDeclaration {
                variables,
                value,
            }));
        }
        if self.try_drop_keyword("function") {
            return Ok(Statement::FunctionDefinition(
                self.parse_function_definition()?,
            ));
        }
        if self.try_drop_keyword("if") {
            let condition = self.parse_expression()?;
            let body = self.parse_block()?;
            return Ok(Statement::If(If { condition, body }));
        }
        if self.try_drop_keyword("switch") {
            return Ok(Statement::Switch(self.parse_switch()?));
        }
        if self.try_drop_keyword("for") {
            let pre = self.parse_block()?;
            let condition = self.parse_expression()?;
            let post = self.parse_block()?;
            let body = self.parse_block()?;
            return Ok(Statement::ForLoop(ForLoop {
                pre,
                condition,
                post,
                body,
            }));
        }
        if self.try_drop_keyword("break") {
            return Ok(Statement::Break);
        }
        if self.try_drop_keyword("continue") {
            return Ok(Statement::Continue);
        }
        self.parse_assignment_or_call()
    }

    pub fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.drop_or_error_with_ctx("{", "block")?;
        let mut statements = Vec::new();
        loop {
            if self.try_drop("}") {
                return Ok(Block { statements });
            }
            if self.at_eof() {
                return Err(ParseError::new("unterminated block".to_string()));
            }
            statements.push(self.parse_statement()?);
        }
    }

    /// Parses one block and requires the input to end after it.
    pub fn parse_top_block(&mut self) -> Result<Block, ParseError> {
        let block = self.parse_block()?;
        if !self.at_eof() {
            return Err(ParseError::new(format!(
                "trailing input after top-level block: {:?}",
                self.rest_of_line()
            )));
        }
        log::debug!("parse_top_block; statements: {}", block.statements.len());
        Ok(block)
    }
}
