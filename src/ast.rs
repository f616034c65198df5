// SPDX-License-Identifier: Apache-2.0

//! AST for the block-structured IR consumed by the block class finder.
//!
//! The tree is owned by the caller and never mutated by the analysis; blocks
//! are identified by address, so the analysis results borrow from it.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Number,
    Boolean,
    String,
}

impl LiteralKind {
    /// Stable discriminant used when fingerprinting.
    pub fn discriminant(&self) -> u64 {
        match self {
            LiteralKind::Number => 0,
            LiteralKind::Boolean => 1,
            LiteralKind::String => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub kind: LiteralKind,
    /// Textual value; for strings this is the unquoted content.
    pub value: String,
    /// Optional type annotation, e.g. `u256` in `1:u256`.
    pub ty: Option<String>,
}

impl Literal {
    pub fn number(value: &str) -> Self {
        Literal {
            kind: LiteralKind::Number,
            value: value.to_string(),
            ty: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
}

impl Identifier {
    pub fn new(name: &str) -> Self {
        Identifier {
            name: name.to_string(),
        }
    }
}

/// A name with an optional type, as introduced by `let`, function parameters
/// and function return variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedName {
    pub name: String,
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Stop,
    Add,
    Sub,
    Mul,
    Div,
    Sdiv,
    Mod,
    Smod,
    Exp,
    Not,
    Lt,
    Gt,
    Slt,
    Sgt,
    Eq,
    IsZero,
    And,
    Or,
    Xor,
    Byte,
    Shl,
    Shr,
    Sar,
    AddMod,
    MulMod,
    SignExtend,
    Keccak256,
    Address,
    Caller,
    CallValue,
    CallDataLoad,
    CallDataSize,
    CallDataCopy,
    MLoad,
    MStore,
    MStore8,
    SLoad,
    SStore,
    MSize,
    Gas,
    Pop,
    Return,
    Revert,
    Invalid,
}

pub fn name_to_builtin(name: &str) -> Option<Builtin> {
    match name {
        "stop" => Some(Builtin::Stop),
        // arithmetic
        "add" => Some(Builtin::Add),
        "sub" => Some(Builtin::Sub),
        "mul" => Some(Builtin::Mul),
        "div" => Some(Builtin::Div),
        "sdiv" => Some(Builtin::Sdiv),
        "mod" => Some(Builtin::Mod),
        "smod" => Some(Builtin::Smod),
        "exp" => Some(Builtin::Exp),
        "addmod" => Some(Builtin::AddMod),
        "mulmod" => Some(Builtin::MulMod),
        "signextend" => Some(Builtin::SignExtend),
        // comparisons
        "lt" => Some(Builtin::Lt),
        "gt" => Some(Builtin::Gt),
        "slt" => Some(Builtin::Slt),
        "sgt" => Some(Builtin::Sgt),
        "eq" => Some(Builtin::Eq),
        "iszero" => Some(Builtin::IsZero),
        // bitwise
        "not" => Some(Builtin::Not),
        "and" => Some(Builtin::And),
        "or" => Some(Builtin::Or),
        "xor" => Some(Builtin::Xor),
        "byte" => Some(Builtin::Byte),
        "shl" => Some(Builtin::Shl),
        "shr" => Some(Builtin::Shr),
        "sar" => Some(Builtin::Sar),
        // environment
        "keccak256" => Some(Builtin::Keccak256),
        "address" => Some(Builtin::Address),
        "caller" => Some(Builtin::Caller),
        "callvalue" => Some(Builtin::CallValue),
        "calldataload" => Some(Builtin::CallDataLoad),
        "calldatasize" => Some(Builtin::CallDataSize),
        "calldatacopy" => Some(Builtin::CallDataCopy),
        "gas" => Some(Builtin::Gas),
        // memory and storage
        "mload" => Some(Builtin::MLoad),
        "mstore" => Some(Builtin::MStore),
        "mstore8" => Some(Builtin::MStore8),
        "msize" => Some(Builtin::MSize),
        "sload" => Some(Builtin::SLoad),
        "sstore" => Some(Builtin::SStore),
        // control
        "pop" => Some(Builtin::Pop),
        "return" => Some(Builtin::Return),
        "revert" => Some(Builtin::Revert),
        "invalid" => Some(Builtin::Invalid),
        _ => None,
    }
}

pub fn builtin_to_name(builtin: Builtin) -> &'static str {
    match builtin {
        Builtin::Stop => "stop",
        Builtin::Add => "add",
        Builtin::Sub => "sub",
        Builtin::Mul => "mul",
        Builtin::Div => "div",
        Builtin::Sdiv => "sdiv",
        Builtin::Mod => "mod",
        Builtin::Smod => "smod",
        Builtin::Exp => "exp",
        Builtin::AddMod => "addmod",
        Builtin::MulMod => "mulmod",
        Builtin::SignExtend => "signextend",
        Builtin::Lt => "lt",
        Builtin::Gt => "gt",
        Builtin::Slt => "slt",
        Builtin::Sgt => "sgt",
        Builtin::Eq => "eq",
        Builtin::IsZero => "iszero",
        Builtin::Not => "not",
        Builtin::And => "and",
        Builtin::Or => "or",
        Builtin::Xor => "xor",
        Builtin::Byte => "byte",
        Builtin::Shl => "shl",
        Builtin::Shr => "shr",
        Builtin::Sar => "sar",
        Builtin::Keccak256 => "keccak256",
        Builtin::Address => "address",
        Builtin::Caller => "caller",
        Builtin::CallValue => "callvalue",
        Builtin::CallDataLoad => "calldataload",
        Builtin::CallDataSize => "calldatasize",
        Builtin::CallDataCopy => "calldatacopy",
        Builtin::Gas => "gas",
        Builtin::MLoad => "mload",
        Builtin::MStore => "mstore",
        Builtin::MStore8 => "mstore8",
        Builtin::MSize => "msize",
        Builtin::SLoad => "sload",
        Builtin::SStore => "sstore",
        Builtin::Pop => "pop",
        Builtin::Return => "return",
        Builtin::Revert => "revert",
        Builtin::Invalid => "invalid",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinCall {
    pub builtin: Builtin,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub function_name: String,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Literal(Literal),
    Identifier(Identifier),
    BuiltinCall(BuiltinCall),
    FunctionCall(FunctionCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionStatement {
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub variable_names: Vec<Identifier>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub variables: Vec<TypedName>,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    pub condition: Expression,
    pub body: Block,
}

/// A switch case; `value` is `None` for the `default` case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub value: Option<Literal>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    pub expression: Expression,
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForLoop {
    pub pre: Block,
    pub condition: Expression,
    pub post: Block,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: String,
    pub parameters: Vec<TypedName>,
    pub return_variables: Vec<TypedName>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    ExpressionStatement(ExpressionStatement),
    Assignment(Assignment),
    VariableDeclaration(VariableDeclaration),
    FunctionDefinition(FunctionDefinition),
    If(If),
    Switch(Switch),
    ForLoop(ForLoop),
    Break,
    Continue,
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Block { statements }
    }
}

fn write_typed_names(f: &mut std::fmt::Formatter<'_>, names: &[TypedName]) -> std::fmt::Result {
    for (i, n) in names.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", n.name)?;
        if let Some(ty) = &n.ty {
            write!(f, ":{}", ty)?;
        }
    }
    Ok(())
}

fn write_arguments(f: &mut std::fmt::Formatter<'_>, args: &[Expression]) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    write!(f, ")")
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            LiteralKind::String => write!(f, "\"{}\"", self.value)?,
            LiteralKind::Number | LiteralKind::Boolean => write!(f, "{}", self.value)?,
        }
        if let Some(ty) = &self.ty {
            write!(f, ":{}", ty)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Identifier(identifier) => write!(f, "{}", identifier.name),
            Expression::BuiltinCall(call) => {
                write!(f, "{}", builtin_to_name(call.builtin))?;
                write_arguments(f, &call.arguments)
            }
            Expression::FunctionCall(call) => {
                write!(f, "{}", call.function_name)?;
                write_arguments(f, &call.arguments)
            }
        }
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::ExpressionStatement(s) => write!(f, "{}", s.expression),
            Statement::Assignment(a) => {
                let names: Vec<&str> = a.variable_names.iter().map(|v| v.name.as_str()).collect();
                write!(f, "{} := {}", names.join(", "), a.value)
            }
            Statement::VariableDeclaration(decl) => {
                write!(f, "let ")?;
                write_typed_names(f, &decl.variables)?;
                if let Some(value) = &decl.value {
                    write!(f, " := {}", value)?;
                }
                Ok(())
            }
            Statement::FunctionDefinition(def) => {
                write!(f, "function {}(", def.name)?;
                write_typed_names(f, &def.parameters)?;
                write!(f, ")")?;
                if !def.return_variables.is_empty() {
                    write!(f, " -> ")?;
                    write_typed_names(f, &def.return_variables)?;
                }
                write!(f, " {}", def.body)
            }
            Statement::If(s) => write!(f, "if {} {}", s.condition, s.body),
            Statement::Switch(s) => {
                write!(f, "switch {}", s.expression)?;
                for case in s.cases.iter() {
                    match &case.value {
                        Some(value) => write!(f, " case {} {}", value, case.body)?,
                        None => write!(f, " default {}", case.body)?,
                    }
                }
                Ok(())
            }
            Statement::ForLoop(l) => {
                write!(f, "for {} {} {} {}", l.pre, l.condition, l.post, l.body)
            }
            Statement::Break => write!(f, "break"),
            Statement::Continue => write!(f, "continue"),
            Statement::Block(b) => write!(f, "{}", b),
        }
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "{{ }}");
        }
        write!(f, "{{")?;
        for statement in self.statements.iter() {
            write!(f, " {}", statement)?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_round_trip() {
        for name in ["add", "sub", "mstore", "sload", "iszero", "keccak256"] {
            let builtin = name_to_builtin(name).unwrap();
            assert_eq!(builtin_to_name(builtin), name);
        }
        assert!(name_to_builtin("frobnicate").is_none());
    }

    #[test]
    fn test_display_block() {
        let block = Block::new(vec![
            Statement::VariableDeclaration(VariableDeclaration {
                variables: vec![TypedName {
                    name: "x".to_string(),
                    ty: None,
                }],
                value: Some(Expression::BuiltinCall(BuiltinCall {
                    builtin: Builtin::Add,
                    arguments: vec![
                        Expression::Identifier(Identifier::new("a")),
                        Expression::Literal(Literal::number("1")),
                    ],
                })),
            }),
            Statement::Break,
        ]);
        assert_eq!(block.to_string(), "{ let x := add(a, 1) break }");
        assert_eq!(Block::default().to_string(), "{ }");
    }
}
