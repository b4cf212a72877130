//! Abstract syntax tree for acid programs
//!
//! Nodes are plain owned data: a parent exclusively owns its children, there
//! is no sharing and no cycles. [`NodeType`] names the grammar symbols the
//! parser dispatches on, including the two abstract ones (`Stmt`, `Expr`).

use std::fmt;

use serde::Serialize;

// ============================================================================
// NODE TYPES
// ============================================================================

/// A grammar symbol the parser can be asked to consume.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum NodeType {
    Program,
    Stmt,
    Declaration,
    TypeDeclaration,
    TopLevelExpr,
    Expr,
    Call,
    Lambda,
    Variable,
    IntLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,
}

impl NodeType {
    /// Concrete node types that satisfy this one. Empty for concrete types.
    pub const fn subtypes(self) -> &'static [NodeType] {
        match self {
            Self::Stmt => &[Self::Declaration, Self::TypeDeclaration, Self::TopLevelExpr],
            Self::Expr => &[
                Self::Call,
                Self::Lambda,
                Self::Variable,
                Self::IntLiteral,
                Self::FloatLiteral,
                Self::CharLiteral,
                Self::StringLiteral,
            ],
            _ => &[],
        }
    }

    pub const fn is_abstract(self) -> bool {
        !self.subtypes().is_empty()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Program => "Program",
            Self::Stmt => "Statement",
            Self::Declaration => "Declaration",
            Self::TypeDeclaration => "TypeDeclaration",
            Self::TopLevelExpr => "TopLevelExpr",
            Self::Expr => "Expression",
            Self::Call => "Call",
            Self::Lambda => "Lambda",
            Self::Variable => "Variable",
            Self::IntLiteral => "IntLiteral",
            Self::FloatLiteral => "FloatLiteral",
            Self::CharLiteral => "CharLiteral",
            Self::StringLiteral => "StringLiteral",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// AST NODES
// ============================================================================

/// The root of a parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Declaration(Declaration),
    TopLevelExpr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Call { func: Box<Expr>, args: Vec<Expr> },
    Lambda { params: Vec<String>, body: Box<Expr> },
    Variable(String),
    Int(i64),
    Float(f64),
    /// The text between the quotes, undecoded.
    Char(String),
    String(String),
}

impl Expr {
    /// The concrete node type this expression was built for.
    pub const fn node_type(&self) -> NodeType {
        match self {
            Expr::Call { .. } => NodeType::Call,
            Expr::Lambda { .. } => NodeType::Lambda,
            Expr::Variable(_) => NodeType::Variable,
            Expr::Int(_) => NodeType::IntLiteral,
            Expr::Float(_) => NodeType::FloatLiteral,
            Expr::Char(_) => NodeType::CharLiteral,
            Expr::String(_) => NodeType::StringLiteral,
        }
    }
}

impl Stmt {
    pub const fn node_type(&self) -> NodeType {
        match self {
            Stmt::Declaration(_) => NodeType::Declaration,
            Stmt::TopLevelExpr(_) => NodeType::TopLevelExpr,
        }
    }
}

/// Result of a dynamically typed `consume` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    Program(Program),
    Stmt(Stmt),
    Expr(Expr),
}

impl Node {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Node::Program(_) => "Program",
            Node::Stmt(_) => "Statement",
            Node::Expr(_) => "Expression",
        }
    }

    /// Unwraps an expression, handing the node back when it is something else.
    pub fn into_expr(self) -> Result<Expr, Node> {
        match self {
            Node::Expr(expr) => Ok(expr),
            other => Err(other),
        }
    }

    pub fn into_stmt(self) -> Result<Stmt, Node> {
        match self {
            Node::Stmt(stmt) => Ok(stmt),
            other => Err(other),
        }
    }

    pub fn into_program(self) -> Result<Program, Node> {
        match self {
            Node::Program(program) => Ok(program),
            other => Err(other),
        }
    }
}

impl From<Expr> for Node {
    fn from(expr: Expr) -> Self {
        Node::Expr(expr)
    }
}

impl From<Stmt> for Node {
    fn from(stmt: Stmt) -> Self {
        Node::Stmt(stmt)
    }
}

impl From<Program> for Node {
    fn from(program: Program) -> Self {
        Node::Program(program)
    }
}

// ============================================================================
// PRETTY PRINTING
// ============================================================================

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{stmt}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Declaration(decl) => write!(f, "(define {} {})", decl.name, decl.value),
            Stmt::TopLevelExpr(expr) => write!(f, "{expr}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Call { func, args } => {
                write!(f, "({func}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            Expr::Lambda { params, body } => {
                write!(f, "(lambda ({}) {body})", params.join(" "))
            }
            Expr::Variable(name) => f.write_str(name),
            Expr::Int(n) => write!(f, "{n}"),
            Expr::Float(x) => write!(f, "{x:?}"),
            Expr::Char(c) => write!(f, "'{c}'"),
            Expr::String(s) => write!(f, "\"{}\"", escape(s)),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Program(program) => write!(f, "{program}"),
            Node::Stmt(stmt) => write!(f, "{stmt}"),
            Node::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out
}
