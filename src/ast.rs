use crate::value::Value;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let {
        name: String,
        init: Expr,
    },
    Assign {
        name: String,
        value: Expr,
    },
    Print {
        expr: Expr,
    },
    Expression {
        expr: Expr,
    },
    Block {
        statements: Vec<Stmt>,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    /// The declaration sits behind an `Rc` so function values created at run
    /// time share it with the tree (and any retained module) that declared it.
    Function(Rc<FunctionDecl>),
    Return {
        value: Option<Expr>,
    },
    Import {
        module: String,
        /// Whether the module name was written as a string literal, which
        /// only matters for printing the tree back out.
        quoted: bool,
    },
}

#[derive(Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: Value,
        /// Source text of a number literal, printed verbatim by the tree
        /// printer so `3.0` does not come back out as `3`.
        raw: Option<String>,
    },
    Variable {
        name: String,
    },
    Grouping {
        expr: Box<Expr>,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        operator: LogicalOp,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

/// Re-escapes a string the way it would appear in source.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

// The `Display` impls render the fully parenthesized prefix form used by the
// parse-only entry point, e.g. `print 1 + 2;` becomes `(print (+ 1 2))`.

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(program")?;
        for stmt in &self.statements {
            write!(f, " {}", stmt)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Let { name, init } => write!(f, "(let {} {})", name, init),
            Stmt::Assign { name, value } => write!(f, "(assign {} {})", name, value),
            Stmt::Print { expr } => write!(f, "(print {})", expr),
            Stmt::Expression { expr } => write!(f, "(expr {})", expr),
            Stmt::Block { statements } => {
                write!(f, "(block")?;
                for stmt in statements {
                    write!(f, " {}", stmt)?;
                }
                write!(f, ")")
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "(if {} {}", condition, then_branch)?;
                if let Some(else_stmt) = else_branch {
                    write!(f, " {}", else_stmt)?;
                }
                write!(f, ")")
            }
            Stmt::While { condition, body } => write!(f, "(while {} {})", condition, body),
            Stmt::Function(decl) => {
                write!(f, "(fun {} (params", decl.name)?;
                for param in &decl.params {
                    write!(f, " {}", param)?;
                }
                write!(f, ") (block")?;
                for stmt in &decl.body {
                    write!(f, " {}", stmt)?;
                }
                write!(f, "))")
            }
            Stmt::Return { value } => {
                write!(f, "(return")?;
                if let Some(expr) = value {
                    write!(f, " {}", expr)?;
                }
                write!(f, ")")
            }
            Stmt::Import { module, quoted } => {
                if *quoted {
                    write!(f, "(import \"{}\")", escape_string(module))
                } else {
                    write!(f, "(import {})", module)
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Literal { value, raw } => match (raw, value) {
                (Some(text), _) => write!(f, "{}", text),
                (None, Value::Str(s)) => write!(f, "\"{}\"", escape_string(s)),
                (None, other) => write!(f, "{}", other),
            },
            Expr::Variable { name } => write!(f, "{}", name),
            Expr::Grouping { expr } => write!(f, "(group {})", expr),
            Expr::Unary { operator, operand } => {
                write!(f, "({} {})", operator.symbol(), operand)
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", operator.symbol(), left, right),
            Expr::Logical {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", operator.symbol(), left, right),
            Expr::Call { callee, args } => {
                write!(f, "(call {}", callee)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
