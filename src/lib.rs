// Spud Language Interpreter Library
//
// Core library for the spud scripting language: a lexer, recursive-descent
// parser, and tree-walking evaluator with closures, native functions, and a
// module-import mechanism. Hosts embed it through two entry points: parsing
// source to a printable syntax tree, and running source with an input string.

// Public modules
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, FunctionDecl, Program, Stmt};
pub use error::{ErrorKind, SourcePos, Span, SpudError};
pub use evaluator::{Environment, Evaluator, Flow};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use value::Value;

// Re-export entry points
pub use repl::start as start_repl;
pub use runner::{parse_only, run_script};
