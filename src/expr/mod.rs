//! Expression language for derivative, initial-value, and parameter formulas
//!
//! Supports `+ - * /`, exponentiation with `^` or `**`, unary minus, parentheses,
//! numeric literals in decimal or scientific notation, and the builtins listed in
//! [`builtins`]. Identifiers name compartments or parameters.
//!
//! ```ignore
//! use episim::expr::{parse, CompiledExpr, Symbol};
//!
//! let ast = parse("-0.1 * S * I")?;
//! let compiled = CompiledExpr::compile(&ast, &|name| match name {
//!     "S" => Some(Symbol::Slot(0)),
//!     "I" => Some(Symbol::Slot(1)),
//!     _ => None,
//! })?;
//! let dsdt = compiled.eval(&[99.0, 1.0])?;
//! ```

pub mod ast;
pub mod builtins;
mod compiled;
pub mod parser;

pub use ast::Expr;
pub use compiled::{CompileError, CompiledExpr, Symbol};

use thiserror::Error;

/// Failure to turn source text into an [`Expr`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] ast::LexError),
    #[error(transparent)]
    Parse(#[from] ast::ParseError),
}

/// Tokenize and parse a complete expression
pub fn parse(source: &str) -> Result<Expr, SyntaxError> {
    let tokens = parser::tokenize(source)?;
    let expr = parser::Parser::new(tokens).parse_expr_result()?;
    Ok(expr)
}
