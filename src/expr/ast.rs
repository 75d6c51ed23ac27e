// AST and token types for the derivative expression language
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64),
    Ident(String), // compartment or parameter, e.g. Susceptible_0_17
    UnaryOp {
        op: char,
        rhs: Box<Expr>,
    },
    BinaryOp {
        lhs: Box<Expr>,
        op: char,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Collect every identifier referenced by this expression, in first-seen order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Ident(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name.as_str());
                }
            }
            Expr::UnaryOp { rhs, .. } => rhs.collect_identifiers(out),
            Expr::BinaryOp { lhs, rhs, .. } => {
                lhs.collect_identifiers(out);
                rhs.collect_identifiers(out);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_identifiers(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Num(f64),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Op(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub pos: usize,
    pub found: Option<Token>,
    pub expected: Vec<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.expected.is_empty() {
            write!(
                f,
                "parse error at token {} found={:?} expected={:?}",
                self.pos, self.found, self.expected
            )
        } else if let Some(tok) = &self.found {
            write!(f, "parse error at token {} found={:?}", self.pos, tok)
        } else {
            write!(f, "parse error at token {} found=<end>", self.pos)
        }
    }
}

impl std::error::Error for ParseError {}

/// Lexical error raised when the input contains a character outside the grammar
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub offset: usize,
    pub found: char,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected character '{}' at offset {}",
            self.found, self.offset
        )
    }
}

impl std::error::Error for LexError {}
