//! Index-resolved expressions for fast evaluation
//!
//! Parsing produces a name-based [`Expr`]. Before integration every identifier is
//! resolved once: compartments become state slots, parameters are inlined as
//! constants. Evaluation then only touches the state slice.

use thiserror::Error;

use crate::error::EvalFault;
use crate::expr::ast::Expr;
use crate::expr::builtins;

/// What an identifier resolves to during compilation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Symbol {
    /// Index into the state vector
    Slot(usize),
    /// A constant value (parameter or derived parameter)
    Value(f64),
}

/// Errors raised while resolving an expression against a symbol table
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}()'")]
    UnknownFunction(String),

    #[error("function '{name}()' takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Const(f64),
    Slot(usize),
    Neg(Box<Node>),
    Binary(char, Box<Node>, Box<Node>),
    Call(String, Vec<Node>),
}

/// An expression whose identifiers have all been resolved
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    root: Node,
}

impl CompiledExpr {
    /// Resolve every identifier in `expr` with `resolve`.
    ///
    /// `pi` and `e` are available as constants unless the resolver shadows them.
    pub fn compile<F>(expr: &Expr, resolve: &F) -> Result<Self, CompileError>
    where
        F: Fn(&str) -> Option<Symbol>,
    {
        Ok(Self {
            root: compile_node(expr, resolve)?,
        })
    }

    /// A compiled expression that always evaluates to `value`
    pub fn constant(value: f64) -> Self {
        Self {
            root: Node::Const(value),
        }
    }

    /// Returns the value if the expression does not depend on the state
    pub fn as_constant(&self) -> Option<f64> {
        match self.root {
            Node::Const(v) => Some(v),
            _ => None,
        }
    }

    /// Evaluate against the given state slice
    pub fn eval(&self, x: &[f64]) -> Result<f64, EvalFault> {
        eval_node(&self.root, x)
    }
}

fn compile_node<F>(expr: &Expr, resolve: &F) -> Result<Node, CompileError>
where
    F: Fn(&str) -> Option<Symbol>,
{
    match expr {
        Expr::Number(v) => Ok(Node::Const(*v)),
        Expr::Ident(name) => match resolve(name) {
            Some(Symbol::Slot(i)) => Ok(Node::Slot(i)),
            Some(Symbol::Value(v)) => Ok(Node::Const(v)),
            None => match name.as_str() {
                "pi" => Ok(Node::Const(std::f64::consts::PI)),
                "e" => Ok(Node::Const(std::f64::consts::E)),
                _ => Err(CompileError::UnknownIdentifier(name.clone())),
            },
        },
        Expr::UnaryOp { op, rhs } => {
            let rhs = compile_node(rhs, resolve)?;
            match (op, rhs) {
                ('-', Node::Const(v)) => Ok(Node::Const(-v)),
                ('-', node) => Ok(Node::Neg(Box::new(node))),
                (_, node) => Ok(node),
            }
        }
        Expr::BinaryOp { lhs, op, rhs } => {
            let lhs = compile_node(lhs, resolve)?;
            let rhs = compile_node(rhs, resolve)?;
            if let (Node::Const(a), Node::Const(b)) = (&lhs, &rhs) {
                // only fold when the result is well defined; faults must surface at evaluation
                let folded = binary(*op, *a, *b);
                if let Ok(v) = folded {
                    if v.is_finite() {
                        return Ok(Node::Const(v));
                    }
                }
            }
            Ok(Node::Binary(*op, Box::new(lhs), Box::new(rhs)))
        }
        Expr::Call { name, args } => {
            let Some(range) = builtins::arg_count_range(name) else {
                return Err(CompileError::UnknownFunction(name.clone()));
            };
            if !range.contains(&args.len()) {
                return Err(CompileError::Arity {
                    name: name.clone(),
                    expected: *range.start(),
                    found: args.len(),
                });
            }
            let args = args
                .iter()
                .map(|a| compile_node(a, resolve))
                .collect::<Result<Vec<_>, _>>()?;
            if args.iter().all(|a| matches!(a, Node::Const(_))) {
                let values: Vec<f64> = args
                    .iter()
                    .map(|a| match a {
                        Node::Const(v) => *v,
                        _ => unreachable!(),
                    })
                    .collect();
                let v = builtins::apply(name, &values);
                if v.is_finite() {
                    return Ok(Node::Const(v));
                }
            }
            Ok(Node::Call(name.clone(), args))
        }
    }
}

fn binary(op: char, a: f64, b: f64) -> Result<f64, EvalFault> {
    match op {
        '+' => Ok(a + b),
        '-' => Ok(a - b),
        '*' => Ok(a * b),
        '/' => {
            if b == 0.0 {
                Err(EvalFault::DivisionByZero)
            } else {
                Ok(a / b)
            }
        }
        '^' => Ok(a.powf(b)),
        other => Err(EvalFault::UnsupportedOperator(other)),
    }
}

fn eval_node(node: &Node, x: &[f64]) -> Result<f64, EvalFault> {
    match node {
        Node::Const(v) => Ok(*v),
        Node::Slot(i) => x
            .get(*i)
            .copied()
            .ok_or(EvalFault::SlotOutOfBounds { index: *i, len: x.len() }),
        Node::Neg(rhs) => Ok(-eval_node(rhs, x)?),
        Node::Binary(op, lhs, rhs) => {
            let a = eval_node(lhs, x)?;
            let b = eval_node(rhs, x)?;
            binary(*op, a, b)
        }
        Node::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_node(arg, x)?);
            }
            Ok(builtins::apply(name, &values))
        }
    }
}
