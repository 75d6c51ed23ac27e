use crate::expr::ast::{Expr, LexError, ParseError, Token};

// Tokenizer + recursive-descent parser
pub fn tokenize(s: &str) -> Result<Vec<Token>, LexError> {
    let mut toks = Vec::new();
    let mut chars = s.char_indices().peekable();
    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c.is_ascii_digit() || c == '.' {
            let mut num = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit()
                    || d == '.'
                    || d == 'e'
                    || d == 'E'
                    || ((d == '+' || d == '-') && (num.ends_with('e') || num.ends_with('E')))
                {
                    num.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            match num.parse::<f64>() {
                Ok(v) => toks.push(Token::Num(v)),
                Err(_) => return Err(LexError { offset, found: c }),
            }
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let mut id = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_alphanumeric() || d == '_' {
                    id.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            toks.push(Token::Ident(id));
            continue;
        }
        chars.next();
        match c {
            '(' => toks.push(Token::LParen),
            ')' => toks.push(Token::RParen),
            ',' => toks.push(Token::Comma),
            '+' | '-' | '/' | '^' => toks.push(Token::Op(c)),
            '*' => {
                // `**` is accepted as exponentiation
                if let Some(&(_, '*')) = chars.peek() {
                    chars.next();
                    toks.push(Token::Op('^'));
                } else {
                    toks.push(Token::Op('*'));
                }
            }
            _ => return Err(LexError { offset, found: c }),
        }
    }
    Ok(toks)
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    expected: Vec<String>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            expected: Vec::new(),
        }
    }

    fn expected_push(&mut self, s: &str) {
        if !self.expected.iter().any(|e| e == s) {
            self.expected.push(s.to_string());
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let r = self.tokens.get(self.pos);
        if r.is_some() {
            self.pos += 1;
        }
        r
    }

    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_add_sub()
    }

    /// Parse a complete expression, failing if any tokens are left over.
    pub fn parse_expr_result(&mut self) -> Result<Expr, ParseError> {
        match self.parse_expr() {
            Some(expr) if self.pos == self.tokens.len() => Ok(expr),
            Some(_) => {
                self.expected_push("operator|end of expression");
                Err(self.error())
            }
            None => Err(self.error()),
        }
    }

    fn error(&self) -> ParseError {
        ParseError {
            pos: self.pos,
            found: self.peek().cloned(),
            expected: self.expected.clone(),
        }
    }

    fn parse_add_sub(&mut self) -> Option<Expr> {
        let mut node = self.parse_mul_div()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.next();
            let rhs = self.parse_mul_div()?;
            node = Expr::BinaryOp {
                lhs: Box::new(node),
                op,
                rhs: Box::new(rhs),
            };
        }
        Some(node)
    }

    fn parse_mul_div(&mut self) -> Option<Expr> {
        let mut node = self.parse_unary()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek().cloned() {
            self.next();
            let rhs = self.parse_unary()?;
            node = Expr::BinaryOp {
                lhs: Box::new(node),
                op,
                rhs: Box::new(rhs),
            };
        }
        Some(node)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.next();
                let rhs = self.parse_unary()?;
                Some(Expr::UnaryOp {
                    op: '-',
                    rhs: Box::new(rhs),
                })
            }
            Some(Token::Op('+')) => {
                self.next();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Option<Expr> {
        let node = self.parse_primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.next();
            // right-associative, and allows a signed exponent: 2^-1
            let rhs = self.parse_unary()?;
            return Some(Expr::BinaryOp {
                lhs: Box::new(node),
                op: '^',
                rhs: Box::new(rhs),
            });
        }
        Some(node)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let Some(tok) = self.next().cloned() else {
            self.expected_push("number|identifier|'('");
            return None;
        };
        match tok {
            Token::Num(v) => Some(Expr::Number(v)),
            Token::Ident(id) => {
                if let Some(Token::LParen) = self.peek() {
                    self.next();
                    let args = self.parse_args()?;
                    Some(Expr::Call { name: id, args })
                } else {
                    Some(Expr::Ident(id))
                }
            }
            Token::LParen => {
                let expr = self.parse_expr()?;
                if let Some(Token::RParen) = self.peek() {
                    self.next();
                    Some(expr)
                } else {
                    self.expected_push(")");
                    None
                }
            }
            _ => {
                // step back so the error reports the offending token
                self.pos -= 1;
                self.expected_push("number|identifier|'('");
                None
            }
        }
    }

    fn parse_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.next();
            return Some(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.next();
                }
                Some(Token::RParen) => {
                    self.next();
                    return Some(args);
                }
                _ => {
                    self.expected_push(",|)");
                    return None;
                }
            }
        }
    }
}
