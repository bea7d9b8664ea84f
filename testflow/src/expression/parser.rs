//! Expression tree and precedence-climbing parser.

use super::lexer::{tokenize, Token, TokenKind};
use super::ExpressionError;
use serde_json::Value;

/// Deepest nesting of sub-expressions the parser accepts.
const MAX_DEPTH: usize = 64;

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Value),
    /// A `${path}` variable reference.
    Variable(String),
    /// A list literal.
    List(Vec<Expr>),
    /// An object literal.
    Object(Vec<(String, Expr)>),
    /// Unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// Arithmetic operation.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// The operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Short-circuiting boolean operation.
    Logical {
        /// Left operand.
        left: Box<Expr>,
        /// The operator.
        op: LogicalOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Chained comparison (`a < b <= c`).
    Compare {
        /// First operand.
        first: Box<Expr>,
        /// Operator/operand pairs, left to right.
        rest: Vec<(CompareOp, Expr)>,
    },
    /// Subscript `target[index]`.
    Index {
        /// The indexed value.
        target: Box<Expr>,
        /// The index expression.
        index: Box<Expr>,
    },
    /// Member access `target.name`.
    Member {
        /// The object.
        target: Box<Expr>,
        /// The member name.
        name: String,
    },
    /// The `len(x)` builtin.
    Len(Box<Expr>),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Negate,
    /// Boolean negation.
    Not,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `//`
    FloorDivide,
    /// `%`
    Modulo,
}

/// Boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `and` / `&&`
    And,
    /// `or` / `||`
    Or,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `in`
    In,
    /// `not in`
    NotIn,
}

impl Expr {
    /// Collects every referenced variable path, in order of appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Literal(_) => {}
            Self::Variable(path) => {
                if !out.contains(&path.as_str()) {
                    out.push(path);
                }
            }
            Self::List(items) => items.iter().for_each(|item| item.collect_variables(out)),
            Self::Object(entries) => entries
                .iter()
                .for_each(|(_, value)| value.collect_variables(out)),
            Self::Unary { operand, .. } | Self::Len(operand) => operand.collect_variables(out),
            Self::Member { target, .. } => target.collect_variables(out),
            Self::Binary { left, right, .. } | Self::Logical { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Self::Index { target, index } => {
                target.collect_variables(out);
                index.collect_variables(out);
            }
            Self::Compare { first, rest } => {
                first.collect_variables(out);
                rest.iter().for_each(|(_, expr)| expr.collect_variables(out));
            }
        }
    }
}

/// Parses a full expression; trailing tokens are an error.
pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        current: 0,
        depth: 0,
    };
    let expr = parser.parse_expression()?;

    if !parser.check(&TokenKind::Eof) {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.current)
            .map_or(&TokenKind::Eof, |token| &token.kind)
    }

    fn peek_next(&self) -> &TokenKind {
        self.tokens
            .get(self.current + 1)
            .map_or(&TokenKind::Eof, |token| &token.kind)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.current).map_or(0, |token| token.position)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        kind
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(name) if name == keyword)
    }

    fn error(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError::Parse {
            position: self.position(),
            message: message.into(),
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), ExpressionError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    /// Runs `parse` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Expr, ExpressionError>,
    ) -> Result<Expr, ExpressionError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_expression(&mut self) -> Result<Expr, ExpressionError> {
        self.nested(Self::parse_or)
    }

    /// Parse logical OR: left or right
    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_and()?;

        while self.check(&TokenKind::OrOr) || self.check_keyword("or") {
            self.advance();
            let right = self.parse_and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op: LogicalOp::Or,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Parse logical AND: left and right
    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_not()?;

        while self.check(&TokenKind::AndAnd) || self.check_keyword("and") {
            self.advance();
            let right = self.parse_not()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op: LogicalOp::And,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn parse_not(&mut self) -> Result<Expr, ExpressionError> {
        if self.check(&TokenKind::Bang) || self.check_keyword("not") {
            self.advance();
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }

        self.parse_comparison()
    }

    fn match_compare_op(&mut self) -> Option<CompareOp> {
        let not_in = self.check_keyword("not")
            && matches!(self.peek_next(), TokenKind::Ident(name) if name == "in");
        if not_in {
            self.advance();
            self.advance();
            return Some(CompareOp::NotIn);
        }

        let op = match self.peek() {
            TokenKind::EqualEqual => CompareOp::Equal,
            TokenKind::NotEqual => CompareOp::NotEqual,
            TokenKind::Less => CompareOp::Less,
            TokenKind::LessEqual => CompareOp::LessEqual,
            TokenKind::Greater => CompareOp::Greater,
            TokenKind::GreaterEqual => CompareOp::GreaterEqual,
            TokenKind::Ident(name) if name == "in" => CompareOp::In,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Parse comparison chain: ==, !=, <, <=, >, >=, in, not in
    fn parse_comparison(&mut self) -> Result<Expr, ExpressionError> {
        let first = self.parse_term()?;
        let mut rest = Vec::new();

        while let Some(op) = self.match_compare_op() {
            rest.push((op, self.parse_term()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    /// Parse term: +, -
    fn parse_term(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_factor()?;

        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Parse factor: *, /, //, %
    fn parse_factor(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::SlashSlash => BinaryOp::FloorDivide,
                TokenKind::Percent => BinaryOp::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        match self.peek() {
            TokenKind::Minus => {
                self.advance();
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Plus => {
                self.advance();
                self.nested(Self::parse_unary)
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::LeftBracket) {
                self.advance();
                let index = self.parse_expression()?;
                self.expect(&TokenKind::RightBracket, "']'")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.check(&TokenKind::Dot) {
                self.advance();
                let TokenKind::Ident(name) = self.advance() else {
                    return Err(self.error("expected member name after '.'"));
                };
                expr = Expr::Member {
                    target: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        let position = self.position();

        match self.advance() {
            TokenKind::Int(value) => Ok(Expr::Literal(Value::from(value))),
            TokenKind::Float(value) => serde_json::Number::from_f64(value)
                .map(|n| Expr::Literal(Value::Number(n)))
                .ok_or_else(|| ExpressionError::Parse {
                    position,
                    message: "non-finite number".to_string(),
                }),
            TokenKind::Str(value) => Ok(Expr::Literal(Value::String(value))),
            TokenKind::Var(path) => Ok(Expr::Variable(path)),
            TokenKind::Ident(name) => self.parse_identifier(&name, position),
            TokenKind::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => self.parse_list(),
            TokenKind::LeftBrace => self.parse_object(),
            TokenKind::Eof => Err(ExpressionError::Parse {
                position,
                message: "unexpected end of expression".to_string(),
            }),
            other => Err(ExpressionError::Parse {
                position,
                message: format!("unexpected token {other:?}"),
            }),
        }
    }

    fn parse_identifier(&mut self, name: &str, position: usize) -> Result<Expr, ExpressionError> {
        match name {
            "true" | "True" => Ok(Expr::Literal(Value::Bool(true))),
            "false" | "False" => Ok(Expr::Literal(Value::Bool(false))),
            "null" | "None" => Ok(Expr::Literal(Value::Null)),
            "len" if self.check(&TokenKind::LeftParen) => {
                self.advance();
                let argument = self.parse_expression()?;
                self.expect(&TokenKind::RightParen, "')' after len argument")?;
                Ok(Expr::Len(Box::new(argument)))
            }
            _ => Err(ExpressionError::Parse {
                position,
                message: format!("unknown identifier '{name}'"),
            }),
        }
    }

    fn parse_list(&mut self) -> Result<Expr, ExpressionError> {
        let mut items = Vec::new();

        while !self.check(&TokenKind::RightBracket) {
            items.push(self.parse_expression()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&TokenKind::RightBracket, "']'")?;
        Ok(Expr::List(items))
    }

    fn parse_object(&mut self) -> Result<Expr, ExpressionError> {
        let mut entries = Vec::new();

        while !self.check(&TokenKind::RightBrace) {
            let key = match self.advance() {
                TokenKind::Str(key) | TokenKind::Ident(key) => key,
                _ => return Err(self.error("expected object key")),
            };
            self.expect(&TokenKind::Colon, "':' after object key")?;
            entries.push((key, self.parse_expression()?));
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&TokenKind::RightBrace, "'}'")?;
        Ok(Expr::Object(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3 == 7 and not false").unwrap();

        let Expr::Logical { op: LogicalOp::And, left, right } = expr else {
            panic!("expected logical and");
        };
        assert!(matches!(*left, Expr::Compare { .. }));
        assert!(matches!(*right, Expr::Unary { op: UnaryOp::Not, .. }));
    }

    #[test]
    fn test_not_in_operator() {
        let expr = parse("'x' not in ${items}").unwrap();

        let Expr::Compare { rest, .. } = expr else {
            panic!("expected comparison");
        };
        assert_eq!(rest[0].0, CompareOp::NotIn);
    }

    #[test]
    fn test_variables_are_collected_once_in_order() {
        let expr = parse("${b} + ${a.x} > ${b}").unwrap();
        assert_eq!(expr.variables(), vec!["b", "a.x"]);
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("[1, 'a', None]").unwrap(), Expr::List(vec![
            Expr::Literal(json!(1)),
            Expr::Literal(json!("a")),
            Expr::Literal(Value::Null),
        ]));
        assert!(matches!(parse("{\"k\": 1, v: 2}").unwrap(), Expr::Object(entries) if entries.len() == 2));
    }

    #[test]
    fn test_postfix_chain() {
        let expr = parse("${resp}.body[0]").unwrap();
        assert!(matches!(expr, Expr::Index { .. }));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("hello world").is_err());
        assert!(parse("1 +").is_err());
        assert!(parse("(1").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse(&shallow).unwrap(), Expr::Literal(Value::from(1)));

        let deep = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(parse(&deep), Err(ExpressionError::Parse { .. })));

        let negations = format!("{}true", "not ".repeat(10_000));
        assert!(matches!(parse(&negations), Err(ExpressionError::Parse { .. })));

        let minuses = format!("{}1", "-".repeat(10_000));
        assert!(matches!(parse(&minuses), Err(ExpressionError::Parse { .. })));
    }
}
