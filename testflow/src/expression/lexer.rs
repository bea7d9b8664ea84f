//! Tokenizer for save and assertion expressions.

use super::ExpressionError;

/// A lexical token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    /// A `${path}` variable reference.
    Var(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Bang,
    AndAnd,
    OrOr,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Dot,
    Eof,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    index: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            index: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.index)
            .map_or(self.source.len(), |(offset, _)| *offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        Some(c)
    }

    fn error(position: usize, message: impl Into<String>) -> ExpressionError {
        ExpressionError::Parse {
            position,
            message: message.into(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
                continue;
            }

            let position = self.offset();
            let kind = match c {
                '0'..='9' => self.number(position)?,
                '"' | '\'' => self.string(position)?,
                '$' => self.variable(position)?,
                c if c.is_alphabetic() || c == '_' => self.identifier(),
                _ => self.operator(position)?,
            };
            tokens.push(Token { kind, position });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            position: self.source.len(),
        });
        Ok(tokens)
    }

    fn number(&mut self, position: usize) -> Result<TokenKind, ExpressionError> {
        let mut text = String::new();
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                if c != '_' {
                    text.push(c);
                }
                self.bump();
            } else if c == '.' && !is_float && self.peek_next().is_some_and(|n| n.is_ascii_digit()) {
                is_float = true;
                text.push(c);
                self.bump();
            } else if (c == 'e' || c == 'E') && !text.contains(['e', 'E']) {
                is_float = true;
                text.push(c);
                self.bump();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    text.push(sign);
                    self.bump();
                }
            } else {
                break;
            }
        }

        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| Self::error(position, format!("invalid number '{text}'")))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| Self::error(position, format!("invalid integer '{text}'")))
        }
    }

    fn string(&mut self, position: usize) -> Result<TokenKind, ExpressionError> {
        let quote = self.bump().unwrap_or('"');
        let mut value = String::new();

        loop {
            match self.bump() {
                None => return Err(Self::error(position, "unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\\') => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| Self::error(position, "unterminated escape sequence"))?;
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
                Some(c) => value.push(c),
            }
        }

        Ok(TokenKind::Str(value))
    }

    fn variable(&mut self, position: usize) -> Result<TokenKind, ExpressionError> {
        self.bump();
        if self.bump() != Some('{') {
            return Err(Self::error(position, "expected '{' after '$'"));
        }

        let mut path = String::new();
        loop {
            match self.bump() {
                None => return Err(Self::error(position, "unterminated variable reference")),
                Some('}') => break,
                Some(c) => path.push(c),
            }
        }

        let path = path.trim();
        if path.is_empty() {
            return Err(Self::error(position, "empty variable reference"));
        }
        Ok(TokenKind::Var(path.to_string()))
    }

    fn identifier(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        TokenKind::Ident(name)
    }

    fn operator(&mut self, position: usize) -> Result<TokenKind, ExpressionError> {
        let c = self.bump().unwrap_or_default();
        let next = self.peek();

        let (kind, consume_next) = match (c, next) {
            ('=', Some('=')) => (TokenKind::EqualEqual, true),
            ('!', Some('=')) => (TokenKind::NotEqual, true),
            ('<', Some('=')) => (TokenKind::LessEqual, true),
            ('>', Some('=')) => (TokenKind::GreaterEqual, true),
            ('&', Some('&')) => (TokenKind::AndAnd, true),
            ('|', Some('|')) => (TokenKind::OrOr, true),
            ('/', Some('/')) => (TokenKind::SlashSlash, true),
            ('!', _) => (TokenKind::Bang, false),
            ('<', _) => (TokenKind::Less, false),
            ('>', _) => (TokenKind::Greater, false),
            ('+', _) => (TokenKind::Plus, false),
            ('-', _) => (TokenKind::Minus, false),
            ('*', _) => (TokenKind::Star, false),
            ('/', _) => (TokenKind::Slash, false),
            ('%', _) => (TokenKind::Percent, false),
            ('(', _) => (TokenKind::LeftParen, false),
            (')', _) => (TokenKind::RightParen, false),
            ('[', _) => (TokenKind::LeftBracket, false),
            (']', _) => (TokenKind::RightBracket, false),
            ('{', _) => (TokenKind::LeftBrace, false),
            ('}', _) => (TokenKind::RightBrace, false),
            (',', _) => (TokenKind::Comma, false),
            (':', _) => (TokenKind::Colon, false),
            ('.', _) => (TokenKind::Dot, false),
            (other, _) => {
                return Err(Self::error(position, format!("unexpected character '{other}'")));
            }
        };

        if consume_next {
            self.bump();
        }
        Ok(kind)
    }
}
