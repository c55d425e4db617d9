//! Hand-written byte scanner for the XPath subset, in the same style as
//! the crate's XML tokenizer: a flat loop over bytes, no external parsing
//! framework, since the grammar is small and fixed (see the design notes
//! in the crate root docs).

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Slash,
    Star,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    At,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Ident(String),
    Int(i64),
    Str(String),
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte position the token started at, for error messages.
    pub pos: usize,
}

pub struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    pub fn next_token(&mut self) -> crate::error::Result<Token> {
        self.skip_ws();
        let start = self.pos;
        let Some(b) = self.peek_byte() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                pos: start,
            });
        };
        let kind = match b {
            b'/' => {
                self.pos += 1;
                TokenKind::Slash
            }
            b'*' => {
                self.pos += 1;
                TokenKind::Star
            }
            b'[' => {
                self.pos += 1;
                TokenKind::LBracket
            }
            b']' => {
                self.pos += 1;
                TokenKind::RBracket
            }
            b'(' => {
                self.pos += 1;
                TokenKind::LParen
            }
            b')' => {
                self.pos += 1;
                TokenKind::RParen
            }
            b',' => {
                self.pos += 1;
                TokenKind::Comma
            }
            b'@' => {
                self.pos += 1;
                TokenKind::At
            }
            b'=' => {
                self.pos += 1;
                TokenKind::Eq
            }
            b'!' => {
                self.expect_byte(b'!', b'=')?;
                TokenKind::Ne
            }
            b'<' => {
                self.pos += 1;
                if self.peek_byte() == Some(b'=') {
                    self.pos += 1;
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                self.pos += 1;
                if self.peek_byte() == Some(b'=') {
                    self.pos += 1;
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            b'"' | b'\'' => self.lex_string(b)?,
            b'0'..=b'9' => self.lex_int(),
            b'-' if self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit) => self.lex_int(),
            c if is_ident_start(c) => self.lex_ident(),
            other => {
                return Err(crate::error::Error::unsupported_at(
                    format!("unexpected character '{}'", other as char),
                    start,
                ))
            }
        };
        Ok(Token { kind, pos: start })
    }

    fn expect_byte(&mut self, first: u8, second: u8) -> crate::error::Result<()> {
        debug_assert_eq!(self.peek_byte(), Some(first));
        self.pos += 1;
        if self.peek_byte() == Some(second) {
            self.pos += 1;
            Ok(())
        } else {
            Err(crate::error::Error::unsupported_at(
                "expected '=' after '!'",
                self.pos,
            ))
        }
    }

    fn lex_string(&mut self, quote: u8) -> crate::error::Result<TokenKind> {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        while self.peek_byte().is_some_and(|b| b != quote) {
            self.pos += 1;
        }
        if self.peek_byte() != Some(quote) {
            return Err(crate::error::Error::unsupported_at(
                "unterminated string literal",
                start,
            ));
        }
        let content = std::str::from_utf8(&self.bytes[content_start..self.pos])
            .map_err(|_| crate::error::Error::unsupported_at("invalid utf-8 in string literal", start))?
            .to_string();
        self.pos += 1; // closing quote
        Ok(TokenKind::Str(content))
    }

    fn lex_int(&mut self) -> TokenKind {
        let start = self.pos;
        if self.peek_byte() == Some(b'-') {
            self.pos += 1;
        }
        while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap();
        TokenKind::Int(text.parse().unwrap_or(0))
    }

    fn lex_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek_byte().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap();
        TokenKind::Ident(text.to_string())
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b':' || b == b'.'
}
