use crate::{char_is_ident_continue, char_is_ident_start, Lexer};
use core::tokens::{Token, TokenKind};

const STRING_DELIM: char = '"';

impl<'a> Lexer<'a> {
  pub(crate) fn next_code_token(&mut self) -> Token {
    self.skip_whitespace_and_comments();

    let start = self.current;
    let line = self.line;

    if self.is_at_end() {
      return self.make_token(TokenKind::Eof, start, line, false);
    }

    let c = self.advance();

    if char_is_ident_start!(c) {
      return self.identifier_or_keyword(start, line);
    }

    if c == STRING_DELIM {
      return self.string_literal(start, line);
    }

    let kind = match c {
      '(' => TokenKind::LeftParen,
      ')' => TokenKind::RightParen,
      ',' => TokenKind::Comma,
      ':' => TokenKind::Colon,
      '{' => TokenKind::LeftCurly,
      '}' => TokenKind::RightCurly,
      '=' if self.peek() == '=' => {
        self.advance();
        TokenKind::EqualEqual
      }
      '!' if self.peek() == '=' => {
        self.advance();
        TokenKind::BangEqual
      }
      other => TokenKind::Error(format!("unexpected character `{}`", other)),
    };

    self.make_token(kind, start, line, false)
  }

  fn skip_whitespace_and_comments(&mut self) {
    loop {
      match self.peek() {
        ' ' | '\t' | '\r' | '\n' => {
          self.advance();
        }
        '\\' if self.peek_at(1) == '#' => {
          self.advance();
          self.advance();
          while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
          }
        }
        _ => break,
      }
    }
  }

  fn identifier_or_keyword(&mut self, start: usize, line: u32) -> Token {
    while !self.is_at_end() && char_is_ident_continue!(self.peek()) {
      self.advance();
    }
    let word: String = self.source[start..self.current].iter().collect();
    let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier);
    self.make_token(kind, start, line, false)
  }

  fn string_literal(&mut self, start: usize, line: u32) -> Token {
    while !self.is_at_end() && self.peek() != STRING_DELIM {
      self.advance();
    }

    if self.is_at_end() {
      return self.error_token("unterminated string literal".to_string(), line);
    }

    // Consume the closing delimiter.
    self.advance();
    self.make_token(TokenKind::StringLiteral, start, line, false)
  }
}
