use crate::{char_is_ident_continue, Lexer};
use core::tokens::{Token, TokenKind};

/// Bare (non-backslashed) keywords that may open a nested statement directly
/// inside a lecture block, without an escaping `\`. Recognized only at the
/// start of a line so that ordinary prose beginning with these words mid-line
/// is never mistaken for one.
const BARE_KEYWORDS: [&str; 2] = ["if", "say"];

impl<'a> Lexer<'a> {
  pub(crate) fn next_lecture_token(&mut self) -> Token {
    if self.consume_leading_newline {
      self.consume_leading_newline = false;
      if self.peek() == '\n' {
        self.advance();
      }
    }

    let start = self.current;
    let line = self.line;
    let mut text = String::new();

    loop {
      if self.is_at_end() {
        break;
      }

      if self.at_line_start {
        match self.consume_lecture_prefix() {
          Ok(()) => {}
          Err(message) => return self.error_token(message, self.line),
        }
        if self.is_at_end() || self.peek_bare_keyword() {
          break;
        }
      }

      match self.peek() {
        '\\' if self.peek_at(1) == '\\' => {
          self.advance();
          self.advance();
          text.push('\\');
        }
        '\\' if self.peek_at(1) == '#' => {
          self.advance();
          self.advance();
          while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
          }
          if !self.is_at_end() {
            self.advance();
          }
        }
        '\\' if is_backslashed_keyword_start(self.peek_at(1)) => break,
        '\\' => {
          return self.error_token(
            format!("invalid escape sequence `\\{}` in lecture text", self.peek_at(1)),
            self.line,
          )
        }
        '{' => break,
        '\n' => {
          self.advance();
          text.push('\n');
        }
        c => {
          self.advance();
          text.push(c);
        }
      }
    }

    if text.is_empty() {
      return self.token_after_lecture_break(line);
    }

    Token {
      kind: TokenKind::Lecture(text),
      line,
      span: (start, self.current),
      backslashed: false,
    }
  }

  /// Consumes (and validates against the established prefix) the leading
  /// horizontal whitespace of the line the cursor currently sits at the start
  /// of. Any whitespace beyond the established prefix is left in place so it
  /// becomes part of the line's text.
  fn consume_lecture_prefix(&mut self) -> Result<(), String> {
    let run_start = self.current;
    let mut saw_space = false;
    let mut saw_tab = false;
    while matches!(self.peek(), ' ' | '\t') {
      if self.peek() == ' ' {
        saw_space = true;
      } else {
        saw_tab = true;
      }
      self.advance();
    }
    let run: Vec<char> = self.source[run_start..self.current].to_vec();

    if saw_space && saw_tab {
      return Err("lecture indentation mixes tabs and spaces".to_string());
    }

    let rest_blank = self.is_at_end() || matches!(self.peek(), '\n');

    match &self.lecture_prefix {
      None => {
        if !rest_blank {
          self.lecture_prefix = Some(run);
        }
        Ok(())
      }
      Some(prefix) => {
        if rest_blank {
          return Ok(());
        }
        if run.len() >= prefix.len() && run[..prefix.len()] == prefix[..] {
          let extra = run.len() - prefix.len();
          self.current -= extra;
          // Rewinding the cursor without going through `advance` would leave
          // `at_line_start` stuck at `false`; it must stay `false` here since
          // we are no longer at column zero of the line.
          self.at_line_start = false;
          Ok(())
        } else {
          Err("lecture line does not match the block's established indentation".to_string())
        }
      }
    }
  }

  /// True if the cursor sits at a bare (non-backslashed) `if` or `say`
  /// immediately followed by a word boundary. Only ever checked right after
  /// [`Lexer::consume_lecture_prefix`], i.e. at the first non-blank column of
  /// a line.
  fn peek_bare_keyword(&self) -> bool {
    BARE_KEYWORDS.iter().any(|word| {
      word.chars().enumerate().all(|(i, wc)| self.peek_at(i) == wc)
        && !char_is_ident_continue!(self.peek_at(word.len()))
    })
  }

  /// Called when a lecture-text scan stops immediately (no text accumulated):
  /// the next character is `{`, the start of a backslashed keyword, a bare
  /// `if`/`say`, or EOF.
  fn token_after_lecture_break(&mut self, line: u32) -> Token {
    if self.is_at_end() {
      return self.make_token(TokenKind::Eof, self.current, line, false);
    }

    if self.peek() == '{' {
      let start = self.current;
      self.advance();
      return self.make_token(TokenKind::LeftCurly, start, line, false);
    }

    if self.peek() != '\\' {
      // A bare keyword (`if`/`say`) opening a nested statement.
      let start = self.current;
      while !self.is_at_end() && char_is_ident_continue!(self.peek()) {
        self.advance();
      }
      let word: String = self.source[start..self.current].iter().collect();
      return match TokenKind::keyword(&word) {
        Some(kind) => self.make_token(kind, start, line, false),
        None => self.error_token(format!("unexpected `{}` in lecture text", word), line),
      };
    }

    // A backslashed keyword: `\` followed by an identifier.
    let start = self.current;
    self.advance(); // the backslash
    let ident_start = self.current;
    while !self.is_at_end() && char_is_ident_continue!(self.peek()) {
      self.advance();
    }
    let word: String = self.source[ident_start..self.current].iter().collect();
    match TokenKind::keyword(&word) {
      Some(kind) => self.make_token(kind, start, line, true),
      None => Token {
        kind: TokenKind::Error(format!("unknown backslashed keyword `\\{}`", word)),
        line,
        span: (start, self.current),
        backslashed: true,
      },
    }
  }
}

fn is_backslashed_keyword_start(c: char) -> bool {
  c.is_alphabetic() || c == '_'
}
