//! The dual-mode scanner. `Mode::Code` is the default; the parser switches the
//! scanner into `Mode::Lecture` around `say` bodies and around a `passage`
//! body, and back the other way once the matching `\end` has been consumed.
//! Mode transitions are entirely parser-driven: the scanner never flips its
//! own mode, it only stops at a `{`, a backslashed keyword, a bare `if`/`say`
//! at the start of a line, or end of file and waits for the parser to decide
//! what comes next.

mod code_mode;
mod lecture_mode;

use core::tokens::{Token, TokenKind};

#[macro_export]
macro_rules! char_is_ident_start {
  ($ch:expr) => {{
    $ch.is_alphabetic() || $ch == '_'
  }};
}

#[macro_export]
macro_rules! char_is_ident_continue {
  ($ch:expr) => {{
    $ch.is_alphanumeric() || $ch == '_'
  }};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Code,
  Lecture,
}

/// The scanner. Holds a source buffer, a cursor, and the single mode scalar
/// the parser drives.
pub struct Lexer<'a> {
  source: &'a [char],
  current: usize,
  line: u32,
  mode: Mode,
  /// The common leading whitespace run established for the lecture block
  /// currently being scanned. Reset by [`Lexer::enter_lecture`].
  lecture_prefix: Option<Vec<char>>,
  /// Set by [`Lexer::enter_lecture`]; consumed (without being emitted) by the
  /// next call into lecture scanning.
  consume_leading_newline: bool,
  /// True iff the cursor sits immediately after a newline (or at the very
  /// start of the source). Tracked centrally in [`Lexer::advance`] so that
  /// resuming lecture scanning mid-line (after a `{ … }` break) never
  /// mistakes its position for a fresh line and tries to re-match the
  /// established indentation prefix.
  at_line_start: bool,
}

impl<'a> Lexer<'a> {
  pub fn new(source: &'a [char]) -> Self {
    Lexer {
      source,
      current: 0,
      line: 1,
      mode: Mode::Code,
      lecture_prefix: None,
      consume_leading_newline: false,
      at_line_start: true,
    }
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }

  /// Switches the scanner to code mode. Used by the parser after consuming a
  /// `\end` (or equivalent), and after a lecture's `{` to scan the embedded
  /// expression.
  pub fn set_code_mode(&mut self) {
    self.mode = Mode::Code;
  }

  /// Enters lecture mode for a brand new lecture block (a `passage` body, a
  /// `say` body, or an `if`/`elseif`/`else` branch body): resets the
  /// established indentation prefix and arranges for a single immediate
  /// newline to be swallowed.
  pub fn enter_lecture(&mut self) {
    self.mode = Mode::Lecture;
    self.lecture_prefix = None;
    self.consume_leading_newline = true;
    self.at_line_start = true;
  }

  /// Resumes lecture mode after a `{ … }` structural break within the same
  /// lecture block: keeps the already-established indentation prefix and does
  /// not swallow a leading newline.
  pub fn resume_lecture(&mut self) {
    self.mode = Mode::Lecture;
  }

  pub fn next_token(&mut self) -> Token {
    match self.mode {
      Mode::Code => self.next_code_token(),
      Mode::Lecture => self.next_lecture_token(),
    }
  }

  // --- shared cursor primitives ---

  fn is_at_end(&self) -> bool {
    self.current >= self.source.len()
  }

  fn peek(&self) -> char {
    if self.is_at_end() {
      '\0'
    } else {
      self.source[self.current]
    }
  }

  fn peek_at(&self, offset: usize) -> char {
    let idx = self.current + offset;
    if idx >= self.source.len() {
      '\0'
    } else {
      self.source[idx]
    }
  }

  fn advance(&mut self) -> char {
    let c = self.source[self.current];
    self.current += 1;
    if c == '\n' {
      self.line += 1;
      self.at_line_start = true;
    } else {
      self.at_line_start = false;
    }
    c
  }

  fn make_token(&self, kind: TokenKind, start: usize, line: u32, backslashed: bool) -> Token {
    Token { kind, line, span: (start, self.current), backslashed }
  }

  fn error_token(&self, message: String, line: u32) -> Token {
    Token {
      kind: TokenKind::Error(message),
      line,
      span: (self.current, self.current),
      backslashed: false,
    }
  }
}
