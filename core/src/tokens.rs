use std::path::Path;

/// The index of a [`Token`] inside a [`TokenList`]. Kept as a distinct type (rather
/// than a bare `usize`) so that a token index can never be silently used where a
/// byte offset or AST node index was meant.
pub type TokenIdx = usize;

/// The kind of a lexical token produced by the scanner.
///
/// Two variants carry an owned payload instead of being recovered from a source
/// span: [`TokenKind::Lecture`] (the scanner strips the common indentation prefix
/// and resolves `\\` escapes while scanning, so the cooked text is no longer a
/// contiguous slice of the source) and [`TokenKind::Error`] (the lexeme *is* the
/// diagnostic message).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
  // Punctuators
  LeftParen,
  RightParen,
  Comma,
  Colon,
  LeftCurly,
  RightCurly,

  // Operators
  EqualEqual,
  BangEqual,

  // Literals
  Identifier,
  StringLiteral,
  Lecture(String),

  // Keywords
  Function,
  Passage,
  End,
  If,
  Then,
  Else,
  Elseif,
  Say,
  Listen,
  True,
  False,
  KwInt,
  KwFloat,
  KwBnum,
  KwBool,
  KwString,
  KwVoid,

  Error(String),
  Eof,
}

impl TokenKind {
  /// Looks up the keyword token kind for an identifier-shaped lexeme, if any.
  pub fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
      "function" => TokenKind::Function,
      "passage" => TokenKind::Passage,
      "end" => TokenKind::End,
      "if" => TokenKind::If,
      "then" => TokenKind::Then,
      "else" => TokenKind::Else,
      "elseif" => TokenKind::Elseif,
      "say" => TokenKind::Say,
      "listen" => TokenKind::Listen,
      "true" => TokenKind::True,
      "false" => TokenKind::False,
      "int" => TokenKind::KwInt,
      "float" => TokenKind::KwFloat,
      "bnum" => TokenKind::KwBnum,
      "bool" => TokenKind::KwBool,
      "string" => TokenKind::KwString,
      "void" => TokenKind::KwVoid,
      _ => return None,
    })
  }
}

/// A single lexical token.
///
/// `span` indexes into the source character buffer and is meaningful only for
/// token kinds whose lexeme is a verbatim slice of the source; [`TokenKind::Lecture`]
/// and [`TokenKind::Error`] carry their text inline instead.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub line: u32,
  pub span: (usize, usize),
  /// True iff the raw lexeme that produced this token began with `\`.
  pub backslashed: bool,
}

impl Token {
  pub fn is_error(&self) -> bool {
    matches!(self.kind, TokenKind::Error(_))
  }

  pub fn is_eof(&self) -> bool {
    matches!(self.kind, TokenKind::Eof)
  }
}

/// The source-level location of a token, used for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct TokenLoc {
  pub line: u32,
}

/// A flat list of tokens for a single source file, paired with the character
/// buffer they were scanned from. Mirrors the teacher's `TokenList`/`TokenIdx`
/// split: tokens are stored without their lexeme text so that the (usually
/// unused) text can be recovered lazily by slicing `src`.
pub struct TokenList<'a> {
  pub tokens: Vec<Token>,
  pub src: &'a [char],
  pub path: &'a Path,
}

impl<'a> TokenList<'a> {
  pub fn new(path: &'a Path, src: &'a [char], tokens: Vec<Token>) -> Self {
    Self { tokens, src, path }
  }

  pub fn get(&self, idx: TokenIdx) -> &Token {
    &self.tokens[idx]
  }

  /// Recovers the textual lexeme of the token at `idx`.
  pub fn lexeme(&self, idx: TokenIdx) -> String {
    let tok = &self.tokens[idx];
    match &tok.kind {
      TokenKind::Error(msg) => msg.clone(),
      TokenKind::Lecture(text) => text.clone(),
      TokenKind::Eof => "end of file".to_string(),
      _ => self.src[tok.span.0..tok.span.1].iter().collect(),
    }
  }

  pub fn location(&self, idx: TokenIdx) -> TokenLoc {
    TokenLoc { line: self.tokens[idx].line }
  }
}
