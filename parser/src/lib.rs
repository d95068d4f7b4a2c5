//! The Pratt parser: consumes tokens from a [`lexer::Lexer`] and builds a
//! per-file [`core::ast::AstArena`]. Drives the scanner's mode transitions
//! itself (the scanner never switches its own mode); see the `*_block_body`
//! helpers in `statements.rs` for the exact choreography.

mod declarations;
mod expressions;
mod precedence;
mod statements;

use std::sync::Arc;

use core::ast::{AstArena, NodeIdx};
use core::errors::CompileTimeError;
use core::tokens::{Token, TokenKind};
use lexer::Lexer;

pub struct Parser<'a> {
  lexer: Lexer<'a>,
  source: &'a [char],
  source_file: Arc<str>,
  package: Arc<str>,
  previous: Token,
  current: Token,
  arena: AstArena,
  errors: Vec<CompileTimeError>,
  panic_mode: bool,
}

/// Parses one source file into its own AST arena. `package` is the
/// fully-qualified package path this file belongs to (derived from its
/// location relative to the storyworld root), supplied by the caller rather
/// than computed here so that this crate never touches the filesystem.
///
/// Always returns an arena and a root [`NodeIdx`], even when `errors` is
/// non-empty: panic-mode recovery means the tree may be missing pieces, but
/// it is never entirely absent, so a caller that wants to keep going (e.g.
/// to report more than one file's errors per compile attempt) can.
pub fn parse(source: &[char], source_file: Arc<str>, package: Arc<str>) -> (AstArena, NodeIdx, Vec<CompileTimeError>) {
  let placeholder = Token { kind: TokenKind::Eof, line: 0, span: (0, 0), backslashed: false };
  let mut parser = Parser {
    lexer: Lexer::new(source),
    source,
    source_file,
    package,
    previous: placeholder.clone(),
    current: placeholder,
    arena: AstArena::default(),
    errors: Vec::new(),
    panic_mode: false,
  };
  parser.advance();
  let root = parser.source_file();
  (parser.arena, root, parser.errors)
}

impl<'a> Parser<'a> {
  fn push(&mut self, kind: core::ast::AstNodeKind, line: u32) -> NodeIdx {
    self.arena.push(self.source_file.clone(), line, kind)
  }

  /// The cooked text of `tok`'s lexeme, stripping the surrounding quotes for
  /// a string literal.
  fn lexeme(&self, tok: &Token) -> String {
    match &tok.kind {
      TokenKind::Lecture(text) => text.clone(),
      TokenKind::Error(msg) => msg.clone(),
      TokenKind::Eof => String::new(),
      TokenKind::StringLiteral => self.source[tok.span.0 + 1..tok.span.1 - 1].iter().collect(),
      _ => self.source[tok.span.0..tok.span.1].iter().collect(),
    }
  }

  fn check(&self, kind: TokenKind) -> bool {
    self.current.kind == kind
  }

  fn is_lecture_terminator(&self) -> bool {
    self.current.kind == TokenKind::End && self.current.backslashed
  }

  /// Moves past the current token, pulling a fresh one from the scanner under
  /// whichever mode is active *at the moment this is called*. Any mode switch
  /// the parser wants to take effect for the upcoming token must happen
  /// before this call, never after.
  fn advance(&mut self) {
    let next = self.next_raw_token();
    self.previous = std::mem::replace(&mut self.current, next);
    while let TokenKind::Error(message) = &self.current.kind {
      let message = message.clone();
      self.error_at_current(message);
      self.current = self.next_raw_token();
    }
  }

  fn next_raw_token(&mut self) -> Token {
    self.lexer.next_token()
  }

  fn matches(&mut self, kind: TokenKind) -> bool {
    if self.check(kind) {
      self.advance();
      true
    } else {
      false
    }
  }

  fn expect(&mut self, kind: TokenKind, message: &str) {
    if self.check(kind) {
      self.advance();
    } else {
      self.error_at_current(message.to_string());
    }
  }

  fn error_at_current(&mut self, message: String) {
    self.error_at(self.current.clone(), message);
  }

  fn error_at_previous(&mut self, message: String) {
    self.error_at(self.previous.clone(), message);
  }

  fn error_at(&mut self, tok: Token, message: String) {
    if self.panic_mode {
      return;
    }
    self.panic_mode = true;
    let lexeme = self.lexeme(&tok);
    self.errors.push(CompileTimeError {
      file: self.source_file.to_string(),
      line: tok.line as i64,
      lexeme,
      message,
    });
  }

  /// Skips tokens until one that plausibly starts a new declaration, so that
  /// a single malformed procedure doesn't cascade into spurious errors for
  /// everything that follows it in the file.
  fn synchronize(&mut self) {
    self.panic_mode = false;
    while !matches!(self.current.kind, TokenKind::Eof) {
      if matches!(self.current.kind, TokenKind::Function | TokenKind::Passage) {
        return;
      }
      self.advance();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use core::ast::{AstNodeKind, ElseBranch, ProcedureKind, TypeTag};

  fn parse_src(src: &str) -> (AstArena, NodeIdx, Vec<CompileTimeError>) {
    let chars: Vec<char> = src.chars().collect();
    parse(&chars, Arc::from("<test>"), Arc::from("/"))
  }

  #[test]
  fn parses_an_empty_function_body() {
    let (arena, root, errors) = parse_src("function f() : void\nend");
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

    let decls = match &arena.get(root).kind {
      AstNodeKind::SourceFile(decls) => decls.clone(),
      other => panic!("expected a SourceFile, got node variant {:?}", std::mem::discriminant(other)),
    };
    assert_eq!(decls.len(), 1);

    match &arena.get(decls[0]).kind {
      AstNodeKind::ProcedureDecl(proc) => {
        assert_eq!(proc.kind, ProcedureKind::Function);
        assert_eq!(&*proc.name, "f");
        assert_eq!(proc.return_type, TypeTag::Void);
        assert!(proc.params.is_empty());
        match &arena.get(proc.body).kind {
          AstNodeKind::Block(block) => assert!(block.statements.is_empty()),
          other => panic!("expected an empty Block, got node variant {:?}", std::mem::discriminant(other)),
        }
      }
      other => panic!("expected a ProcedureDecl, got node variant {:?}", std::mem::discriminant(other)),
    }
  }

  #[test]
  fn parses_a_passage_with_a_typed_parameter() {
    let (arena, root, errors) = parse_src("passage main(name: string) : void\nHello.\n\\end");
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

    let decls = match &arena.get(root).kind {
      AstNodeKind::SourceFile(decls) => decls.clone(),
      other => panic!("expected a SourceFile, got node variant {:?}", std::mem::discriminant(other)),
    };
    let proc = match &arena.get(decls[0]).kind {
      AstNodeKind::ProcedureDecl(proc) => proc,
      other => panic!("expected a ProcedureDecl, got node variant {:?}", std::mem::discriminant(other)),
    };
    assert_eq!(proc.kind, ProcedureKind::Passage);
    assert_eq!(proc.params.len(), 1);
    assert_eq!(&*proc.params[0].name, "name");
    assert_eq!(proc.params[0].type_tag, TypeTag::String);

    match &arena.get(proc.body).kind {
      AstNodeKind::Block(block) => {
        assert_eq!(block.statements.len(), 1);
        match &arena.get(block.statements[0]).kind {
          AstNodeKind::Lecture(text) => assert_eq!(&**text, "Hello.\n"),
          other => panic!("expected a Lecture statement, got node variant {:?}", std::mem::discriminant(other)),
        }
      }
      other => panic!("expected a Block, got node variant {:?}", std::mem::discriminant(other)),
    }
  }

  #[test]
  fn if_then_else_produces_an_if_stmt_node() {
    // Each branch is terminated by its own backslashed `\end`, which flips the
    // scanner back to code mode; `else` and the chain's closing `end` are
    // therefore ordinary code-mode keywords, not backslashed ones (only the
    // per-branch terminators are escaped). See `spec.md` §8's worked example.
    let src = "passage main() : void\nif true then\nYes\n\\end\nelse\nNo\n\\end\nend\n\\end";
    let (arena, root, errors) = parse_src(src);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

    let decls = match &arena.get(root).kind {
      AstNodeKind::SourceFile(decls) => decls.clone(),
      other => panic!("expected a SourceFile, got node variant {:?}", std::mem::discriminant(other)),
    };
    let proc = match &arena.get(decls[0]).kind {
      AstNodeKind::ProcedureDecl(proc) => proc,
      other => panic!("expected a ProcedureDecl, got node variant {:?}", std::mem::discriminant(other)),
    };
    let block = match &arena.get(proc.body).kind {
      AstNodeKind::Block(block) => block,
      other => panic!("expected a Block, got node variant {:?}", std::mem::discriminant(other)),
    };
    // The if-chain's closing `end`, once plain, hands the scanner back to
    // lecture mode for the passage body's own `\end` — the newline between
    // them surfaces as a trailing (near-empty) Lecture statement.
    assert_eq!(block.statements.len(), 2);

    let if_stmt = match &arena.get(block.statements[0]).kind {
      AstNodeKind::IfStmt(if_stmt) => if_stmt,
      other => panic!("expected an IfStmt, got node variant {:?}", std::mem::discriminant(other)),
    };
    assert!(if_stmt.else_branch.is_some());

    match &arena.get(if_stmt.then_block).kind {
      AstNodeKind::Block(block) => match &arena.get(block.statements[0]).kind {
        AstNodeKind::Lecture(text) => assert_eq!(&**text, "Yes\n"),
        other => panic!("expected a Lecture statement, got node variant {:?}", std::mem::discriminant(other)),
      },
      other => panic!("expected a Block, got node variant {:?}", std::mem::discriminant(other)),
    }

    match if_stmt.else_branch.as_ref().unwrap() {
      ElseBranch::Block(else_body) => match &arena.get(*else_body).kind {
        AstNodeKind::Block(block) => match &arena.get(block.statements[0]).kind {
          AstNodeKind::Lecture(text) => assert_eq!(&**text, "No\n"),
          other => panic!("expected a Lecture statement, got node variant {:?}", std::mem::discriminant(other)),
        },
        other => panic!("expected a Block, got node variant {:?}", std::mem::discriminant(other)),
      },
      ElseBranch::ElseIf(_) => panic!("expected a plain else block, got an elseif"),
    }
  }

  #[test]
  fn malformed_signature_accumulates_an_error_but_still_returns_a_tree() {
    let (arena, root, errors) = parse_src("function () : void\nend");
    assert!(!errors.is_empty());
    assert!(!arena.is_empty());
    match &arena.get(root).kind {
      AstNodeKind::SourceFile(_) => {}
      other => panic!("expected a SourceFile even on error, got node variant {:?}", std::mem::discriminant(other)),
    }
  }
}
