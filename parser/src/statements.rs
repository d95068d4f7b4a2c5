use std::sync::Arc;

use core::ast::{AstNodeKind, BlockNode, ElseBranch, IfStmtNode, NodeIdx};
use core::tokens::TokenKind;

use crate::Parser;

impl<'a> Parser<'a> {
  fn push_block(&mut self, statements: Vec<NodeIdx>, line: u32) -> NodeIdx {
    self.push(AstNodeKind::Block(BlockNode { statements }), line)
  }

  /// Parses a code-mode block (a `function` body): a sequence of statements
  /// terminated by a plain `end`. Precondition: `self.current` already holds
  /// the block's first token, scanned in code mode.
  pub(crate) fn code_block_body(&mut self) -> NodeIdx {
    let line = self.current.line;
    let mut statements = Vec::new();
    while !matches!(self.current.kind, TokenKind::End | TokenKind::Eof) {
      statements.push(self.code_statement());
    }
    self.expect(TokenKind::End, "expected `end` to close this block");
    self.push_block(statements, line)
  }

  fn code_statement(&mut self) -> NodeIdx {
    match self.current.kind {
      TokenKind::If => self.if_statement(),
      TokenKind::Say => self.say_statement(),
      TokenKind::LeftCurly => self.curlies_statement(),
      _ => self.expression_statement(),
    }
  }

  /// Parses a lecture-mode block (a `passage` body, a `say` body, or an
  /// `if`/`elseif`/`else` branch body): a sequence of statements terminated
  /// by a backslashed `\end`. Precondition: `self.current` already holds the
  /// block's first token, scanned in lecture mode.
  pub(crate) fn lecture_block_body(&mut self) -> NodeIdx {
    let line = self.current.line;
    let mut statements = Vec::new();
    while !self.is_lecture_terminator() && !matches!(self.current.kind, TokenKind::Eof) {
      statements.push(self.lecture_statement());
    }
    if self.is_lecture_terminator() {
      self.lexer.set_code_mode();
      self.advance(); // consume `\end`, fetch the next token in code mode
    } else {
      self.error_at_current("expected `\\end` to close this block".to_string());
    }
    self.push_block(statements, line)
  }

  fn lecture_statement(&mut self) -> NodeIdx {
    match &self.current.kind {
      TokenKind::Lecture(text) => {
        let line = self.current.line;
        let text: Arc<str> = text.as_str().into();
        self.advance();
        self.push(AstNodeKind::Lecture(text), line)
      }
      TokenKind::LeftCurly => self.curlies_statement(),
      TokenKind::If => self.if_statement(),
      TokenKind::Say => self.say_statement(),
      other => {
        self.error_at_current(format!("unexpected {:?} inside lecture text", other));
        self.synchronize_lecture();
        self.push(AstNodeKind::Lecture("".into()), self.current.line)
      }
    }
  }

  /// Parses `{ expression }`, used both as a direct block statement (where
  /// the code generator treats it as narration, emitting `OpSay`) and, via
  /// `PrefixFn::Curlies`, nested inside a larger expression (where it merely
  /// stringifies a sub-value). This handles only the statement-position form;
  /// `expressions.rs` handles the nested form.
  fn curlies_statement(&mut self) -> NodeIdx {
    let line = self.current.line;
    let resume = self.lexer.mode() == lexer::Mode::Lecture;
    self.lexer.set_code_mode();
    self.advance(); // consume `{`, fetch the expression's first token in code mode
    let inner = self.parse_expression();
    if resume {
      if self.check(TokenKind::RightCurly) {
        self.lexer.resume_lecture();
        self.advance(); // consume `}`, fetch the next token back in lecture mode
      } else {
        self.error_at_current("expected `}`".to_string());
      }
    } else {
      self.expect(TokenKind::RightCurly, "expected `}`");
    }
    self.push(AstNodeKind::Curlies(inner), line)
  }

  fn if_statement(&mut self) -> NodeIdx {
    let line = self.current.line;
    // `if` may arrive either as an ordinary code-mode keyword (inside a
    // `function` body) or via the scanner's bare-keyword break inside an
    // already-open lecture block; either way the condition is parsed in code
    // mode. Remember which one so the closing `end` can hand control back to
    // the right mode.
    let resume_lecture = self.lexer.mode() == lexer::Mode::Lecture;
    self.lexer.set_code_mode();
    self.advance(); // consume `if`, fetch the condition's first token in code mode
    let node = self.if_tail(line);
    self.close_if_statement(resume_lecture);
    node
  }

  /// Shared by a leading `if` and by each `elseif` in a chain: parses the
  /// condition, `then`, the branch body, and a possible further branch.
  /// Unlike `if_statement`, does not consume the chain's closing `end` — only
  /// the outermost `if_statement` call does that.
  fn if_tail(&mut self, line: u32) -> NodeIdx {
    let condition = self.parse_expression();
    if self.check(TokenKind::Then) {
      // The mode switch must happen before the `advance()` that consumes
      // `then`, since that same call is what pulls the branch body's first
      // token from the scanner — `expect()` would advance in the still-code
      // mode and strand the body's opening token behind a discarded one.
      self.lexer.enter_lecture();
      self.advance(); // consume `then`, fetch the branch's first token in lecture mode
    } else {
      self.error_at_current("expected `then` after the condition".to_string());
    }
    let then_block = self.lecture_block_body();

    let else_branch = if self.check(TokenKind::Elseif) {
      let elseif_line = self.current.line;
      self.advance(); // consume `elseif`, condition parsed in the code mode we're already in
      Some(ElseBranch::ElseIf(self.if_tail(elseif_line)))
    } else if self.check(TokenKind::Else) {
      self.lexer.enter_lecture();
      self.advance(); // consume `else`, fetch the branch's first token in lecture mode
      Some(ElseBranch::Block(self.lecture_block_body()))
    } else {
      None
    };

    self.push(AstNodeKind::IfStmt(IfStmtNode { condition, then_block, else_branch }), line)
  }

  fn say_statement(&mut self) -> NodeIdx {
    let line = self.current.line;
    self.lexer.enter_lecture();
    self.advance(); // consume `say`, fetch the body's first token in lecture mode
    let body = self.lecture_block_body();
    self.push(AstNodeKind::Say(body), line)
  }

  fn expression_statement(&mut self) -> NodeIdx {
    let line = self.current.line;
    let expr = self.parse_expression();
    self.push(AstNodeKind::ExpressionStmt(expr), line)
  }

  /// Called on the outermost `if_statement` only, once every branch has been
  /// parsed: consumes the plain `end` that closes the whole chain, restoring
  /// lecture mode first if the `if` was itself a bare-keyword statement inside
  /// an enclosing lecture block (mirroring `curlies_statement`'s `resume`
  /// handling of the same problem around `}`).
  fn close_if_statement(&mut self, resume_lecture: bool) {
    if self.check(TokenKind::End) {
      if resume_lecture {
        self.lexer.resume_lecture();
      }
      self.advance(); // consume `end`, fetch the next token in the restored mode
    } else {
      self.error_at_current("expected `end` to close `if`".to_string());
    }
  }

  /// Recovery within a malformed lecture block: skip to the next plausible
  /// statement boundary (a lecture-text token, a structural break, or the
  /// block's terminator) instead of aborting the whole file.
  fn synchronize_lecture(&mut self) {
    self.panic_mode = false;
    while !self.is_lecture_terminator() && !matches!(self.current.kind, TokenKind::Eof) {
      if matches!(self.current.kind, TokenKind::Lecture(_) | TokenKind::LeftCurly | TokenKind::If | TokenKind::Say) {
        return;
      }
      self.advance();
    }
  }
}
