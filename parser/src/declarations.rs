use std::sync::Arc;

use core::ast::{AstNodeKind, NodeIdx, ParamInfo, ProcedureDeclNode, ProcedureKind, TypeTag};
use core::tokens::TokenKind;

use crate::Parser;

impl<'a> Parser<'a> {
  pub(crate) fn source_file(&mut self) -> NodeIdx {
    let line = self.current.line;
    let mut decls = Vec::new();
    while !matches!(self.current.kind, TokenKind::Eof) {
      match self.current.kind {
        TokenKind::Function => decls.push(self.procedure_decl(ProcedureKind::Function)),
        TokenKind::Passage => decls.push(self.procedure_decl(ProcedureKind::Passage)),
        _ => {
          self.error_at_current("expected a `function` or `passage` declaration".to_string());
          self.synchronize();
        }
      }
    }
    self.push(AstNodeKind::SourceFile(decls), line)
  }

  fn procedure_decl(&mut self, kind: ProcedureKind) -> NodeIdx {
    let line = self.current.line;
    self.advance(); // consume `function`/`passage`

    let name: Arc<str> = if self.check(TokenKind::Identifier) {
      let text = self.lexeme(&self.current.clone());
      self.advance();
      text.into()
    } else {
      self.error_at_current("expected a procedure name".to_string());
      "<error>".into()
    };

    self.expect(TokenKind::LeftParen, "expected `(` after procedure name");
    let params = self.param_list();
    self.expect(TokenKind::RightParen, "expected `)` after parameter list");
    self.expect(TokenKind::Colon, "expected `:` before the return type");

    // The return-type keyword is the last code-mode token of the signature.
    // A `passage`'s body starts in lecture mode immediately after it, and the
    // mode switch must happen before the `advance()` that consumes the
    // return-type keyword, since that same `advance()` is what pulls the
    // body's first token from the scanner.
    let return_type = self.type_tag();
    let body = match kind {
      ProcedureKind::Function => {
        self.advance(); // consume the return-type keyword, still in code mode
        self.code_block_body()
      }
      ProcedureKind::Passage => {
        self.lexer.enter_lecture();
        self.advance(); // consume the return-type keyword, body starts in lecture mode
        self.lecture_block_body()
      }
    };

    self.push(
      AstNodeKind::ProcedureDecl(ProcedureDeclNode {
        kind,
        package: self.package.clone(),
        name,
        return_type,
        params,
        body,
      }),
      line,
    )
  }

  fn param_list(&mut self) -> Vec<ParamInfo> {
    let mut params = Vec::new();
    if self.check(TokenKind::RightParen) {
      return params;
    }
    loop {
      let name: Arc<str> = if self.check(TokenKind::Identifier) {
        let text = self.lexeme(&self.current.clone());
        self.advance();
        text.into()
      } else {
        self.error_at_current("expected a parameter name".to_string());
        "<error>".into()
      };
      self.expect(TokenKind::Colon, "expected `:` before the parameter's type");
      let type_tag = self.type_tag();
      self.advance();
      params.push(ParamInfo { name, type_tag });
      if !self.matches(TokenKind::Comma) {
        break;
      }
    }
    params
  }

  /// Reads the type tag off `self.current` without consuming it — callers
  /// that need a mode switch (a `passage`'s return type) must do that before
  /// calling `advance()` themselves.
  fn type_tag(&mut self) -> TypeTag {
    match self.current.kind {
      TokenKind::KwInt => TypeTag::Int,
      TokenKind::KwFloat => TypeTag::Float,
      TokenKind::KwBnum => TypeTag::Bnum,
      TokenKind::KwBool => TypeTag::Bool,
      TokenKind::KwString => TypeTag::String,
      TokenKind::KwVoid => TypeTag::Void,
      _ => {
        self.error_at_current("expected a type".to_string());
        TypeTag::Invalid
      }
    }
  }
}
