use std::cell::Cell;
use std::sync::Arc;

use core::ast::{AstNodeKind, BinOp, BinaryNode, NodeIdx};
use core::tokens::TokenKind;

use crate::precedence::{get_rule, InfixFn, Precedence, PrefixFn};
use crate::Parser;

impl<'a> Parser<'a> {
  pub(crate) fn parse_expression(&mut self) -> NodeIdx {
    self.parse_precedence(Precedence::Assignment)
  }

  fn parse_precedence(&mut self, precedence: Precedence) -> NodeIdx {
    self.advance();
    let rule = get_rule(&self.previous.kind);
    let mut node = match rule.prefix {
      Some(prefix) => self.run_prefix(prefix),
      None => {
        self.error_at_previous("expected an expression".to_string());
        self.push(AstNodeKind::BoolLiteral(false), self.previous.line)
      }
    };

    while precedence <= get_rule(&self.current.kind).precedence {
      self.advance();
      let rule = get_rule(&self.previous.kind);
      let infix = rule.infix.expect("infix rule guaranteed by the precedence check above");
      node = self.run_infix(infix, node);
    }

    node
  }

  fn run_prefix(&mut self, prefix: PrefixFn) -> NodeIdx {
    match prefix {
      PrefixFn::BoolLiteral => self.bool_literal(),
      PrefixFn::StringLiteral => self.string_literal(),
      PrefixFn::Listen => self.listen_expr(),
      PrefixFn::Curlies => self.curlies_expr(),
    }
  }

  fn run_infix(&mut self, infix: InfixFn, lhs: NodeIdx) -> NodeIdx {
    match infix {
      InfixFn::Equality => self.equality_expr(lhs),
    }
  }

  fn bool_literal(&mut self) -> NodeIdx {
    let line = self.previous.line;
    let value = matches!(self.previous.kind, TokenKind::True);
    self.push(AstNodeKind::BoolLiteral(value), line)
  }

  fn string_literal(&mut self) -> NodeIdx {
    let line = self.previous.line;
    let text: Arc<str> = self.lexeme(&self.previous.clone()).into();
    self.push(AstNodeKind::StringLiteral(text), line)
  }

  /// `listen ( options-expression )`: suspends the VM for player input, typed
  /// by an options expression (e.g. a string naming the choice set).
  fn listen_expr(&mut self) -> NodeIdx {
    let line = self.previous.line;
    self.expect(TokenKind::LeftParen, "expected `(` after `listen`");
    let options = self.parse_expression();
    self.expect(TokenKind::RightParen, "expected `)` after `listen`'s argument");
    self.push(AstNodeKind::Listen(options), line)
  }

  /// `{ expression }` used as a sub-expression (not a direct block
  /// statement): grouping plus an implicit stringify mark, with no `OpSay`
  /// emitted around it. The code generator tells the two apart structurally,
  /// by whether the `Curlies` node sits at a block's statement position.
  fn curlies_expr(&mut self) -> NodeIdx {
    let line = self.previous.line;
    let inner = self.parse_expression();
    self.expect(TokenKind::RightCurly, "expected `}`");
    self.push(AstNodeKind::Curlies(inner), line)
  }

  fn equality_expr(&mut self, lhs: NodeIdx) -> NodeIdx {
    let line = self.previous.line;
    let op = match self.previous.kind {
      TokenKind::EqualEqual => BinOp::Eq,
      TokenKind::BangEqual => BinOp::NotEq,
      _ => unreachable!("equality_expr only runs for `==`/`!=`"),
    };
    // Left-associative: the right-hand side binds no looser than one level
    // tighter than equality itself.
    let rhs = self.parse_precedence(Precedence::Equality.next());
    self.push(AstNodeKind::Binary(BinaryNode { op, lhs, rhs, ty: Cell::new(None) }), line)
  }
}
