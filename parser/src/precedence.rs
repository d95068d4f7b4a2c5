use core::tokens::TokenKind;

/// Precedence levels in ascending order. Declaration order is the ordering
/// `derive(Ord)` uses, so `Precedence::Equality < Precedence::Call` holds the
/// way a reader expects from the name alone.
///
/// Several levels (`Or`, `And`, `Term`, `Factor`, `Blend`, `Unary`, `Power`,
/// `Call`) have no operator bound to them at this revision of the grammar —
/// the language currently has only equality comparisons — but the table is
/// kept at full width so a later operator slots in without renumbering
/// anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
  None,
  Assignment,
  Or,
  And,
  Equality,
  Comparison,
  Term,
  Factor,
  Blend,
  Unary,
  Power,
  Call,
  Primary,
}

impl Precedence {
  /// The next tighter-binding level, used to parse the right-hand side of a
  /// left-associative infix operator. `Primary` is already the tightest level
  /// and maps to itself.
  pub fn next(self) -> Precedence {
    match self {
      Precedence::None => Precedence::Assignment,
      Precedence::Assignment => Precedence::Or,
      Precedence::Or => Precedence::And,
      Precedence::And => Precedence::Equality,
      Precedence::Equality => Precedence::Comparison,
      Precedence::Comparison => Precedence::Term,
      Precedence::Term => Precedence::Factor,
      Precedence::Factor => Precedence::Blend,
      Precedence::Blend => Precedence::Unary,
      Precedence::Unary => Precedence::Power,
      Precedence::Power => Precedence::Call,
      Precedence::Call | Precedence::Primary => Precedence::Primary,
    }
  }
}

/// The set of prefix parsing functions a token can be bound to.
#[derive(Debug, Clone, Copy)]
pub enum PrefixFn {
  BoolLiteral,
  StringLiteral,
  Listen,
  Curlies,
}

/// The set of infix parsing functions a token can be bound to.
#[derive(Debug, Clone, Copy)]
pub enum InfixFn {
  Equality,
}

pub struct ParserRule {
  pub prefix: Option<PrefixFn>,
  pub infix: Option<InfixFn>,
  pub precedence: Precedence,
}

pub fn get_rule(kind: &TokenKind) -> ParserRule {
  match kind {
    TokenKind::True | TokenKind::False => ParserRule {
      prefix: Some(PrefixFn::BoolLiteral),
      infix: None,
      precedence: Precedence::None,
    },
    TokenKind::StringLiteral => ParserRule {
      prefix: Some(PrefixFn::StringLiteral),
      infix: None,
      precedence: Precedence::None,
    },
    TokenKind::Listen => ParserRule {
      prefix: Some(PrefixFn::Listen),
      infix: None,
      precedence: Precedence::None,
    },
    TokenKind::LeftCurly => ParserRule {
      prefix: Some(PrefixFn::Curlies),
      infix: None,
      precedence: Precedence::None,
    },
    TokenKind::EqualEqual | TokenKind::BangEqual => ParserRule {
      prefix: None,
      infix: Some(InfixFn::Equality),
      precedence: Precedence::Equality,
    },
    _ => ParserRule { prefix: None, infix: None, precedence: Precedence::None },
  }
}
