//! The Storyworld AST: a tagged-union arena plus a visitor trait that fires
//! mid-traversal "events" at documented positions. Modeling
//! this as a free `walk` function (rather than a method on the visitor trait)
//! keeps the arena borrow and the visitor's own `&mut self` borrow from
//! aliasing, which is what lets default visit methods recurse without fighting
//! the borrow checker.

use std::cell::Cell;
use std::sync::Arc;

/// The index of a node inside an [`AstArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
  Function,
  Passage,
}

/// A static type tag. `Invalid` is produced when type-checking fails and
/// lets later checks proceed without cascading spurious errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
  Invalid,
  Void,
  Int,
  Float,
  Bnum,
  Bool,
  String,
}

impl TypeTag {
  pub fn display_name(self) -> &'static str {
    match self {
      TypeTag::Invalid => "invalid",
      TypeTag::Void => "void",
      TypeTag::Int => "int",
      TypeTag::Float => "float",
      TypeTag::Bnum => "bnum",
      TypeTag::Bool => "bool",
      TypeTag::String => "string",
    }
  }
}

/// The only two infix operators the language supports at this revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
  Eq,
  NotEq,
}

impl BinOp {
  pub fn lexeme(self) -> &'static str {
    match self {
      BinOp::Eq => "==",
      BinOp::NotEq => "!=",
    }
  }
}

#[derive(Debug, Clone)]
pub struct ParamInfo {
  pub name: Arc<str>,
  pub type_tag: TypeTag,
}

pub struct ProcedureDeclNode {
  pub kind: ProcedureKind,
  /// Fully-qualified package path the procedure lives in, e.g. `/` or `/area/`.
  pub package: Arc<str>,
  pub name: Arc<str>,
  pub return_type: TypeTag,
  pub params: Vec<ParamInfo>,
  pub body: NodeIdx,
}

/// Builds `<package-path><name>`, e.g. `/area/foo`. `package` is always
/// expected to carry its trailing slash (the root package is `/` itself).
pub fn fq_name(package: &str, name: &str) -> String {
  format!("{}{}", package, name)
}

pub struct BlockNode {
  pub statements: Vec<NodeIdx>,
}

pub enum ElseBranch {
  Block(NodeIdx),
  ElseIf(NodeIdx),
}

pub struct IfStmtNode {
  pub condition: NodeIdx,
  pub then_block: NodeIdx,
  pub else_branch: Option<ElseBranch>,
}

pub struct BinaryNode {
  pub op: BinOp,
  pub lhs: NodeIdx,
  pub rhs: NodeIdx,
  /// Memoized result of the type checker: `None` until computed.
  pub ty: Cell<Option<TypeTag>>,
}

pub enum AstNodeKind {
  Storyworld(Vec<NodeIdx>),
  SourceFile(Vec<NodeIdx>),
  ProcedureDecl(ProcedureDeclNode),
  Block(BlockNode),
  IfStmt(IfStmtNode),
  ExpressionStmt(NodeIdx),
  Say(NodeIdx),
  Lecture(Arc<str>),
  Listen(NodeIdx),
  BoolLiteral(bool),
  StringLiteral(Arc<str>),
  Binary(BinaryNode),
  Curlies(NodeIdx),
}

/// Every AST node carries the file it came from and its source line.
pub struct AstNode {
  pub source_file: Arc<str>,
  pub line: u32,
  pub kind: AstNodeKind,
}

/// The Storyworld AST, stored as a flat arena. Nodes are never removed; a
/// [`NodeIdx`] is valid for the lifetime of the arena that produced it.
#[derive(Default)]
pub struct AstArena {
  nodes: Vec<AstNode>,
}

impl AstArena {
  pub fn push(&mut self, source_file: Arc<str>, line: u32, kind: AstNodeKind) -> NodeIdx {
    self.nodes.push(AstNode { source_file, line, kind });
    NodeIdx(self.nodes.len() - 1)
  }

  pub fn get(&self, idx: NodeIdx) -> &AstNode {
    &self.nodes[idx.0]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Appends every node of `other` onto `self`, rewriting internal [`NodeIdx`]
  /// references by the length `self` had before the append. Returns `root`
  /// (an index into `other`) translated into an index into `self`.
  ///
  /// Used by the Storyworld assembler to fold each parallel-parsed file's
  /// private arena into the shared Storyworld arena without re-parsing or
  /// deep-cloning node contents.
  pub fn splice_from(&mut self, other: AstArena, root: NodeIdx) -> NodeIdx {
    let offset = self.nodes.len();
    for mut node in other.nodes {
      shift_node_idx(&mut node.kind, offset);
      self.nodes.push(node);
    }
    NodeIdx(root.0 + offset)
  }
}

fn shift_idx(idx: &mut NodeIdx, offset: usize) {
  idx.0 += offset;
}

fn shift_node_idx(kind: &mut AstNodeKind, offset: usize) {
  match kind {
    AstNodeKind::Storyworld(children) | AstNodeKind::SourceFile(children) => {
      for c in children {
        shift_idx(c, offset);
      }
    }
    AstNodeKind::ProcedureDecl(node) => shift_idx(&mut node.body, offset),
    AstNodeKind::Block(node) => {
      for s in &mut node.statements {
        shift_idx(s, offset);
      }
    }
    AstNodeKind::IfStmt(node) => {
      shift_idx(&mut node.condition, offset);
      shift_idx(&mut node.then_block, offset);
      match &mut node.else_branch {
        Some(ElseBranch::Block(b)) => shift_idx(b, offset),
        Some(ElseBranch::ElseIf(i)) => shift_idx(i, offset),
        None => {}
      }
    }
    AstNodeKind::ExpressionStmt(e) => shift_idx(e, offset),
    AstNodeKind::Say(b) => shift_idx(b, offset),
    AstNodeKind::Listen(e) => shift_idx(e, offset),
    AstNodeKind::Binary(node) => {
      shift_idx(&mut node.lhs, offset);
      shift_idx(&mut node.rhs, offset);
    }
    AstNodeKind::Curlies(e) => shift_idx(e, offset),
    AstNodeKind::Lecture(_) | AstNodeKind::BoolLiteral(_) | AstNodeKind::StringLiteral(_) => {}
  }
}

/// Dispatches to the appropriate `visit_*` method for `idx`'s node kind. This
/// is a free function, not a trait method, so that `arena` (borrowed
/// immutably) and `visitor` (borrowed mutably) never alias the same object.
pub fn walk<V: AstVisitor + ?Sized>(visitor: &mut V, arena: &AstArena, idx: NodeIdx) {
  match &arena.get(idx).kind {
    AstNodeKind::Storyworld(children) => visitor.visit_storyworld(arena, children),
    AstNodeKind::SourceFile(children) => visitor.visit_source_file(arena, idx, children),
    AstNodeKind::ProcedureDecl(node) => visitor.visit_procedure_decl(arena, idx, node),
    AstNodeKind::Block(node) => visitor.visit_block(arena, node),
    AstNodeKind::IfStmt(node) => visitor.visit_if_stmt(arena, idx, node),
    AstNodeKind::ExpressionStmt(expr) => visitor.visit_expression_stmt(arena, idx, *expr),
    AstNodeKind::Say(body) => visitor.visit_say(arena, idx, *body),
    AstNodeKind::Lecture(text) => visitor.visit_lecture(arena, idx, text),
    AstNodeKind::Listen(opts) => visitor.visit_listen(arena, idx, *opts),
    AstNodeKind::BoolLiteral(value) => visitor.visit_bool_literal(arena, idx, *value),
    AstNodeKind::StringLiteral(value) => visitor.visit_string_literal(arena, idx, value),
    AstNodeKind::Binary(node) => visitor.visit_binary(arena, idx, node),
    AstNodeKind::Curlies(inner) => visitor.visit_curlies(arena, idx, *inner),
  }
}

/// A visitor over the Storyworld AST. Default method bodies perform the
/// ordinary recursive walk; node kinds with conditional branches or a
/// left-then-right operand order additionally fire an event hook
/// (`on_after_if_condition`, `on_before_else`, `on_after_binary_lhs`) at the
/// documented position so that a pass like the code generator or the code
/// hasher can interleave its own work with the traversal instead of
/// post-processing children after the fact.
pub trait AstVisitor {
  fn visit_storyworld(&mut self, arena: &AstArena, children: &[NodeIdx]) {
    for &c in children {
      walk(self, arena, c);
    }
  }

  fn visit_source_file(&mut self, arena: &AstArena, _idx: NodeIdx, children: &[NodeIdx]) {
    for &c in children {
      walk(self, arena, c);
    }
  }

  fn visit_procedure_decl(&mut self, arena: &AstArena, _idx: NodeIdx, node: &ProcedureDeclNode) {
    walk(self, arena, node.body);
  }

  fn visit_block(&mut self, arena: &AstArena, node: &BlockNode) {
    for &s in &node.statements {
      walk(self, arena, s);
    }
  }

  fn visit_if_stmt(&mut self, arena: &AstArena, idx: NodeIdx, node: &IfStmtNode) {
    walk(self, arena, node.condition);
    self.on_after_if_condition(arena, idx);
    walk(self, arena, node.then_block);
    if let Some(branch) = &node.else_branch {
      self.on_before_else(arena, idx);
      match branch {
        ElseBranch::Block(b) => walk(self, arena, *b),
        ElseBranch::ElseIf(i) => walk(self, arena, *i),
      }
    }
  }

  fn visit_expression_stmt(&mut self, arena: &AstArena, _idx: NodeIdx, expr: NodeIdx) {
    walk(self, arena, expr);
  }

  fn visit_say(&mut self, arena: &AstArena, _idx: NodeIdx, body: NodeIdx) {
    walk(self, arena, body);
  }

  fn visit_lecture(&mut self, _arena: &AstArena, _idx: NodeIdx, _text: &Arc<str>) {}

  fn visit_listen(&mut self, arena: &AstArena, _idx: NodeIdx, options: NodeIdx) {
    walk(self, arena, options);
  }

  fn visit_bool_literal(&mut self, _arena: &AstArena, _idx: NodeIdx, _value: bool) {}

  fn visit_string_literal(&mut self, _arena: &AstArena, _idx: NodeIdx, _value: &Arc<str>) {}

  fn visit_binary(&mut self, arena: &AstArena, idx: NodeIdx, node: &BinaryNode) {
    walk(self, arena, node.lhs);
    self.on_after_binary_lhs(arena, idx);
    walk(self, arena, node.rhs);
  }

  fn visit_curlies(&mut self, arena: &AstArena, _idx: NodeIdx, inner: NodeIdx) {
    walk(self, arena, inner);
  }

  /// Fired immediately after an `if` node's condition subtree has been visited,
  /// before the then-block is visited.
  fn on_after_if_condition(&mut self, _arena: &AstArena, _idx: NodeIdx) {}

  /// Fired after an `if` node's then-block has been visited, before its else
  /// branch (if any) is visited.
  fn on_before_else(&mut self, _arena: &AstArena, _idx: NodeIdx) {}

  /// Fired after a binary node's left-hand side has been visited, before its
  /// right-hand side is visited.
  fn on_after_binary_lhs(&mut self, _arena: &AstArena, _idx: NodeIdx) {}
}
