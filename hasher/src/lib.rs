//! The code hasher: a SHA-256 digest per procedure, computed over a
//! canonical token stream that is insensitive to whitespace, comments, and
//! source position (`spec.md` §4.4).
//!
//! This does **not** implement `core::ast::AstVisitor`. That trait's default
//! method bodies recurse silently into node kinds a visitor doesn't
//! override, which is exactly wrong here: `spec.md` §4.4/§8 property 2 call
//! for the hasher to panic the moment it meets an AST node shape it doesn't
//! know how to canonicalize, so that a test run catches a missing handler
//! the day the grammar grows a new node kind. So the hasher walks the tree
//! with its own exhaustive `match` and a panicking wildcard arm, the way the
//! teacher's `Compiler/src/visitor.rs` defaults every unhandled
//! `ASTNodeKind` to `todo!()` rather than a silent no-op (`SPEC_FULL.md` §9).

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use core::ast::{fq_name, AstArena, AstNodeKind, ElseBranch, NodeIdx, ProcedureDeclNode, TypeTag};
use core::errors::RomualdoError;

/// Hashes every procedure declared anywhere in the Storyworld AST, keyed by
/// fully-qualified name. Errors if two procedures share a fully-qualified
/// name — by the time the hasher runs, that should already be impossible
/// (see `sema` for the file-scoped duplicate check and `codegen` for the
/// storyworld-wide one), so a collision here is an internal compiler bug,
/// not a user-facing diagnostic.
pub fn hash_storyworld(arena: &AstArena, storyworld: NodeIdx) -> Result<HashMap<String, [u8; 32]>, RomualdoError> {
  let mut digests = HashMap::new();

  let AstNodeKind::Storyworld(files) = &arena.get(storyworld).kind else {
    return Err(RomualdoError::internal("hash_storyworld called on a non-Storyworld node"));
  };

  for &file in files {
    let AstNodeKind::SourceFile(decls) = &arena.get(file).kind else {
      return Err(RomualdoError::internal("Storyworld child is not a SourceFile"));
    };
    for &decl in decls {
      let AstNodeKind::ProcedureDecl(proc) = &arena.get(decl).kind else {
        return Err(RomualdoError::internal("SourceFile child is not a ProcedureDecl"));
      };
      let name = fq_name(&proc.package, &proc.name);
      let digest = hash_procedure(arena, proc);
      if digests.insert(name.clone(), digest).is_some() {
        return Err(RomualdoError::internal(format!("duplicate procedure `{}` survived into the hasher", name)));
      }
    }
  }

  Ok(digests)
}

fn type_tag_str(tag: TypeTag) -> &'static str {
  tag.display_name()
}

fn emit_tok(sha: &mut Sha256, text: &str) {
  sha.update(text.as_bytes());
  // A zero byte follows every emitted token so that adjacent tokens can
  // never be confused for a single longer one (`else` + `if` vs. `elseif`).
  sha.update([0u8]);
}

fn hash_procedure(arena: &AstArena, proc: &ProcedureDeclNode) -> [u8; 32] {
  let mut sha = Sha256::new();

  emit_tok(&mut sha, if matches!(proc.kind, core::ast::ProcedureKind::Function) { "function" } else { "passage" });
  emit_tok(&mut sha, &proc.name);
  emit_tok(&mut sha, "(");
  for (i, param) in proc.params.iter().enumerate() {
    if i > 0 {
      emit_tok(&mut sha, ",");
    }
    emit_tok(&mut sha, &param.name);
    emit_tok(&mut sha, ":");
    emit_tok(&mut sha, type_tag_str(param.type_tag));
  }
  emit_tok(&mut sha, ")");
  emit_tok(&mut sha, ":");
  emit_tok(&mut sha, type_tag_str(proc.return_type));

  emit_node(&mut sha, arena, proc.body);

  emit_tok(&mut sha, "end");

  sha.finalize().into()
}

/// Emits the canonical token stream for a single AST node appearing inside a
/// procedure body, recursing into children as the node shape requires.
fn emit_node(sha: &mut Sha256, arena: &AstArena, idx: NodeIdx) {
  match &arena.get(idx).kind {
    AstNodeKind::Block(block) => {
      for &stmt in &block.statements {
        emit_node(sha, arena, stmt);
      }
    }
    AstNodeKind::IfStmt(_) => {
      emit_if_chain(sha, arena, idx);
      emit_tok(sha, "end");
    }
    AstNodeKind::ExpressionStmt(expr) => emit_node(sha, arena, *expr),
    AstNodeKind::Say(body) => {
      emit_tok(sha, "say");
      emit_node(sha, arena, *body);
    }
    AstNodeKind::Lecture(text) => emit_tok(sha, text),
    AstNodeKind::Listen(options) => {
      emit_tok(sha, "listen");
      emit_node(sha, arena, *options);
    }
    AstNodeKind::BoolLiteral(value) => emit_tok(sha, if *value { "true" } else { "false" }),
    AstNodeKind::StringLiteral(value) => emit_tok(sha, &format!("\"{}\"", value)),
    AstNodeKind::Binary(bin) => {
      emit_tok(sha, "(");
      emit_node(sha, arena, bin.lhs);
      emit_tok(sha, bin.op.lexeme());
      emit_node(sha, arena, bin.rhs);
      emit_tok(sha, ")");
    }
    AstNodeKind::Curlies(inner) => {
      emit_tok(sha, "{");
      emit_node(sha, arena, *inner);
      emit_tok(sha, "}");
    }
    other => panic!("code hasher: unhandled AST node variant {:?} in a procedure body", describe(other)),
  }
}

/// Parses the `if`/`then`/`[elseif...]`/`[else...]` chain rooted at `idx`
/// without emitting the chain's closing `end` — only the single top-level
/// `emit_node` call for an `IfStmt` does that, so an `elseif` never
/// duplicates it.
fn emit_if_chain(sha: &mut Sha256, arena: &AstArena, idx: NodeIdx) {
  let AstNodeKind::IfStmt(node) = &arena.get(idx).kind else {
    panic!("emit_if_chain called on a non-IfStmt node");
  };
  emit_tok(sha, "if");
  emit_node(sha, arena, node.condition);
  emit_tok(sha, "then");
  emit_node(sha, arena, node.then_block);
  if let Some(branch) = &node.else_branch {
    emit_tok(sha, "else");
    match branch {
      ElseBranch::Block(block) => emit_node(sha, arena, *block),
      ElseBranch::ElseIf(chain) => emit_if_chain(sha, arena, *chain),
    }
  }
}

fn describe(kind: &AstNodeKind) -> &'static str {
  match kind {
    AstNodeKind::Storyworld(_) => "Storyworld",
    AstNodeKind::SourceFile(_) => "SourceFile",
    AstNodeKind::ProcedureDecl(_) => "ProcedureDecl",
    AstNodeKind::Block(_) => "Block",
    AstNodeKind::IfStmt(_) => "IfStmt",
    AstNodeKind::ExpressionStmt(_) => "ExpressionStmt",
    AstNodeKind::Say(_) => "Say",
    AstNodeKind::Lecture(_) => "Lecture",
    AstNodeKind::Listen(_) => "Listen",
    AstNodeKind::BoolLiteral(_) => "BoolLiteral",
    AstNodeKind::StringLiteral(_) => "StringLiteral",
    AstNodeKind::Binary(_) => "Binary",
    AstNodeKind::Curlies(_) => "Curlies",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use core::ast::{AstNodeKind, BinOp, BinaryNode, BlockNode, ElseBranch, IfStmtNode, ParamInfo, ProcedureDeclNode, ProcedureKind};
  use std::cell::Cell;
  use std::sync::Arc;

  fn push(arena: &mut AstArena, kind: AstNodeKind) -> NodeIdx {
    arena.push(Arc::from("/main.ral"), 1, kind)
  }

  /// Builds `passage main(): void <lecture text> \end` and returns the
  /// arena plus the `main` procedure's `NodeIdx`.
  fn build_main_with_text(text: &str) -> (AstArena, NodeIdx) {
    let mut arena = AstArena::default();
    let lecture = push(&mut arena, AstNodeKind::Lecture(Arc::from(text)));
    let body = push(&mut arena, AstNodeKind::Block(BlockNode { statements: vec![lecture] }));
    let proc = push(
      &mut arena,
      AstNodeKind::ProcedureDecl(ProcedureDeclNode {
        kind: ProcedureKind::Passage,
        package: Arc::from("/"),
        name: Arc::from("main"),
        return_type: TypeTag::Void,
        params: vec![],
        body,
      }),
    );
    (arena, proc)
  }

  fn hash_of(arena: &AstArena, idx: NodeIdx) -> [u8; 32] {
    let AstNodeKind::ProcedureDecl(proc) = &arena.get(idx).kind else { unreachable!() };
    hash_procedure(arena, proc)
  }

  #[test]
  fn identical_text_hashes_identically() {
    let (a1, p1) = build_main_with_text("Hello, world!");
    let (a2, p2) = build_main_with_text("Hello, world!");
    assert_eq!(hash_of(&a1, p1), hash_of(&a2, p2));
  }

  #[test]
  fn different_text_hashes_differently() {
    let (a1, p1) = build_main_with_text("Hello, world!");
    let (a2, p2) = build_main_with_text("Goodbye, world!");
    assert_ne!(hash_of(&a1, p1), hash_of(&a2, p2));
  }

  #[test]
  fn parameter_name_changes_hash() {
    let mut a1 = AstArena::default();
    let body1 = push(&mut a1, AstNodeKind::Block(BlockNode { statements: vec![] }));
    let p1 = push(
      &mut a1,
      AstNodeKind::ProcedureDecl(ProcedureDeclNode {
        kind: ProcedureKind::Function,
        package: Arc::from("/"),
        name: Arc::from("flag"),
        return_type: TypeTag::Bool,
        params: vec![ParamInfo { name: Arc::from("a"), type_tag: TypeTag::Bool }],
        body: body1,
      }),
    );

    let mut a2 = AstArena::default();
    let body2 = push(&mut a2, AstNodeKind::Block(BlockNode { statements: vec![] }));
    let p2 = push(
      &mut a2,
      AstNodeKind::ProcedureDecl(ProcedureDeclNode {
        kind: ProcedureKind::Function,
        package: Arc::from("/"),
        name: Arc::from("flag"),
        return_type: TypeTag::Bool,
        params: vec![ParamInfo { name: Arc::from("b"), type_tag: TypeTag::Bool }],
        body: body2,
      }),
    );

    assert_ne!(hash_of(&a1, p1), hash_of(&a2, p2));
  }

  #[test]
  fn elseif_chain_disambiguated_from_literal_elseif_by_zero_byte() {
    // `if true then \end else if true then \end end` (an `elseif` spelled
    // out as `else` + `if`) must hash differently from a hand-rolled stream
    // that glued the two tokens together without the zero-byte separator —
    // otherwise "else"+"if" would collide with a literal "elseif" token.
    let mut arena = AstArena::default();
    let inner_cond = push(&mut arena, AstNodeKind::BoolLiteral(true));
    let inner_then = push(&mut arena, AstNodeKind::Block(BlockNode { statements: vec![] }));
    let inner_if = push(
      &mut arena,
      AstNodeKind::IfStmt(IfStmtNode { condition: inner_cond, then_block: inner_then, else_branch: None }),
    );
    let outer_cond = push(&mut arena, AstNodeKind::BoolLiteral(true));
    let outer_then = push(&mut arena, AstNodeKind::Block(BlockNode { statements: vec![] }));
    let outer_if = push(
      &mut arena,
      AstNodeKind::IfStmt(IfStmtNode {
        condition: outer_cond,
        then_block: outer_then,
        else_branch: Some(ElseBranch::ElseIf(inner_if)),
      }),
    );
    let body = push(&mut arena, AstNodeKind::Block(BlockNode { statements: vec![outer_if] }));
    let proc = ProcedureDeclNode {
      kind: ProcedureKind::Function,
      package: Arc::from("/"),
      name: Arc::from("f"),
      return_type: TypeTag::Void,
      params: vec![],
      body,
    };

    let digest = hash_procedure(&arena, &proc);

    let mut glued = Sha256::new();
    glued.update(b"elseif");
    let manual_different = glued.finalize();
    assert_ne!(digest.as_slice(), manual_different.as_slice());
  }

  #[test]
  #[should_panic(expected = "unhandled AST node variant")]
  fn unhandled_top_level_node_inside_a_body_panics() {
    // A `Storyworld` node can never legitimately appear inside a procedure
    // body; `emit_node`'s wildcard arm must still catch it, which is the
    // same arm that would catch an actual new node kind after a grammar
    // extension.
    let mut arena = AstArena::default();
    let stray = push(&mut arena, AstNodeKind::Storyworld(vec![]));
    let mut sha = Sha256::new();
    emit_node(&mut sha, &arena, stray);
  }

  #[test]
  fn binary_type_is_unused_here_but_memoizes() {
    let mut arena = AstArena::default();
    let lhs = push(&mut arena, AstNodeKind::StringLiteral(Arc::from("a")));
    let rhs = push(&mut arena, AstNodeKind::StringLiteral(Arc::from("b")));
    let bin = push(
      &mut arena,
      AstNodeKind::Binary(BinaryNode { op: BinOp::Eq, lhs, rhs, ty: Cell::new(None) }),
    );
    let mut sha = Sha256::new();
    emit_node(&mut sha, &arena, bin);
    // Hashing never touches the memoization cell; it stays unset.
    let AstNodeKind::Binary(node) = &arena.get(bin).kind else { unreachable!() };
    assert!(node.ty.get().is_none());
  }
}
