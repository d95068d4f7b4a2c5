//! Semantic and type checking: two visitor passes over each parsed
//! `SourceFile`, both accumulating into a compile-time error collection
//! instead of stopping at the first problem.

mod semantic;
mod type_check;

pub use semantic::SemanticChecker;
pub use type_check::TypeChecker;

use core::ast::{walk, AstArena, NodeIdx};
use core::errors::{merge_compile_errors, CompileTimeError, RomualdoError};

/// Runs both checker passes over a `Storyworld` AST, returning the merged
/// error collection if either pass found anything.
pub fn check(arena: &AstArena, storyworld: NodeIdx) -> Result<(), RomualdoError> {
  let mut semantic = SemanticChecker::default();
  walk(&mut semantic, arena, storyworld);

  let mut types = TypeChecker::default();
  walk(&mut types, arena, storyworld);

  let mut errors = Vec::new();
  errors.append(&mut semantic.errors);
  errors.append(&mut types.errors);

  if errors.is_empty() {
    Ok(())
  } else {
    Err(merge_compile_errors(errors.into_iter().map(RomualdoError::CompileTime).collect()))
  }
}

/// Shared helper for pushing a `CompileTimeError` anchored at the source
/// location of `idx`.
fn push_error(errors: &mut Vec<CompileTimeError>, arena: &AstArena, idx: NodeIdx, message: String) {
  let node = arena.get(idx);
  errors.push(CompileTimeError {
    file: node.source_file.to_string(),
    line: node.line as i64,
    lexeme: String::new(),
    message,
  });
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use core::ast::{AstNodeKind, BlockNode, ProcedureDeclNode, ProcedureKind, TypeTag};

  use super::*;

  fn push(arena: &mut AstArena, kind: AstNodeKind, line: u32) -> NodeIdx {
    arena.push(Arc::from("/main.ral"), line, kind)
  }

  fn empty_procedure(arena: &mut AstArena, kind: ProcedureKind, name: &str, line: u32) -> NodeIdx {
    let body = push(arena, AstNodeKind::Block(BlockNode { statements: vec![] }), line);
    push(
      arena,
      AstNodeKind::ProcedureDecl(ProcedureDeclNode {
        kind,
        package: Arc::from("/"),
        name: Arc::from(name),
        return_type: TypeTag::Void,
        params: vec![],
        body,
      }),
      line,
    )
  }

  #[test]
  fn a_file_with_main_and_no_duplicates_is_clean() {
    let mut arena = AstArena::default();
    let main = empty_procedure(&mut arena, ProcedureKind::Passage, "main", 1);
    let file = push(&mut arena, AstNodeKind::SourceFile(vec![main]), 1);

    assert!(check(&arena, file).is_ok());
  }

  #[test]
  fn a_file_without_main_is_flagged() {
    let mut arena = AstArena::default();
    let helper = empty_procedure(&mut arena, ProcedureKind::Function, "helper", 1);
    let file = push(&mut arena, AstNodeKind::SourceFile(vec![helper]), 1);

    let err = check(&arena, file).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("missing required `main` procedure"), "{}", message);
  }

  #[test]
  fn redeclaring_a_procedure_name_is_flagged() {
    let mut arena = AstArena::default();
    let main = empty_procedure(&mut arena, ProcedureKind::Passage, "main", 1);
    let dupe = empty_procedure(&mut arena, ProcedureKind::Function, "main", 5);
    let file = push(&mut arena, AstNodeKind::SourceFile(vec![main, dupe]), 1);

    let err = check(&arena, file).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("duplicate procedure `main`"), "{}", message);
  }

  #[test]
  fn an_if_condition_that_is_not_boolean_is_flagged() {
    let mut arena = AstArena::default();
    let condition = push(&mut arena, AstNodeKind::StringLiteral(Arc::from("nope")), 2);
    let then_body = push(&mut arena, AstNodeKind::Block(BlockNode { statements: vec![] }), 2);
    let if_stmt = push(
      &mut arena,
      AstNodeKind::IfStmt(core::ast::IfStmtNode { condition, then_block: then_body, else_branch: None }),
      2,
    );
    let block = push(&mut arena, AstNodeKind::Block(BlockNode { statements: vec![if_stmt] }), 1);
    let main = push(
      &mut arena,
      AstNodeKind::ProcedureDecl(ProcedureDeclNode {
        kind: ProcedureKind::Passage,
        package: Arc::from("/"),
        name: Arc::from("main"),
        return_type: TypeTag::Void,
        params: vec![],
        body: block,
      }),
      1,
    );
    let file = push(&mut arena, AstNodeKind::SourceFile(vec![main]), 1);

    let err = check(&arena, file).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("`if` condition must be a Boolean expression"), "{}", message);
  }
}
