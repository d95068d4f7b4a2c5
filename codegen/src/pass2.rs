use std::rc::Rc;

use core::ast::{fq_name, AstArena, AstNodeKind, BinOp, ElseBranch, NodeIdx};
use core::bytecode::OpCode;
use core::errors::RomualdoError;
use core::storyworld::{CompiledStoryworld, DebugInfo};
use core::values::Value;

use crate::emitter::Emitter;
use crate::ChunkTable;

/// Pass two: re-walks every procedure's body, emitting bytecode into the
/// chunk pass one pre-allocated for it.
pub fn emit_all(
  arena: &AstArena,
  storyworld: NodeIdx,
  table: &ChunkTable,
  artifact: &mut CompiledStoryworld,
  debug: &mut DebugInfo,
) -> Result<(), RomualdoError> {
  let AstNodeKind::Storyworld(files) = &arena.get(storyworld).kind else {
    return Err(RomualdoError::internal("code generator pass 2 given a non-Storyworld root"));
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
      let &idx = table
        .get(&name)
        .ok_or_else(|| RomualdoError::internal(format!("`{}` was not pre-allocated a chunk in pass 1", name)))?;

      emit_procedure(arena, proc.body, idx, artifact, debug, arena.get(decl).source_file.to_string())?;
    }
  }

  Ok(())
}

fn emit_procedure(
  arena: &AstArena,
  body: NodeIdx,
  chunk_idx: u32,
  artifact: &mut CompiledStoryworld,
  debug: &mut DebugInfo,
  source_file: String,
) -> Result<(), RomualdoError> {
  // Swap the chunk/line-table out of their owning collections so the
  // emitter can hold plain `&mut` references to them without also needing
  // to borrow `artifact.constants` through the same container.
  let mut chunk = std::mem::take(&mut artifact.chunks[chunk_idx as usize]);
  let mut lines = std::mem::take(&mut debug.chunk_lines[chunk_idx as usize]);

  let result = {
    let mut emitter = Emitter {
      constants: &mut artifact.constants,
      chunk: &mut chunk,
      lines: &mut lines,
      current_line: arena.get(body).line,
      source_file,
    };
    emit_block(&mut emitter, arena, body)
  };

  artifact.chunks[chunk_idx as usize] = chunk;
  debug.chunk_lines[chunk_idx as usize] = lines;

  result
}

fn emit_block(emitter: &mut Emitter, arena: &AstArena, block_idx: NodeIdx) -> Result<(), RomualdoError> {
  let AstNodeKind::Block(block) = &arena.get(block_idx).kind else {
    return Err(RomualdoError::internal("expected a Block node"));
  };
  for &stmt in &block.statements {
    emit_statement(emitter, arena, stmt)?;
  }
  Ok(())
}

/// Emits a node in *statement position*: a direct member of a `Block`.
/// `Lecture` and `Curlies` both emit narration here (`OpSay`); `Curlies`
/// used instead as a sub-expression goes through `emit_expr`, which never
/// emits `OpSay` — this is how `spec.md` §4.5's "`OpSay` if in a lecture
/// context" rule for `Curlies` falls out structurally.
fn emit_statement(emitter: &mut Emitter, arena: &AstArena, idx: NodeIdx) -> Result<(), RomualdoError> {
  let node = arena.get(idx);
  emitter.set_line(node.line);

  match &node.kind {
    AstNodeKind::Lecture(text) => {
      // The AST's text payload is `Arc<str>` (it must be `Send` to cross the
      // assembler's parse-task channel); the constant pool's `Value` is
      // `Rc<str>` (single-threaded from here on), so interning re-allocates.
      let const_idx = emitter.intern_constant(Value::Lecture(Rc::from(text.as_ref())))?;
      emitter.push_op(OpCode::Constant);
      emitter.push_u32_operand(const_idx);
      emitter.push_op(OpCode::Say);
      Ok(())
    }
    AstNodeKind::Curlies(inner) => {
      emit_expr(emitter, arena, *inner)?;
      emitter.push_op(OpCode::ToString);
      emitter.push_op(OpCode::Say);
      Ok(())
    }
    AstNodeKind::IfStmt(_) => emit_if(emitter, arena, idx),
    AstNodeKind::Say(body) => emit_block(emitter, arena, *body),
    AstNodeKind::ExpressionStmt(expr) => {
      emit_expr(emitter, arena, *expr)?;
      emitter.push_op(OpCode::Pop);
      Ok(())
    }
    other => Err(RomualdoError::internal(format!("unexpected node in statement position: {:?}", describe(other)))),
  }
}

/// Emits a node in *expression position*: an operand of `Binary`/`Listen`,
/// or a `Curlies` nested inside a larger expression.
fn emit_expr(emitter: &mut Emitter, arena: &AstArena, idx: NodeIdx) -> Result<(), RomualdoError> {
  let node = arena.get(idx);
  emitter.set_line(node.line);

  match &node.kind {
    AstNodeKind::BoolLiteral(true) => {
      emitter.push_op(OpCode::True);
      Ok(())
    }
    AstNodeKind::BoolLiteral(false) => {
      emitter.push_op(OpCode::False);
      Ok(())
    }
    AstNodeKind::StringLiteral(text) => {
      let const_idx = emitter.intern_constant(Value::Str(Rc::from(text.as_ref())))?;
      emitter.push_op(OpCode::Constant);
      emitter.push_u32_operand(const_idx);
      Ok(())
    }
    AstNodeKind::Binary(bin) => {
      emit_expr(emitter, arena, bin.lhs)?;
      emit_expr(emitter, arena, bin.rhs)?;
      emitter.set_line(node.line);
      emitter.push_op(match bin.op {
        BinOp::Eq => OpCode::Equal,
        BinOp::NotEq => OpCode::NotEqual,
      });
      Ok(())
    }
    AstNodeKind::Listen(options) => {
      emit_expr(emitter, arena, *options)?;
      emitter.set_line(node.line);
      emitter.push_op(OpCode::Listen);
      Ok(())
    }
    AstNodeKind::Curlies(inner) => {
      emit_expr(emitter, arena, *inner)?;
      emitter.push_op(OpCode::ToString);
      Ok(())
    }
    other => Err(RomualdoError::internal(format!("unexpected node in expression position: {:?}", describe(other)))),
  }
}

/// Emits an `if`/`[elseif...]`/`[else]` chain. Each `elseif` is represented
/// in the AST as a nested `IfStmt` reached through `ElseBranch::ElseIf`, so
/// lowering it is just a recursive call: its own condition, then-block, and
/// further branch compile exactly like a fresh `if`.
fn emit_if(emitter: &mut Emitter, arena: &AstArena, idx: NodeIdx) -> Result<(), RomualdoError> {
  let AstNodeKind::IfStmt(node) = &arena.get(idx).kind else {
    return Err(RomualdoError::internal("expected an IfStmt node"));
  };
  let condition = node.condition;
  let then_block = node.then_block;
  let else_branch = node.else_branch.as_ref().map(|branch| match branch {
    ElseBranch::Block(b) => ElseBranch::Block(*b),
    ElseBranch::ElseIf(i) => ElseBranch::ElseIf(*i),
  });

  emit_expr(emitter, arena, condition)?;
  emitter.push_op(OpCode::JumpIfFalse);
  let else_at = emitter.push_i32_operand(0);

  emit_block(emitter, arena, then_block)?;
  emitter.push_op(OpCode::Jump);
  let end_at = emitter.push_i32_operand(0);

  emitter.patch_jump_to_here(else_at);

  match else_branch {
    Some(ElseBranch::Block(b)) => emit_block(emitter, arena, b)?,
    Some(ElseBranch::ElseIf(i)) => emit_if(emitter, arena, i)?,
    None => {}
  }

  emitter.patch_jump_to_here(end_at);
  Ok(())
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
  use core::ast::{AstArena, BinaryNode, BlockNode, ProcedureDeclNode, ProcedureKind, TypeTag};
  use std::cell::Cell;
  use std::sync::Arc;

  fn push(arena: &mut AstArena, kind: AstNodeKind, line: u32) -> NodeIdx {
    arena.push(Arc::from("/main.ral"), line, kind)
  }

  #[test]
  fn smoke_passage_emits_constant_and_say() {
    let mut arena = AstArena::default();
    let lecture = push(&mut arena, AstNodeKind::Lecture(Arc::from("Hello, world!")), 2);
    let body = push(&mut arena, AstNodeKind::Block(BlockNode { statements: vec![lecture] }), 2);
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
      1,
    );
    let file = push(&mut arena, AstNodeKind::SourceFile(vec![proc]), 1);
    let storyworld = push(&mut arena, AstNodeKind::Storyworld(vec![file]), 1);

    let (artifact, _debug) = crate::generate(&arena, storyworld).unwrap();
    assert_eq!(artifact.constants.len(), 1);
    assert!(matches!(artifact.constants[0], Value::Lecture(_)));

    let chunk = &artifact.chunks[artifact.initial_chunk as usize];
    assert_eq!(chunk.code[0], OpCode::Constant as u8);
    assert_eq!(chunk.code[5], OpCode::Say as u8);
  }

  #[test]
  fn missing_main_is_a_compile_time_error() {
    let mut arena = AstArena::default();
    let body = push(&mut arena, AstNodeKind::Block(BlockNode { statements: vec![] }), 1);
    let proc = push(
      &mut arena,
      AstNodeKind::ProcedureDecl(ProcedureDeclNode {
        kind: ProcedureKind::Function,
        package: Arc::from("/"),
        name: Arc::from("flag"),
        return_type: TypeTag::Bool,
        params: vec![],
        body,
      }),
      1,
    );
    let file = push(&mut arena, AstNodeKind::SourceFile(vec![proc]), 1);
    let storyworld = push(&mut arena, AstNodeKind::Storyworld(vec![file]), 1);

    let err = crate::generate(&arena, storyworld).unwrap_err();
    assert!(matches!(err, RomualdoError::CompileTime(_)));
  }

  #[test]
  fn constant_pool_deduplicates_equal_strings() {
    let mut arena = AstArena::default();
    let s1 = push(&mut arena, AstNodeKind::StringLiteral(Arc::from("a/b")), 2);
    let s2 = push(&mut arena, AstNodeKind::StringLiteral(Arc::from("a/b")), 2);
    let bin = push(&mut arena, AstNodeKind::Binary(BinaryNode { op: BinOp::Eq, lhs: s1, rhs: s2, ty: Cell::new(None) }), 2);
    let stmt = push(&mut arena, AstNodeKind::ExpressionStmt(bin), 2);
    let body = push(&mut arena, AstNodeKind::Block(BlockNode { statements: vec![stmt] }), 1);
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
      1,
    );
    let file = push(&mut arena, AstNodeKind::SourceFile(vec![proc]), 1);
    let storyworld = push(&mut arena, AstNodeKind::Storyworld(vec![file]), 1);

    let (artifact, _debug) = crate::generate(&arena, storyworld).unwrap();
    assert_eq!(artifact.constants.len(), 1);
  }
}
