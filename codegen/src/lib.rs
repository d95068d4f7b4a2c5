//! The two-pass code generator (`spec.md` §4.5): pass 1 pre-allocates one
//! empty `Chunk` per procedure and records `fq_name -> chunk index` in a side
//! table (never mutating the AST — see `spec.md` §9's "cyclic references
//! between passes" note); pass 2 walks each procedure's body again, emitting
//! bytecode into its pre-allocated chunk.

mod emitter;
mod pass1;
mod pass2;

use std::collections::HashMap;

use core::ast::{fq_name, AstArena, NodeIdx};
use core::errors::{CompileTimeError, RomualdoError};
use core::storyworld::{CompiledStoryworld, DebugInfo};

/// Compiles a merged `Storyworld` AST into a `CompiledStoryworld` plus its
/// `DebugInfo`. Internal invariant violations (an empty node stack between
/// passes, a duplicate pre-allocation, an unknown node variant) are raised
/// as `RomualdoError::InternalCompilerError` and propagate straight through;
/// this entry point is the "top-level rescue" `spec.md` §4.5 describes,
/// converting anything that isn't already a `CompileTime`/
/// `CompileTimeCollection`/`InternalCompilerError` into the latter.
pub fn generate(arena: &AstArena, storyworld: NodeIdx) -> Result<(CompiledStoryworld, DebugInfo), RomualdoError> {
  run(arena, storyworld).map_err(|err| match err {
    RomualdoError::CompileTime(_) | RomualdoError::CompileTimeCollection(_) | RomualdoError::InternalCompilerError { .. } => err,
    other => RomualdoError::internal(other.to_string()),
  })
}

fn run(arena: &AstArena, storyworld: NodeIdx) -> Result<(CompiledStoryworld, DebugInfo), RomualdoError> {
  let (mut artifact, mut debug, table) = pass1::allocate(arena, storyworld)?;

  let main_fqn = fq_name("/", "main");
  match table.get(&main_fqn) {
    Some(&idx) => artifact.initial_chunk = idx,
    None => {
      return Err(RomualdoError::CompileTime(CompileTimeError {
        file: String::new(),
        line: -1,
        lexeme: String::new(),
        message: "`/main` must exist in the root package".to_string(),
      }))
    }
  }

  pass2::emit_all(arena, storyworld, &table, &mut artifact, &mut debug)?;

  Ok((artifact, debug))
}

type ChunkTable = HashMap<String, u32>;
