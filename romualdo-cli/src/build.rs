//! The `build` command: assembles every `.ral` file under a directory,
//! runs the semantic/type checkers, generates bytecode, stamps each chunk
//! with its structural hash, and writes `csw.ras`/`csw.rad` next to the
//! source tree.

use std::path::Path;

use core::errors::RomualdoError;
use core::storyworld::{CompiledStoryworld, DebugInfo};

pub fn cmd_build(dir: &Path) -> Result<(), RomualdoError> {
  let (artifact, debug) = compile_dir(dir)?;

  let ras_path = dir.join("csw.ras");
  let rad_path = dir.join("csw.rad");

  std::fs::write(&ras_path, artifact::write_compiled_storyworld(&artifact)?)
    .map_err(|e| RomualdoError::tool(format!("{}: {}", ras_path.display(), e)))?;
  std::fs::write(&rad_path, artifact::write_debug_info(&debug))
    .map_err(|e| RomualdoError::tool(format!("{}: {}", rad_path.display(), e)))?;

  println!("wrote {}", ras_path.display());
  println!("wrote {}", rad_path.display());
  Ok(())
}

/// Runs the full frontend-through-codegen pipeline over `dir`, used by both
/// `build` and `run` when given a source directory instead of a prebuilt
/// `.ras`.
pub fn compile_dir(dir: &Path) -> Result<(CompiledStoryworld, DebugInfo), RomualdoError> {
  let (arena, storyworld) = assembler::assemble(dir)?;
  sema::check(&arena, storyworld)?;
  let (mut compiled, mut debug) = codegen::generate(&arena, storyworld)?;
  stamp_hashes(&arena, storyworld, &mut compiled, &mut debug)?;
  Ok((compiled, debug))
}

/// Computes each procedure's code hash (`spec.md` §4.4) and stores it on its
/// pre-allocated chunk, matched by fully-qualified name rather than
/// positional order — the hasher walks the same `Storyworld` arena the
/// generator does, but nothing guarantees the two traversals stay in lock
/// step forever, so a name lookup is the only safe join.
fn stamp_hashes(
  arena: &core::ast::AstArena,
  storyworld: core::ast::NodeIdx,
  compiled: &mut CompiledStoryworld,
  debug: &mut DebugInfo,
) -> Result<(), RomualdoError> {
  let digests = hasher::hash_storyworld(arena, storyworld)?;
  for (idx, name) in debug.chunk_names.iter().enumerate() {
    if let Some(digest) = digests.get(name) {
      compiled.chunks[idx].hash = *digest;
    }
  }
  Ok(())
}
