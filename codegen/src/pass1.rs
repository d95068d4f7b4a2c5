use core::ast::{fq_name, AstArena, AstNodeKind, NodeIdx};
use core::chunk::Chunk;
use core::errors::RomualdoError;
use core::storyworld::{CompiledStoryworld, DebugInfo};

use crate::ChunkTable;

/// Pass one: pre-allocates one empty `Chunk` per procedure declared anywhere
/// in the Storyworld and records `fq_name -> chunk index` in a side table,
/// per `spec.md` §4.5 and the Design Notes' recommendation against mutating
/// chunk indices into the AST.
pub fn allocate(arena: &AstArena, storyworld: NodeIdx) -> Result<(CompiledStoryworld, DebugInfo, ChunkTable), RomualdoError> {
  let mut artifact = CompiledStoryworld::default();
  let mut debug = DebugInfo::default();
  let mut table = ChunkTable::new();

  let AstNodeKind::Storyworld(files) = &arena.get(storyworld).kind else {
    return Err(RomualdoError::internal("code generator pass 1 given a non-Storyworld root"));
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
      if table.contains_key(&name) {
        return Err(RomualdoError::internal(format!(
          "duplicate fully-qualified procedure name `{}` reached code generation",
          name
        )));
      }

      let idx = artifact.chunks.len() as u32;
      artifact.chunks.push(Chunk::default());
      debug.push_chunk(name.clone(), arena.get(decl).source_file.to_string());
      table.insert(name, idx);
    }
  }

  Ok((artifact, debug, table))
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use core::ast::{AstNodeKind, BlockNode, ProcedureDeclNode, ProcedureKind, TypeTag};

  use super::*;

  fn push(arena: &mut AstArena, kind: AstNodeKind, line: u32) -> NodeIdx {
    arena.push(Arc::from("/main.ral"), line, kind)
  }

  fn procedure(arena: &mut AstArena, package: &str, name: &str) -> NodeIdx {
    let body = push(arena, AstNodeKind::Block(BlockNode { statements: vec![] }), 1);
    push(
      arena,
      AstNodeKind::ProcedureDecl(ProcedureDeclNode {
        kind: ProcedureKind::Function,
        package: Arc::from(package),
        name: Arc::from(name),
        return_type: TypeTag::Void,
        params: vec![],
        body,
      }),
      1,
    )
  }

  #[test]
  fn allocates_one_chunk_per_procedure_across_packages() {
    let mut arena = AstArena::default();
    let main = procedure(&mut arena, "/", "main");
    let helper = procedure(&mut arena, "/chapter1", "helper");
    let file1 = push(&mut arena, AstNodeKind::SourceFile(vec![main]), 1);
    let file2 = push(&mut arena, AstNodeKind::SourceFile(vec![helper]), 1);
    let storyworld = push(&mut arena, AstNodeKind::Storyworld(vec![file1, file2]), 1);

    let (artifact, debug, table) = allocate(&arena, storyworld).unwrap();

    assert_eq!(artifact.chunks.len(), 2);
    assert_eq!(debug.chunk_names.len(), 2);
    assert_eq!(table[&fq_name("/", "main")], 0);
    assert_eq!(table[&fq_name("/chapter1", "helper")], 1);
  }

  #[test]
  fn same_name_in_different_packages_is_not_a_duplicate() {
    let mut arena = AstArena::default();
    let a = procedure(&mut arena, "/a", "helper");
    let b = procedure(&mut arena, "/b", "helper");
    let file = push(&mut arena, AstNodeKind::SourceFile(vec![a, b]), 1);
    let storyworld = push(&mut arena, AstNodeKind::Storyworld(vec![file]), 1);

    let (_artifact, _debug, table) = allocate(&arena, storyworld).unwrap();
    assert_eq!(table.len(), 2);
  }

  #[test]
  fn non_storyworld_root_is_an_internal_error() {
    let mut arena = AstArena::default();
    let not_a_storyworld = push(&mut arena, AstNodeKind::SourceFile(vec![]), 1);

    let err = allocate(&arena, not_a_storyworld).unwrap_err();
    assert!(matches!(err, RomualdoError::InternalCompilerError { .. }));
  }
}
