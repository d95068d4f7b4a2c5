//! The Storyworld assembler (`spec.md` §5/§6): discovers every `.ral` file
//! under a root directory, parses each one on its own scoped thread, and
//! merges the resulting per-file ASTs into a single `Storyworld` arena.
//! Grounded on the teacher's corpus never pulling in an async runtime or
//! thread-pool crate anywhere: this fans out with only `std::thread::scope`
//! and joins through `std::sync::mpsc`, per `spec.md` §5's "whichever
//! concurrency primitive the target language idiomatizes" note.

mod discover;

use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;

use core::ast::{AstArena, AstNodeKind, NodeIdx};
use core::errors::{merge_compile_errors, CompileTimeError, RomualdoError};

pub use discover::{discover_source_files, SourceFileEntry};

struct ParsedFile {
  arena: AstArena,
  root: NodeIdx,
}

/// Parses every `.ral` file under `root` in parallel and merges them into a
/// single `Storyworld` AST. An empty source tree is a compile-time error
/// (`spec.md` §8 property 8), not a success with an empty artifact.
pub fn assemble(root: &Path) -> Result<(AstArena, NodeIdx), RomualdoError> {
  let files = discover_source_files(root)?;
  if files.is_empty() {
    return Err(RomualdoError::CompileTime(CompileTimeError {
      file: root.display().to_string(),
      line: -1,
      lexeme: String::new(),
      message: "no `.ral` source files found under this directory".to_string(),
    }));
  }

  let (ok_tx, ok_rx) = mpsc::channel::<ParsedFile>();
  let (err_tx, err_rx) = mpsc::channel::<RomualdoError>();

  std::thread::scope(|scope| {
    for file in &files {
      let ok_tx = ok_tx.clone();
      let err_tx = err_tx.clone();
      scope.spawn(move || match parse_one(file) {
        Ok(parsed) => {
          let _ = ok_tx.send(parsed);
        }
        Err(err) => {
          let _ = err_tx.send(err);
        }
      });
    }
    // Drop the un-cloned senders so the receivers' `iter()` below terminates
    // once every spawned task's own clone has also been dropped, joining the
    // fan-out by task count the way `spec.md` §5 describes.
    drop(ok_tx);
    drop(err_tx);
  });

  let parsed: Vec<ParsedFile> = ok_rx.iter().collect();
  let errors: Vec<RomualdoError> = err_rx.iter().collect();

  // An error in one file never cancels another (`spec.md` §5): every task
  // above ran to completion regardless of its siblings' outcome. Only after
  // every task has reported in do we decide whether to fail.
  if !errors.is_empty() {
    return Err(merge_compile_errors(errors));
  }

  let mut storyworld_arena = AstArena::default();
  let mut file_roots = Vec::with_capacity(parsed.len());
  for file in parsed {
    // Aggregation order is whatever order the channel delivered results in,
    // which is non-deterministic — nothing downstream may rely on it.
    let root_idx = storyworld_arena.splice_from(file.arena, file.root);
    file_roots.push(root_idx);
  }

  let storyworld_root = storyworld_arena.push(Arc::from("<storyworld>"), 0, AstNodeKind::Storyworld(file_roots));
  Ok((storyworld_arena, storyworld_root))
}

fn parse_one(file: &SourceFileEntry) -> Result<ParsedFile, RomualdoError> {
  let text = std::fs::read_to_string(&file.path).map_err(|e| RomualdoError::tool(format!("{}: {}", file.path.display(), e)))?;
  let chars: Vec<char> = text.chars().collect();
  let source_file: Arc<str> = Arc::from(file.path.to_string_lossy().as_ref());
  let package: Arc<str> = Arc::from(file.package.as_str());

  let (arena, root, errors) = parser::parse(&chars, source_file, package);
  if errors.is_empty() {
    Ok(ParsedFile { arena, root })
  } else {
    Err(RomualdoError::CompileTimeCollection(errors))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("romualdo-assembler-test-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  #[test]
  fn merges_two_files_into_one_storyworld() {
    let root = scratch_dir("merge");
    std::fs::write(root.join("main.ral"), "passage main(): void\n    Hello, world!\n\\end\n").unwrap();
    std::fs::create_dir_all(root.join("area")).unwrap();
    std::fs::write(root.join("area").join("flag.ral"), "function flag(): bool true end\n").unwrap();

    let (arena, storyworld) = assemble(&root).unwrap();
    let AstNodeKind::Storyworld(files) = &arena.get(storyworld).kind else {
      panic!("expected a Storyworld root");
    };
    assert_eq!(files.len(), 2);

    std::fs::remove_dir_all(&root).unwrap();
  }

  #[test]
  fn empty_source_tree_is_a_compile_time_error() {
    let root = scratch_dir("empty");
    let err = assemble(&root).unwrap_err();
    assert!(matches!(err, RomualdoError::CompileTime(_)));
    std::fs::remove_dir_all(&root).unwrap();
  }

  #[test]
  fn a_syntax_error_in_one_file_does_not_suppress_the_others() {
    let root = scratch_dir("partial-failure");
    std::fs::write(root.join("good.ral"), "function flag(): bool true end\n").unwrap();
    std::fs::write(root.join("bad.ral"), "function (): bool true end\n").unwrap();

    let err = assemble(&root).unwrap_err();
    assert!(matches!(err, RomualdoError::CompileTimeCollection(_)));

    std::fs::remove_dir_all(&root).unwrap();
  }
}
