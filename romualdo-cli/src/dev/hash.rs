//! `dev hash <file> [--symbol NAME]`: parses a single file and prints the
//! code hash (`spec.md` §4.4) of each procedure it declares, or just the one
//! named by `--symbol`.

use std::path::Path;
use std::sync::Arc;

use core::ast::AstNodeKind;
use core::errors::RomualdoError;

pub fn cmd_hash(path: &Path, symbol: Option<&str>) -> Result<(), RomualdoError> {
  let text = std::fs::read_to_string(path).map_err(|e| RomualdoError::tool(format!("{}: {}", path.display(), e)))?;
  let chars: Vec<char> = text.chars().collect();
  let source_file: Arc<str> = Arc::from(path.to_string_lossy().as_ref());

  let (mut arena, file_root, errors) = parser::parse(&chars, source_file, Arc::from("/"));
  if !errors.is_empty() {
    return Err(core::errors::merge_compile_errors(errors.into_iter().map(core::errors::RomualdoError::CompileTime).collect()));
  }

  let storyworld = arena.push(Arc::from("<dev-hash>"), 0, AstNodeKind::Storyworld(vec![file_root]));
  let digests = hasher::hash_storyworld(&arena, storyworld)?;

  let mut names: Vec<&String> = digests.keys().collect();
  names.sort();

  for name in names {
    if let Some(want) = symbol {
      if name.trim_start_matches('/') != want && name != want {
        continue;
      }
    }
    println!("{} {}", hex(&digests[name]), name);
  }

  Ok(())
}

fn hex(bytes: &[u8; 32]) -> String {
  bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
