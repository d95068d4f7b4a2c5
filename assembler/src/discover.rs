use std::path::{Path, PathBuf};

use core::errors::RomualdoError;

/// One `.ral` file found under a storyworld root, paired with the package
/// path (`spec.md` §6: "derives from the file's directory relative to the
/// root, with a leading `/`") it belongs to.
pub struct SourceFileEntry {
  pub path: PathBuf,
  pub package: String,
}

/// Recursively discovers every `.ral` file under `root`. Uses plain
/// `std::fs::read_dir` recursion rather than a `walkdir` dependency, matching
/// the teacher's own file-loading code (`read_file_chars`), which never
/// reaches for anything beyond `std::fs`.
pub fn discover_source_files(root: &Path) -> Result<Vec<SourceFileEntry>, RomualdoError> {
  let mut out = Vec::new();
  walk_dir(root, root, &mut out)?;
  out.sort_by(|a, b| a.path.cmp(&b.path));
  Ok(out)
}

fn walk_dir(root: &Path, dir: &Path, out: &mut Vec<SourceFileEntry>) -> Result<(), RomualdoError> {
  let entries = std::fs::read_dir(dir).map_err(|e| RomualdoError::tool(format!("{}: {}", dir.display(), e)))?;
  for entry in entries {
    let entry = entry.map_err(|e| RomualdoError::tool(format!("{}: {}", dir.display(), e)))?;
    let path = entry.path();
    if path.is_dir() {
      walk_dir(root, &path, out)?;
    } else if path.extension().and_then(|ext| ext.to_str()) == Some("ral") {
      let package = package_path(root, &path);
      out.push(SourceFileEntry { path, package });
    }
  }
  Ok(())
}

/// `root/main.ral` -> `/`; `root/area/foo.ral` -> `/area/`.
fn package_path(root: &Path, file: &Path) -> String {
  let parent = file.parent().unwrap_or(root);
  let relative = parent.strip_prefix(root).unwrap_or(parent);
  if relative.as_os_str().is_empty() {
    return "/".to_string();
  }
  let mut package = String::from("/");
  for component in relative.components() {
    package.push_str(&component.as_os_str().to_string_lossy());
    package.push('/');
  }
  package
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("romualdo-discover-test-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("area")).unwrap();
    dir
  }

  #[test]
  fn root_file_gets_root_package_and_nested_file_gets_nested_package() {
    let root = scratch_dir("packages");
    std::fs::write(root.join("main.ral"), "passage main(): void end\n").unwrap();
    std::fs::write(root.join("area").join("foo.ral"), "function foo(): bool true end\n").unwrap();
    std::fs::write(root.join("ignored.txt"), "not a source file").unwrap();

    let mut files = discover_source_files(&root).unwrap();
    files.sort_by(|a, b| a.package.cmp(&b.package));

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].package, "/");
    assert_eq!(files[1].package, "/area/");

    std::fs::remove_dir_all(&root).unwrap();
  }

  #[test]
  fn empty_directory_yields_no_entries() {
    let root = scratch_dir("empty");
    let files = discover_source_files(&root).unwrap();
    assert!(files.is_empty());
    std::fs::remove_dir_all(&root).unwrap();
  }
}
