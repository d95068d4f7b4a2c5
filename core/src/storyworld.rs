use crate::chunk::Chunk;
use crate::values::Value;

/// A fully compiled Storyworld: everything the VM needs to execute, and
/// nothing else. This is the payload of the `.ras` artifact.
#[derive(Default)]
pub struct CompiledStoryworld {
  pub constants: Vec<Value>,
  pub chunks: Vec<Chunk>,
  /// Index into `chunks` of the procedure execution starts at (`/main`).
  pub initial_chunk: u32,
}

/// Debugging metadata kept alongside a `CompiledStoryworld`, split into its own
/// artifact (`.rad`) so that a release build can ship `.ras` alone. Optional
/// at VM load time: its absence degrades runtime error messages but is never
/// fatal.
#[derive(Default)]
pub struct DebugInfo {
  /// `chunk_names[i]` is the fully-qualified name of `chunks[i]`.
  pub chunk_names: Vec<String>,
  /// `chunk_source_files[i]` is the source file `chunks[i]` was declared in.
  pub chunk_source_files: Vec<String>,
  /// `chunk_lines[i][j]` is the source line of the instruction at byte offset
  /// `j` of `chunks[i]`.
  pub chunk_lines: Vec<Vec<u32>>,
}

impl DebugInfo {
  pub fn push_chunk(&mut self, name: String, source_file: String) {
    self.chunk_names.push(name);
    self.chunk_source_files.push(source_file);
    self.chunk_lines.push(Vec::new());
  }
}
