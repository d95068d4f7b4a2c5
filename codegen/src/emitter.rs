use core::bytecode::{check_u31, OpCode, MAX_CONSTANTS};
use core::chunk::Chunk;
use core::errors::{CompileTimeError, RomualdoError};
use core::values::Value;

/// Bundles the mutable state a single procedure's bytecode emission needs:
/// the chunk being written, its parallel per-byte line table, and the
/// Storyworld-wide constant pool. Grounded on `Core/src/chunk.rs`'s
/// push/patch byte-buffer API, extended with the line bookkeeping
/// `spec.md` §4.5 requires ("each instruction byte records the current
/// source line").
pub struct Emitter<'a> {
  pub constants: &'a mut Vec<Value>,
  pub chunk: &'a mut Chunk,
  pub lines: &'a mut Vec<u32>,
  pub current_line: u32,
  pub source_file: String,
}

impl<'a> Emitter<'a> {
  pub fn set_line(&mut self, line: u32) {
    self.current_line = line;
  }

  pub fn push_op(&mut self, op: OpCode) {
    self.chunk.push_op(op);
    self.lines.push(self.current_line);
  }

  /// Appends an unsigned 32-bit operand (used by `Constant`'s index),
  /// returning the byte offset it was written at.
  pub fn push_u32_operand(&mut self, value: u32) -> usize {
    let at = self.chunk.push_u32(value);
    for _ in 0..4 {
      self.lines.push(self.current_line);
    }
    at
  }

  /// Appends a signed 32-bit operand (used by `Jump`/`JumpIfFalse`'s
  /// placeholder offset), returning the byte offset it was written at.
  pub fn push_i32_operand(&mut self, value: i32) -> usize {
    let at = self.chunk.push_i32(value);
    for _ in 0..4 {
      self.lines.push(self.current_line);
    }
    at
  }

  /// Back-patches a jump operand at `at` so that it carries the byte offset
  /// from the instruction immediately after the operand (`at + 4`) to the
  /// chunk's current end (`spec.md` §4.5's jump encoding).
  pub fn patch_jump_to_here(&mut self, at: usize) {
    let target = self.chunk.len() as i64;
    let offset = target - (at as i64 + 4);
    self.chunk.patch_i32(at, offset as i32);
  }

  pub fn len(&self) -> usize {
    self.chunk.len()
  }

  /// Interns `value` into the shared constant pool, reusing the index of a
  /// structurally-equal existing entry (`spec.md` §4.5's "constant pool
  /// discipline").
  pub fn intern_constant(&mut self, value: Value) -> Result<u32, RomualdoError> {
    if let Some(pos) = self.constants.iter().position(|existing| existing == &value) {
      return Ok(pos as u32);
    }
    if self.constants.len() as u64 >= MAX_CONSTANTS as u64 {
      return Err(RomualdoError::CompileTime(CompileTimeError {
        file: self.source_file.clone(),
        line: self.current_line as i64,
        lexeme: String::new(),
        message: "constant pool exceeded its maximum capacity".to_string(),
      }));
    }
    let idx = self.constants.len() as u32;
    check_u31(idx).map_err(|_| RomualdoError::internal("constant index overflowed its u31 encoding"))?;
    self.constants.push(value);
    Ok(idx)
  }
}

#[cfg(test)]
mod tests {
  use std::rc::Rc;

  use super::*;

  fn emitter(constants: &mut Vec<Value>, chunk: &mut Chunk, lines: &mut Vec<u32>) -> Emitter<'_> {
    Emitter { constants, chunk, lines, current_line: 1, source_file: "<test>".to_string() }
  }

  #[test]
  fn intern_constant_deduplicates_equal_strings() {
    let mut constants = Vec::new();
    let mut chunk = Chunk::default();
    let mut lines = Vec::new();
    let mut emitter = emitter(&mut constants, &mut chunk, &mut lines);

    let first = emitter.intern_constant(Value::Str(Rc::from("hi"))).unwrap();
    let second = emitter.intern_constant(Value::Str(Rc::from("hi"))).unwrap();
    let third = emitter.intern_constant(Value::Str(Rc::from("bye"))).unwrap();

    assert_eq!(first, second);
    assert_ne!(first, third);
    assert_eq!(constants.len(), 2);
  }

  #[test]
  fn push_u32_operand_tracks_one_line_per_byte() {
    let mut constants = Vec::new();
    let mut chunk = Chunk::default();
    let mut lines = Vec::new();
    let mut emitter = emitter(&mut constants, &mut chunk, &mut lines);

    emitter.set_line(7);
    emitter.push_op(OpCode::Constant);
    emitter.push_u32_operand(42);

    assert_eq!(chunk.get_u32(1), 42);
    assert_eq!(lines, vec![7, 7, 7, 7, 7]);
  }

  #[test]
  fn patch_jump_to_here_computes_offset_past_the_operand() {
    let mut constants = Vec::new();
    let mut chunk = Chunk::default();
    let mut lines = Vec::new();
    let mut emitter = emitter(&mut constants, &mut chunk, &mut lines);

    emitter.push_op(OpCode::JumpIfFalse);
    let at = emitter.push_i32_operand(0);
    emitter.push_op(OpCode::Pop);
    emitter.push_op(OpCode::Pop);
    emitter.patch_jump_to_here(at);

    // Two `Pop` instructions, one byte each, sit between the operand's end
    // and the patch point.
    assert_eq!(chunk.get_i32(at), 2);
  }
}
