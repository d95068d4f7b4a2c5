use crate::bytecode::OpCode;

/// The bytecode for a single procedure, plus its structural hash and release
/// flag.
#[derive(Clone, Default)]
pub struct Chunk {
  /// The raw instruction stream.
  pub code: Vec<u8>,
  /// Reserved for a future "release" command that freezes a chunk for
  /// save-compatibility across Storyworld versions. Not consulted by any
  /// pass implemented here.
  pub released: bool,
  /// SHA-256 of the procedure's canonical token stream. All-zero until
  /// the code hasher runs.
  pub hash: [u8; 32],
}

impl Chunk {
  /// The number of bytes currently in the instruction stream.
  pub fn len(&self) -> usize {
    self.code.len()
  }

  pub fn is_empty(&self) -> bool {
    self.code.is_empty()
  }

  pub fn push_byte(&mut self, byte: u8) {
    self.code.push(byte);
  }

  pub fn push_op(&mut self, op: OpCode) {
    self.code.push(op.into());
  }

  /// Appends a little-endian `u32`, returning the byte offset it was written at.
  pub fn push_u32(&mut self, value: u32) -> usize {
    let at = self.code.len();
    self.code.extend_from_slice(&value.to_le_bytes());
    at
  }

  /// Appends a little-endian `i32`, returning the byte offset it was written at.
  pub fn push_i32(&mut self, value: i32) -> usize {
    let at = self.code.len();
    self.code.extend_from_slice(&value.to_le_bytes());
    at
  }

  pub fn get_u32(&self, at: usize) -> u32 {
    u32::from_le_bytes(self.code[at..at + 4].try_into().unwrap())
  }

  pub fn get_i32(&self, at: usize) -> i32 {
    i32::from_le_bytes(self.code[at..at + 4].try_into().unwrap())
  }

  /// Overwrites the 4 bytes starting at `at` with a little-endian `i32`. Used to
  /// back-patch `Jump`/`JumpIfFalse` operands once the jump target is known.
  pub fn patch_i32(&mut self, at: usize, value: i32) {
    self.code[at..at + 4].copy_from_slice(&value.to_le_bytes());
  }
}
