use core::errors::RomualdoError;

/// A forward-only cursor over a borrowed byte slice, used by every reader in
/// this crate to avoid repeating truncation checks at each field.
pub struct ByteReader<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> ByteReader<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    ByteReader { bytes, pos: 0 }
  }

  pub fn read_u8(&mut self) -> Result<u8, RomualdoError> {
    let byte = *self.bytes.get(self.pos).ok_or_else(|| RomualdoError::tool("truncated artifact"))?;
    self.pos += 1;
    Ok(byte)
  }

  pub fn read_u32(&mut self) -> Result<u32, RomualdoError> {
    Ok(u32::from_le_bytes(self.read_bytes(4)?.try_into().unwrap()))
  }

  pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], RomualdoError> {
    if self.pos + n > self.bytes.len() {
      return Err(RomualdoError::tool("truncated artifact"));
    }
    let slice = &self.bytes[self.pos..self.pos + n];
    self.pos += n;
    Ok(slice)
  }

  /// Reads a `len:u32 LE + utf8 bytes` string, the encoding every text field
  /// in these formats shares.
  pub fn read_text(&mut self) -> Result<String, RomualdoError> {
    let len = self.read_u32()? as usize;
    let bytes = self.read_bytes(len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| RomualdoError::tool("artifact contains invalid utf-8 text"))
  }
}
