use core::errors::RomualdoError;

/// Wraps `payload` in the shared on-disk framing: an 8-byte magic, a u32 LE
/// version, the payload itself, then a trailing CRC-32/IEEE of the payload.
pub fn write_framed(magic: &[u8; 8], version: u32, payload: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(8 + 4 + payload.len() + 4);
  out.extend_from_slice(magic);
  out.extend_from_slice(&version.to_le_bytes());
  out.extend_from_slice(payload);
  out.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
  out
}

/// Validates `bytes` against `magic` and its trailing CRC, returning the
/// payload slice and the version it was written with. A CRC mismatch or a
/// truncated buffer is a `ToolError`, never a compile-time error (`spec.md`
/// §7: "CRC-32 mismatch on artifact or saved state produces a tool error").
pub fn read_framed<'a>(magic: &[u8; 8], bytes: &'a [u8]) -> Result<(&'a [u8], u32), RomualdoError> {
  if bytes.len() < 8 + 4 + 4 {
    return Err(RomualdoError::tool("truncated artifact: shorter than its own framing"));
  }
  if &bytes[0..8] != magic {
    return Err(RomualdoError::tool("artifact magic mismatch"));
  }
  let version = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
  let payload = &bytes[12..bytes.len() - 4];
  let want_crc = u32::from_le_bytes(bytes[bytes.len() - 4..].try_into().unwrap());
  let got_crc = crc32fast::hash(payload);
  if want_crc != got_crc {
    return Err(RomualdoError::tool("artifact CRC-32 mismatch"));
  }
  Ok((payload, version))
}
