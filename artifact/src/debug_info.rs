use core::errors::RomualdoError;
use core::storyworld::DebugInfo;

use crate::cursor::ByteReader;
use crate::framing::{read_framed, write_framed};

/// `"RmldDBG"` + SUB, this format's own magic per `spec.md` §6's "same
/// framing discipline (its own magic, version, CRC)".
const MAGIC: [u8; 8] = [0x52, 0x6D, 0x6C, 0x64, 0x44, 0x42, 0x47, 0x1A];
const VERSION: u32 = 0;

pub fn write_debug_info(debug: &DebugInfo) -> Vec<u8> {
  let mut payload = Vec::new();

  write_string_list(&mut payload, &debug.chunk_names);
  write_string_list(&mut payload, &debug.chunk_source_files);

  payload.extend_from_slice(&(debug.chunk_lines.len() as u32).to_le_bytes());
  for lines in &debug.chunk_lines {
    payload.extend_from_slice(&(lines.len() as u32).to_le_bytes());
    for &line in lines {
      payload.extend_from_slice(&line.to_le_bytes());
    }
  }

  write_framed(&MAGIC, VERSION, &payload)
}

pub fn read_debug_info(bytes: &[u8]) -> Result<DebugInfo, RomualdoError> {
  let (payload, _version) = read_framed(&MAGIC, bytes)?;
  let mut r = ByteReader::new(payload);

  let chunk_names = read_string_list(&mut r)?;
  let chunk_source_files = read_string_list(&mut r)?;

  let chunk_count = r.read_u32()?;
  let mut chunk_lines = Vec::with_capacity(chunk_count as usize);
  for _ in 0..chunk_count {
    let line_count = r.read_u32()?;
    let mut lines = Vec::with_capacity(line_count as usize);
    for _ in 0..line_count {
      lines.push(r.read_u32()?);
    }
    chunk_lines.push(lines);
  }

  Ok(DebugInfo { chunk_names, chunk_source_files, chunk_lines })
}

fn write_string_list(out: &mut Vec<u8>, strings: &[String]) {
  out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
  for s in strings {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
  }
}

fn read_string_list(r: &mut ByteReader) -> Result<Vec<String>, RomualdoError> {
  let count = r.read_u32()?;
  let mut out = Vec::with_capacity(count as usize);
  for _ in 0..count {
    out.push(r.read_text()?);
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_names_source_files_and_line_tables() {
    let original = DebugInfo {
      chunk_names: vec!["/main".to_string(), "/flag".to_string()],
      chunk_source_files: vec!["/main.ral".to_string(), "/main.ral".to_string()],
      chunk_lines: vec![vec![2, 2, 2, 2, 2, 3], vec![1]],
    };

    let bytes = write_debug_info(&original);
    let restored = read_debug_info(&bytes).unwrap();

    assert_eq!(restored.chunk_names, original.chunk_names);
    assert_eq!(restored.chunk_source_files, original.chunk_source_files);
    assert_eq!(restored.chunk_lines, original.chunk_lines);
  }
}
