use std::rc::Rc;

use core::chunk::Chunk;
use core::errors::RomualdoError;
use core::storyworld::CompiledStoryworld;
use core::values::Value;

use crate::cursor::ByteReader;
use crate::framing::{read_framed, write_framed};

/// `"RmldCSW"` + SUB (`spec.md` §6).
const MAGIC: [u8; 8] = [0x52, 0x6D, 0x6C, 0x64, 0x43, 0x53, 0x57, 0x1A];
const VERSION: u32 = 0;

pub fn write_compiled_storyworld(artifact: &CompiledStoryworld) -> Result<Vec<u8>, RomualdoError> {
  let mut payload = Vec::new();

  payload.extend_from_slice(&(artifact.constants.len() as u32).to_le_bytes());
  for value in &artifact.constants {
    write_constant(&mut payload, value)?;
  }

  payload.extend_from_slice(&(artifact.chunks.len() as u32).to_le_bytes());
  for chunk in &artifact.chunks {
    write_chunk(&mut payload, chunk);
  }

  payload.extend_from_slice(&artifact.initial_chunk.to_le_bytes());

  Ok(write_framed(&MAGIC, VERSION, &payload))
}

pub fn read_compiled_storyworld(bytes: &[u8]) -> Result<CompiledStoryworld, RomualdoError> {
  let (payload, _version) = read_framed(&MAGIC, bytes)?;
  let mut r = ByteReader::new(payload);

  let constants_len = r.read_u32()?;
  let mut constants = Vec::with_capacity(constants_len as usize);
  for _ in 0..constants_len {
    constants.push(read_constant(&mut r)?);
  }

  let chunks_len = r.read_u32()?;
  let mut chunks = Vec::with_capacity(chunks_len as usize);
  for _ in 0..chunks_len {
    chunks.push(read_chunk(&mut r)?);
  }

  let initial_chunk = r.read_u32()?;

  Ok(CompiledStoryworld { constants, chunks, initial_chunk })
}

/// Tag encoding per `spec.md` §6: `0=false, 1=true, 2=int, 3=float, 4=bnum,
/// 5=string, 6=lecture`. This build's `Value` has no int/float/bnum runtime
/// variant (no literal syntax produces one); those tags are reserved on the
/// wire but never written here. Procedure values never reach the constant
/// pool — the generator only ever interns `Bool`/`Str`/`Lecture`.
fn write_constant(out: &mut Vec<u8>, value: &Value) -> Result<(), RomualdoError> {
  match value {
    Value::Bool(false) => out.push(0),
    Value::Bool(true) => out.push(1),
    Value::Str(s) => {
      out.push(5);
      write_text(out, s);
    }
    Value::Lecture(s) => {
      out.push(6);
      write_text(out, s);
    }
    Value::Procedure(_) => {
      return Err(RomualdoError::internal("a procedure value reached the constant pool serializer"))
    }
  }
  Ok(())
}

fn read_constant(r: &mut ByteReader) -> Result<Value, RomualdoError> {
  let tag = r.read_u8()?;
  Ok(match tag {
    0 => Value::Bool(false),
    1 => Value::Bool(true),
    5 => Value::Str(Rc::from(r.read_text()?)),
    6 => Value::Lecture(Rc::from(r.read_text()?)),
    2 | 3 | 4 => {
      return Err(RomualdoError::tool(format!(
        "constant tag {} (int/float/bnum) has no runtime representation in this build",
        tag
      )))
    }
    other => return Err(RomualdoError::tool(format!("unknown constant tag {}", other))),
  })
}

fn write_text(out: &mut Vec<u8>, text: &str) {
  out.extend_from_slice(&(text.len() as u32).to_le_bytes());
  out.extend_from_slice(text.as_bytes());
}

fn write_chunk(out: &mut Vec<u8>, chunk: &Chunk) {
  out.extend_from_slice(&(chunk.code.len() as u32).to_le_bytes());
  out.extend_from_slice(&chunk.code);
}

fn read_chunk(r: &mut ByteReader) -> Result<Chunk, RomualdoError> {
  let len = r.read_u32()? as usize;
  let code = r.read_bytes(len)?.to_vec();
  Ok(Chunk { code, released: false, hash: [0; 32] })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> CompiledStoryworld {
    CompiledStoryworld {
      constants: vec![Value::Bool(true), Value::Str(Rc::from("a/b")), Value::Lecture(Rc::from("Hello!"))],
      chunks: vec![Chunk { code: vec![1, 2, 3, 4, 5], released: false, hash: [7; 32] }, Chunk::default()],
      initial_chunk: 1,
    }
  }

  #[test]
  fn round_trips_constants_chunks_and_initial_chunk() {
    let original = sample();
    let bytes = write_compiled_storyworld(&original).unwrap();
    let restored = read_compiled_storyworld(&bytes).unwrap();

    assert_eq!(restored.constants, original.constants);
    assert_eq!(restored.initial_chunk, original.initial_chunk);
    assert_eq!(restored.chunks.len(), original.chunks.len());
    for (a, b) in restored.chunks.iter().zip(original.chunks.iter()) {
      assert_eq!(a.code, b.code);
    }
  }

  #[test]
  fn flipped_payload_byte_is_a_tool_error_not_a_panic() {
    let bytes_ok = write_compiled_storyworld(&sample()).unwrap();
    let mut corrupted = bytes_ok.clone();
    let mid = corrupted.len() / 2;
    corrupted[mid] ^= 0xFF;

    let err = read_compiled_storyworld(&corrupted).unwrap_err();
    assert!(matches!(err, RomualdoError::ToolError(_)));
  }

  #[test]
  fn procedure_value_in_constant_pool_is_an_internal_error() {
    let artifact = CompiledStoryworld { constants: vec![Value::Procedure(0)], chunks: vec![], initial_chunk: 0 };
    let err = write_compiled_storyworld(&artifact).unwrap_err();
    assert!(matches!(err, RomualdoError::InternalCompilerError { .. }));
  }
}
