use std::rc::Rc;

use core::errors::RomualdoError;
use core::values::Value;

use crate::cursor::ByteReader;
use crate::framing::{read_framed, write_framed};

/// `"RmldSav"` + SUB (`spec.md` §6).
const MAGIC: [u8; 8] = [0x52, 0x6D, 0x6C, 0x64, 0x53, 0x61, 0x76, 0x1A];
const VERSION: u32 = 0;

/// The on-disk shape of one call frame. The `vm` crate maps this to and from
/// its own `CallFrame`, which additionally borrows the chunk by reference;
/// this transport type holds only the plain fields `spec.md` §6 lists
/// (`procedure chunk index, ip, and stack-view base`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmStateFrame {
  pub chunk_index: u32,
  pub ip: u32,
  pub stack_base: u32,
}

/// The transport form of a VM's execution state, independent of the `vm`
/// crate's own live types so that `artifact` never depends on `vm` (the
/// dependency points the other way: `vm` depends on `artifact`).
/// `state_code`'s four values are assigned by the `vm` crate, which owns
/// the `NotStarted/Running/WaitingForInput/EndOfStory` enum this mirrors.
#[derive(Debug, Clone, PartialEq)]
pub struct VmState {
  pub state_code: u32,
  pub pending_options: String,
  pub stack: Vec<Value>,
  pub frames: Vec<VmStateFrame>,
}

pub fn write_vm_state(state: &VmState) -> Vec<u8> {
  let mut payload = Vec::new();

  payload.extend_from_slice(&state.state_code.to_le_bytes());
  write_text(&mut payload, &state.pending_options);

  payload.extend_from_slice(&(state.stack.len() as u32).to_le_bytes());
  for value in &state.stack {
    write_stack_value(&mut payload, value);
  }

  payload.extend_from_slice(&(state.frames.len() as u32).to_le_bytes());
  for frame in &state.frames {
    payload.extend_from_slice(&frame.chunk_index.to_le_bytes());
    payload.extend_from_slice(&frame.ip.to_le_bytes());
    payload.extend_from_slice(&frame.stack_base.to_le_bytes());
  }

  write_framed(&MAGIC, VERSION, &payload)
}

pub fn read_vm_state(bytes: &[u8]) -> Result<VmState, RomualdoError> {
  let (payload, _version) = read_framed(&MAGIC, bytes)?;
  let mut r = ByteReader::new(payload);

  let state_code = r.read_u32()?;
  let pending_options = r.read_text()?;

  let stack_len = r.read_u32()?;
  let mut stack = Vec::with_capacity(stack_len as usize);
  for _ in 0..stack_len {
    stack.push(read_stack_value(&mut r)?);
  }

  let frame_count = r.read_u32()?;
  let mut frames = Vec::with_capacity(frame_count as usize);
  for _ in 0..frame_count {
    let chunk_index = r.read_u32()?;
    let ip = r.read_u32()?;
    let stack_base = r.read_u32()?;
    frames.push(VmStateFrame { chunk_index, ip, stack_base });
  }

  Ok(VmState { state_code, pending_options, stack, frames })
}

fn write_text(out: &mut Vec<u8>, text: &str) {
  out.extend_from_slice(&(text.len() as u32).to_le_bytes());
  out.extend_from_slice(text.as_bytes());
}

/// Unlike the constant-pool encoding in `csw.rs`, a live stack legitimately
/// holds `Procedure` values (the callee `start()` pushes before opening the
/// first frame), so this tag table adds `7=procedure(chunk_index:u32)`.
fn write_stack_value(out: &mut Vec<u8>, value: &Value) {
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
    Value::Procedure(chunk_index) => {
      out.push(7);
      out.extend_from_slice(&chunk_index.to_le_bytes());
    }
  }
}

fn read_stack_value(r: &mut ByteReader) -> Result<Value, RomualdoError> {
  let tag = r.read_u8()?;
  Ok(match tag {
    0 => Value::Bool(false),
    1 => Value::Bool(true),
    5 => Value::Str(Rc::from(r.read_text()?)),
    6 => Value::Lecture(Rc::from(r.read_text()?)),
    7 => Value::Procedure(r.read_u32()?),
    other => return Err(RomualdoError::tool(format!("unknown value tag {} in a saved VM state", other))),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_stack_options_and_frames() {
    let original = VmState {
      state_code: 2,
      pending_options: "a/b".to_string(),
      stack: vec![Value::Procedure(0), Value::Str(Rc::from("a/b"))],
      frames: vec![VmStateFrame { chunk_index: 0, ip: 12, stack_base: 0 }],
    };

    let bytes = write_vm_state(&original);
    let restored = read_vm_state(&bytes).unwrap();

    assert_eq!(restored, original);
  }

  #[test]
  fn corrupted_crc_is_reported_as_a_tool_error() {
    let bytes_ok = write_vm_state(&VmState {
      state_code: 0,
      pending_options: String::new(),
      stack: vec![],
      frames: vec![],
    });
    let mut corrupted = bytes_ok;
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0xFF;

    let err = read_vm_state(&corrupted).unwrap_err();
    assert!(matches!(err, RomualdoError::ToolError(_)));
  }
}
