use std::rc::Rc;

use core::bytecode::OpCode;
use core::values::Value;

use crate::{Output, State, VirtualMachine};

impl<'a> VirtualMachine<'a> {
  /// The instruction loop (`spec.md` §4.7 "Instruction loop"). Runs until the
  /// VM suspends at `listen`, reaches end-of-chunk at frame depth 1, or a
  /// runtime error is raised. Grounded on the teacher's `run()` dispatch loop
  /// shape (`match instruction { OpCode::X => self.op_x(), ... }`), collapsed
  /// here into one function since this VM has no `RuntimeResult::Continue`
  /// bookkeeping to thread between handler methods.
  pub(crate) fn run(&mut self) -> Result<Output, core::errors::RomualdoError> {
    loop {
      let frame_idx = self.frames.len() - 1;
      let chunk = self.current_chunk();

      if self.frames[frame_idx].ip >= chunk.len() {
        return self.end_of_chunk();
      }

      let op_byte = chunk.code[self.frames[frame_idx].ip];
      let opcode = match OpCode::try_from(op_byte) {
        Ok(op) => op,
        Err(byte) => return Err(self.runtime_error(format!("invalid opcode byte {} in the instruction stream", byte))),
      };
      self.frames[frame_idx].ip += 1;

      match opcode {
        OpCode::Nop => {}
        OpCode::Constant => {
          let idx = self.read_u32_operand(frame_idx, chunk)?;
          let value = match self.artifact.constants.get(idx as usize) {
            Some(value) => value.clone(),
            None => return Err(self.runtime_error(format!("constant index {} out of range", idx))),
          };
          self.stack.push(value);
        }
        OpCode::Say => {
          let value = self.pop()?;
          match value {
            Value::Lecture(text) => self.buffer.push_str(&text),
            other => return Err(self.runtime_error(format!("`say` requires a Lecture value, found {:?}", other))),
          }
        }
        OpCode::Listen => {
          let value = self.pop()?;
          let options = match value {
            Value::Str(s) => s,
            other => return Err(self.runtime_error(format!("`listen` requires a string options value, found {:?}", other))),
          };
          self.pending_options = options.to_string();
          self.state = State::WaitingForInput;
          return Ok(self.flush());
        }
        OpCode::Pop => {
          self.pop()?;
        }
        OpCode::True => self.stack.push(Value::Bool(true)),
        OpCode::False => self.stack.push(Value::Bool(false)),
        OpCode::Jump => {
          let offset = self.read_i32_operand(frame_idx, chunk)?;
          self.apply_jump(frame_idx, offset);
        }
        OpCode::JumpIfFalse => {
          let offset = self.read_i32_operand(frame_idx, chunk)?;
          let value = self.pop()?;
          match value {
            Value::Bool(false) => self.apply_jump(frame_idx, offset),
            Value::Bool(true) => {}
            other => return Err(self.runtime_error(format!("`if` condition must be a bool, found {:?}", other))),
          }
        }
        OpCode::Equal | OpCode::NotEqual => {
          let rhs = self.pop()?;
          let lhs = self.pop()?;
          let equal = lhs == rhs;
          self.stack.push(Value::Bool(if opcode == OpCode::Equal { equal } else { !equal }));
        }
        OpCode::ToString => {
          let value = self.pop()?;
          self.stack.push(Value::Str(Rc::from(value.to_user_string().as_str())));
        }
        OpCode::ToLecture => {
          let value = self.pop()?;
          match value {
            Value::Str(s) => self.stack.push(Value::Lecture(s)),
            other => return Err(self.runtime_error(format!("`ToLecture` requires a string, found {:?}", other))),
          }
        }
      }
    }
  }

  /// A temporary convention ahead of an explicit `Return` opcode (`spec.md`
  /// §4.7): reaching the end of a chunk at frame depth 1 ends the story;
  /// reaching it any deeper is an internal error, since nothing in this VM
  /// ever opens a second frame today.
  fn end_of_chunk(&mut self) -> Result<Output, core::errors::RomualdoError> {
    if self.frames.len() == 1 {
      self.state = State::EndOfStory;
      Ok(self.flush())
    } else {
      Err(self.runtime_error("reached end of a non-top-level chunk with no `Return` opcode"))
    }
  }

  fn apply_jump(&mut self, frame_idx: usize, offset: i32) {
    let ip = self.frames[frame_idx].ip as i64;
    self.frames[frame_idx].ip = (ip + offset as i64) as usize;
  }

  fn read_u32_operand(
    &mut self,
    frame_idx: usize,
    chunk: &core::chunk::Chunk,
  ) -> Result<u32, core::errors::RomualdoError> {
    let at = self.frames[frame_idx].ip;
    if at + 4 > chunk.len() {
      return Err(self.runtime_error("truncated instruction operand"));
    }
    self.frames[frame_idx].ip += 4;
    Ok(chunk.get_u32(at))
  }

  fn read_i32_operand(
    &mut self,
    frame_idx: usize,
    chunk: &core::chunk::Chunk,
  ) -> Result<i32, core::errors::RomualdoError> {
    let at = self.frames[frame_idx].ip;
    if at + 4 > chunk.len() {
      return Err(self.runtime_error("truncated instruction operand"));
    }
    self.frames[frame_idx].ip += 4;
    Ok(chunk.get_i32(at))
  }
}
