//! The stack-based virtual machine (`spec.md` §4.7): executes `Chunk`
//! bytecode over a value stack with per-procedure call frames, a cooperative
//! `NotStarted → Running → WaitingForInput → ... → EndOfStory` state
//! machine, and composes a stack trace on a runtime error. Grounded on the
//! teacher's `src/virtual_machine/{mod,call_frame,run}.rs` run-loop shape and
//! `src/errors.rs`'s stack-trace construction, adapted to a single
//! cooperative caller instead of an OS-thread-driven REPL.

mod call_frame;
mod run;
mod state;

pub use call_frame::CallFrame;
pub use state::State;

use core::errors::RomualdoError;
use core::storyworld::{CompiledStoryworld, DebugInfo};
use core::values::Value;

/// Narrative text accumulated since the VM last suspended or terminated.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Output {
  pub text: String,
}

/// An executing (or not-yet-started) Storyworld. Borrows its compiled
/// artifact and, optionally, its debug info — both are read-only at runtime
/// (`spec.md` §5).
pub struct VirtualMachine<'a> {
  artifact: &'a CompiledStoryworld,
  debug: Option<&'a DebugInfo>,
  stack: Vec<Value>,
  frames: Vec<CallFrame>,
  state: State,
  pending_options: String,
  buffer: String,
}

impl<'a> VirtualMachine<'a> {
  pub fn new(artifact: &'a CompiledStoryworld, debug: Option<&'a DebugInfo>) -> Self {
    VirtualMachine {
      artifact,
      debug,
      stack: Vec::new(),
      frames: Vec::new(),
      state: State::NotStarted,
      pending_options: String::new(),
      buffer: String::new(),
    }
  }

  pub fn state(&self) -> State {
    self.state
  }

  /// The options string the most recent `listen` popped. Only meaningful
  /// while `state() == State::WaitingForInput`.
  pub fn pending_options(&self) -> &str {
    &self.pending_options
  }

  /// Pushes a procedure value for `initial_chunk`, opens its frame, and runs
  /// until the VM suspends at `listen` or reaches end-of-story.
  pub fn start(&mut self) -> Result<Output, RomualdoError> {
    if self.state != State::NotStarted {
      return Err(RomualdoError::internal("start() called on a VM that has already started"));
    }
    let chunk_index = self.artifact.initial_chunk;
    self.stack.push(Value::Procedure(chunk_index));
    self.frames.push(CallFrame::new(chunk_index, self.stack.len() - 1));
    self.state = State::Running;
    self.run()
  }

  /// Resumes a VM suspended at `listen` (`spec.md` §4.7 "Resume"), pushing
  /// `input` as a string value.
  pub fn step(&mut self, input: &str) -> Result<Output, RomualdoError> {
    if self.state != State::WaitingForInput {
      return Err(RomualdoError::internal("step() called on a VM that is not waiting for input"));
    }
    self.stack.push(Value::Str(std::rc::Rc::from(input)));
    self.state = State::Running;
    self.run()
  }

  fn flush(&mut self) -> Output {
    Output { text: std::mem::take(&mut self.buffer) }
  }

  fn pop(&mut self) -> Result<Value, RomualdoError> {
    self.stack.pop().ok_or_else(|| self.runtime_error("value stack underflow"))
  }

  fn current_chunk(&self) -> &'a core::chunk::Chunk {
    let idx = self.frames.last().expect("run() invoked with no open frame").chunk_index as usize;
    &self.artifact.chunks[idx]
  }

  /// Builds a `Runtime` error (`spec.md` §4.7 "Runtime errors") by iterating
  /// frames top-down and resolving each one's procedure name and source line
  /// through `DebugInfo`, if present. A missing `DebugInfo` degrades the
  /// trace to bare chunk indices but is never itself fatal.
  fn runtime_error(&self, message: impl Into<String>) -> RomualdoError {
    let mut trace = message.into();
    for frame in self.frames.iter().rev() {
      trace.push_str("\n  at ");
      trace.push_str(&self.describe_frame(frame));
    }
    RomualdoError::runtime(trace)
  }

  fn describe_frame(&self, frame: &CallFrame) -> String {
    let idx = frame.chunk_index as usize;
    match self.debug {
      Some(debug) => {
        let name = debug.chunk_names.get(idx).cloned().unwrap_or_else(|| format!("<chunk {}>", idx));
        let line = frame
          .ip
          .checked_sub(1)
          .and_then(|ip| debug.chunk_lines.get(idx).and_then(|lines| lines.get(ip)))
          .copied();
        match line {
          Some(line) => format!("{} (line {})", name, line),
          None => name,
        }
      }
      None => format!("<chunk {}>", idx),
    }
  }

  /// Captures the VM's live state into the transport shape `artifact`
  /// serializes (`spec.md` §6's saved-state format).
  pub fn to_saved_state(&self) -> artifact::VmState {
    artifact::VmState {
      state_code: self.state.to_code(),
      pending_options: self.pending_options.clone(),
      stack: self.stack.clone(),
      frames: self
        .frames
        .iter()
        .map(|f| artifact::VmStateFrame { chunk_index: f.chunk_index, ip: f.ip as u32, stack_base: f.stack_base as u32 })
        .collect(),
    }
  }

  /// Rebuilds a VM from a previously saved state. Restoration rebuilds the
  /// frame stack and the value stack verbatim but clears the output buffer,
  /// since nothing was pending delivery to a driver across the save/load
  /// boundary.
  pub fn restore(
    artifact: &'a CompiledStoryworld,
    debug: Option<&'a DebugInfo>,
    saved: artifact::VmState,
  ) -> Result<Self, RomualdoError> {
    let state = State::from_code(saved.state_code)?;
    let frames = saved
      .frames
      .into_iter()
      .map(|f| CallFrame { chunk_index: f.chunk_index, ip: f.ip as usize, stack_base: f.stack_base as usize })
      .collect();

    Ok(VirtualMachine {
      artifact,
      debug,
      stack: saved.stack,
      frames,
      state,
      pending_options: saved.pending_options,
      buffer: String::new(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use core::bytecode::OpCode;
  use core::chunk::Chunk;
  use core::storyworld::{CompiledStoryworld, DebugInfo};
  use std::rc::Rc;

  fn storyworld_with_chunk(build: impl FnOnce(&mut Chunk, &mut Vec<Value>)) -> CompiledStoryworld {
    let mut chunk = Chunk::default();
    let mut constants = Vec::new();
    build(&mut chunk, &mut constants);
    CompiledStoryworld { constants, chunks: vec![chunk], initial_chunk: 0 }
  }

  #[test]
  fn smoke_passage_says_a_lecture_then_ends_the_story() {
    let artifact = storyworld_with_chunk(|chunk, constants| {
      let idx = constants.len() as u32;
      constants.push(Value::Lecture(Rc::from("Hello, world!")));
      chunk.push_op(OpCode::Constant);
      chunk.push_u32(idx);
      chunk.push_op(OpCode::Say);
    });

    let mut vm = VirtualMachine::new(&artifact, None);
    let output = vm.start().unwrap();

    assert_eq!(output.text, "Hello, world!");
    assert_eq!(vm.state(), State::EndOfStory);
  }

  #[test]
  fn if_else_picks_the_taken_branch() {
    let artifact = storyworld_with_chunk(|chunk, constants| {
      let then_idx = constants.len() as u32;
      constants.push(Value::Lecture(Rc::from("then branch")));
      let else_idx = constants.len() as u32;
      constants.push(Value::Lecture(Rc::from("else branch")));

      chunk.push_op(OpCode::False);
      chunk.push_op(OpCode::JumpIfFalse);
      let else_at = chunk.push_i32(0);

      chunk.push_op(OpCode::Constant);
      chunk.push_u32(then_idx);
      chunk.push_op(OpCode::Say);
      chunk.push_op(OpCode::Jump);
      let end_at = chunk.push_i32(0);

      let else_target = chunk.len() as i32;
      chunk.patch_i32(else_at, else_target - (else_at as i32 + 4));

      chunk.push_op(OpCode::Constant);
      chunk.push_u32(else_idx);
      chunk.push_op(OpCode::Say);

      let end_target = chunk.len() as i32;
      chunk.patch_i32(end_at, end_target - (end_at as i32 + 4));
    });

    let mut vm = VirtualMachine::new(&artifact, None);
    let output = vm.start().unwrap();

    assert_eq!(output.text, "else branch");
    assert_eq!(vm.state(), State::EndOfStory);
  }

  #[test]
  fn listen_suspends_and_step_resumes_with_the_pushed_input() {
    let artifact = storyworld_with_chunk(|chunk, constants| {
      let options_idx = constants.len() as u32;
      constants.push(Value::Str(Rc::from("yes/no")));

      chunk.push_op(OpCode::Constant);
      chunk.push_u32(options_idx);
      chunk.push_op(OpCode::Listen);
      chunk.push_op(OpCode::ToLecture);
      chunk.push_op(OpCode::Say);
    });

    let mut vm = VirtualMachine::new(&artifact, None);
    let first = vm.start().unwrap();

    assert!(first.text.is_empty());
    assert_eq!(vm.state(), State::WaitingForInput);
    assert_eq!(vm.pending_options(), "yes/no");

    let second = vm.step("yes").unwrap();
    assert_eq!(second.text, "yes");
    assert_eq!(vm.state(), State::EndOfStory);
  }

  #[test]
  fn saying_a_non_lecture_value_is_a_runtime_error_with_a_frame_trace() {
    let artifact = storyworld_with_chunk(|chunk, _constants| {
      chunk.push_op(OpCode::True);
      chunk.push_op(OpCode::Say);
    });
    let mut debug = DebugInfo::default();
    debug.push_chunk("/main".to_string(), "/main.ral".to_string());
    debug.chunk_lines[0] = vec![0, 1];

    let mut vm = VirtualMachine::new(&artifact, Some(&debug));
    let err = vm.start().unwrap_err();

    match err {
      RomualdoError::Runtime { message } => {
        assert!(message.contains("Lecture"));
        assert!(message.contains("/main"));
      }
      other => panic!("expected a Runtime error, got {:?}", other),
    }
  }

  #[test]
  fn saved_state_round_trips_through_a_listen_suspension() {
    let artifact = storyworld_with_chunk(|chunk, constants| {
      let options_idx = constants.len() as u32;
      constants.push(Value::Str(Rc::from("a/b")));
      chunk.push_op(OpCode::Constant);
      chunk.push_u32(options_idx);
      chunk.push_op(OpCode::Listen);
      chunk.push_op(OpCode::ToLecture);
      chunk.push_op(OpCode::Say);
    });

    let mut vm = VirtualMachine::new(&artifact, None);
    vm.start().unwrap();
    assert_eq!(vm.state(), State::WaitingForInput);

    let saved = vm.to_saved_state();
    let bytes = artifact::write_vm_state(&saved);
    let reloaded = artifact::read_vm_state(&bytes).unwrap();

    let mut resumed = VirtualMachine::restore(&artifact, None, reloaded).unwrap();
    assert_eq!(resumed.state(), State::WaitingForInput);
    assert_eq!(resumed.pending_options(), "a/b");

    let output = resumed.step("a").unwrap();
    assert_eq!(output.text, "a");
    assert_eq!(resumed.state(), State::EndOfStory);
  }
}
