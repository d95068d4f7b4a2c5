//! The `run` command: drives the VM to `EndOfStory`, reading reader input
//! from stdin at each `listen` and writing narration to stdout.

use std::io::{self, BufRead, Write};
use std::path::Path;

use core::errors::RomualdoError;
use core::storyworld::{CompiledStoryworld, DebugInfo};
use vm::{State, VirtualMachine};

use crate::build::compile_dir;

pub fn cmd_run(target: &Path) -> Result<(), RomualdoError> {
  let (artifact, debug) = load_target(target)?;

  let mut vm = VirtualMachine::new(&artifact, Some(&debug));
  let stdin = io::stdin();
  let mut lines = stdin.lock().lines();

  let mut output = vm.start()?;
  loop {
    print_output(&output.text);

    match vm.state() {
      State::EndOfStory => break,
      State::WaitingForInput => {
        print!("> ");
        io::stdout().flush().ok();
        let input = match lines.next() {
          Some(Ok(line)) => line,
          Some(Err(e)) => return Err(RomualdoError::tool(format!("stdin: {}", e))),
          None => String::new(),
        };
        output = vm.step(&input)?;
      }
      other => return Err(RomualdoError::internal(format!("run loop observed unexpected VM state {:?}", other))),
    }
  }

  Ok(())
}

fn print_output(text: &str) {
  if !text.is_empty() {
    print!("{}", text);
    if !text.ends_with('\n') {
      println!();
    }
    io::stdout().flush().ok();
  }
}

/// Loads a Storyworld either from a prebuilt `<stem>.ras` (and its sibling
/// `<stem>.rad`, optional) or by compiling a source directory in-memory.
fn load_target(target: &Path) -> Result<(CompiledStoryworld, DebugInfo), RomualdoError> {
  if target.is_dir() {
    return compile_dir(target);
  }

  let bytes =
    std::fs::read(target).map_err(|e| RomualdoError::tool(format!("{}: {}", target.display(), e)))?;
  let artifact = artifact::read_compiled_storyworld(&bytes)?;

  let rad_path = target.with_extension("rad");
  let debug = match std::fs::read(&rad_path) {
    Ok(bytes) => artifact::read_debug_info(&bytes)?,
    Err(_) => DebugInfo::default(),
  };

  Ok((artifact, debug))
}
