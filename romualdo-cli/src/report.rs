//! Error reporting: prints a `RomualdoError` to stderr in the teacher's own
//! ANSI-colored, label-then-message shape (`src/errors.rs`'s
//! `report_runtime_error`), adapted from its frame-by-frame VM traceback to
//! this crate's `CompileTime`/`Runtime`/internal taxonomy (`spec.md` §7).

use core::errors::RomualdoError;

/// Prints `err` to stderr and returns the process exit code `spec.md` §6
/// assigns it.
pub fn report(err: &RomualdoError) -> i32 {
  match err {
    RomualdoError::CompileTimeCollection(errors) => {
      eprintln!("\x1b[31;1mCompile-time errors:\x1b[0m");
      for e in errors {
        eprintln!("  {}", e);
      }
    }
    RomualdoError::CompileTime(e) => {
      eprintln!("\x1b[31;1mCompile-time error:\x1b[0m {}", e);
    }
    RomualdoError::Runtime { message } => {
      eprintln!("\x1b[31;1mRuntime error:\x1b[0m");
      for (i, line) in message.lines().enumerate() {
        if i == 0 {
          eprintln!("  {}", line);
        } else {
          eprintln!("{}", line);
        }
      }
    }
    RomualdoError::InternalCompilerError { message } => {
      eprintln!("\x1b[31;1mInternal compiler error:\x1b[0m {}", message);
      eprintln!("  this is a bug in the toolchain itself, not in your Storyworld.");
    }
    RomualdoError::TestSuite { case, message } => {
      eprintln!("\x1b[31;1mTest suite failure\x1b[0m in `{}`: {}", case, message);
    }
    RomualdoError::BadUsage(message) => {
      eprintln!("\x1b[31;1musage error:\x1b[0m {}", message);
    }
    RomualdoError::ToolError(message) => {
      eprintln!("\x1b[31;1mromualdo error:\x1b[0m {}", message);
    }
  }
  err.exit_code()
}
