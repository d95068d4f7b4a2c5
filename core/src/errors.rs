use std::fmt;

/// A single compile-time diagnostic.
///
/// `line` is `-1` for diagnostics that cannot be pinned to a source line (the
/// line-less case allows); otherwise it is `>= 1`.
#[derive(Debug, Clone)]
pub struct CompileTimeError {
  pub file: String,
  pub line: i64,
  pub lexeme: String,
  pub message: String,
}

impl fmt::Display for CompileTimeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let where_ = if self.lexeme.is_empty() {
      "end of file".to_string()
    } else {
      format!("`{}`", self.lexeme)
    };
    if self.line >= 1 {
      write!(f, "{}:{}: at {}: {}", self.file, self.line, where_, self.message)
    } else {
      write!(f, "{}: at {}: {}", self.file, where_, self.message)
    }
  }
}

/// The full error taxonomy of the toolchain. Every fallible pass returns
/// `Result<T, RomualdoError>`; this is a hand-rolled enum (not `thiserror`) to
/// match the teacher's own `core::errors` convention of plain
/// `std::error::Error` impls with no derive-macro error crate in the
/// dependency graph.
#[derive(Debug)]
pub enum RomualdoError {
  /// The CLI was invoked incorrectly (exit code 3).
  BadUsage(String),
  /// A single compile-time diagnostic (exit code 1).
  CompileTime(CompileTimeError),
  /// More than one compile-time diagnostic accumulated by a pass (exit code 1).
  CompileTimeCollection(Vec<CompileTimeError>),
  /// A `dev test` suite case failed (exit code 2).
  TestSuite { case: String, message: String },
  /// A VM runtime error, with a composed stack trace (exit code 100).
  Runtime { message: String },
  /// An internal invariant of the compiler was violated (exit code 125).
  InternalCompilerError { message: String },
  /// A generic tool-level failure: I/O, malformed artifact, CRC mismatch, etc.
  /// (exit code 4).
  ToolError(String),
}

impl RomualdoError {
  pub fn internal(message: impl Into<String>) -> Self {
    RomualdoError::InternalCompilerError { message: message.into() }
  }

  pub fn runtime(message: impl Into<String>) -> Self {
    RomualdoError::Runtime { message: message.into() }
  }

  pub fn tool(message: impl Into<String>) -> Self {
    RomualdoError::ToolError(message.into())
  }

  /// The process exit code this error maps to.
  pub fn exit_code(&self) -> i32 {
    match self {
      RomualdoError::BadUsage(_) => 3,
      RomualdoError::CompileTime(_) | RomualdoError::CompileTimeCollection(_) => 1,
      RomualdoError::TestSuite { .. } => 2,
      RomualdoError::ToolError(_) => 4,
      RomualdoError::Runtime { .. } => 100,
      RomualdoError::InternalCompilerError { .. } => 125,
    }
  }
}

impl fmt::Display for RomualdoError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RomualdoError::BadUsage(msg) => write!(f, "usage error: {}", msg),
      RomualdoError::CompileTime(err) => write!(f, "{}", err),
      RomualdoError::CompileTimeCollection(errs) => {
        writeln!(f, "Compile-time errors:")?;
        for (i, err) in errs.iter().enumerate() {
          if i > 0 {
            writeln!(f)?;
          }
          write!(f, "{}", err)?;
        }
        Ok(())
      }
      RomualdoError::TestSuite { case, message } => write!(f, "test case `{}` failed: {}", case, message),
      RomualdoError::Runtime { message } => write!(f, "{}", message),
      RomualdoError::InternalCompilerError { message } => write!(f, "internal compiler error: {}", message),
      RomualdoError::ToolError(msg) => write!(f, "{}", msg),
    }
  }
}

impl std::error::Error for RomualdoError {}

/// Merges per-file `CompileTimeCollection`/`CompileTime` errors gathered across
/// a pass boundary (e.g. the Storyworld assembler) into a single
/// collection, flattening nested collections.
pub fn merge_compile_errors(errors: Vec<RomualdoError>) -> RomualdoError {
  let mut flat = Vec::new();
  for err in errors {
    match err {
      RomualdoError::CompileTime(e) => flat.push(e),
      RomualdoError::CompileTimeCollection(es) => flat.extend(es),
      other => flat.push(CompileTimeError {
        file: String::new(),
        line: -1,
        lexeme: String::new(),
        message: other.to_string(),
      }),
    }
  }
  RomualdoError::CompileTimeCollection(flat)
}
