//! `dev test --suite DIR [--walk-dont-run]`: a lightweight TOML-driven test
//! runner, external to the core pipeline this crate re-exposes (the
//! specification explicitly scopes the "real" TOML test-case runner out —
//! `spec.md` §1's "out of scope" list). This is a thin convenience built
//! from the same `toml`+`serde` pairing `examples/Brahmastra-Labs-logicaffeine`
//! and `examples/navicore-cem3` both carry for config/test fixtures.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use core::errors::RomualdoError;
use vm::{State, VirtualMachine};

use crate::build::compile_dir;

/// One `.toml` test-case file: a Storyworld to build, plus the scripted
/// exchange to drive it through.
#[derive(Debug, Deserialize)]
struct TestCase {
  /// Path (relative to the `.toml` file) to either a Storyworld directory or
  /// a single `.ral` file inside one.
  story: PathBuf,
  #[serde(default)]
  steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
  /// The reader input to push before resuming. Omitted on the first step,
  /// which instead drives `start()`.
  #[serde(default)]
  input: Option<String>,
  /// The produced output must equal this exactly, if given.
  #[serde(default)]
  expect: Option<String>,
  /// The produced output must contain this substring, if given.
  #[serde(default)]
  expect_contains: Option<String>,
}

pub fn cmd_test(suite_dir: &Path, walk_dont_run: bool) -> Result<(), RomualdoError> {
  let mut case_paths: Vec<PathBuf> = std::fs::read_dir(suite_dir)
    .map_err(|e| RomualdoError::tool(format!("{}: {}", suite_dir.display(), e)))?
    .filter_map(|entry| entry.ok())
    .map(|entry| entry.path())
    .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("toml"))
    .collect();
  case_paths.sort();

  if case_paths.is_empty() {
    return Err(RomualdoError::tool(format!("no `.toml` test cases found under {}", suite_dir.display())));
  }

  let mut failures = Vec::new();
  for case_path in &case_paths {
    let case_name = case_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();

    if walk_dont_run {
      println!("would run: {}", case_name);
      continue;
    }

    print!("{} ... ", case_name);
    match run_case(case_path) {
      Ok(()) => println!("ok"),
      Err(message) => {
        println!("FAILED");
        failures.push((case_name, message));
      }
    }
  }

  if let Some((case, message)) = failures.into_iter().next() {
    return Err(RomualdoError::TestSuite { case, message });
  }

  Ok(())
}

fn run_case(case_path: &Path) -> Result<(), String> {
  let text = std::fs::read_to_string(case_path).map_err(|e| e.to_string())?;
  let case: TestCase = toml::from_str(&text).map_err(|e| format!("malformed test case: {}", e))?;

  let base = case_path.parent().unwrap_or_else(|| Path::new("."));
  let story_path = base.join(&case.story);
  let story_dir = if story_path.is_dir() { story_path } else { story_path.parent().unwrap_or(base).to_path_buf() };

  let (artifact, debug) = compile_dir(&story_dir).map_err(|e| e.to_string())?;
  let mut vm = VirtualMachine::new(&artifact, Some(&debug));

  let mut steps = case.steps.iter();
  let first_output = vm.start().map_err(|e| e.to_string())?;
  let mut output = match steps.next() {
    Some(first) => {
      check_step(first, &first_output.text)?;
      first_output
    }
    None => first_output,
  };

  for step in steps {
    if vm.state() != State::WaitingForInput {
      return Err(format!("story ended before all {} scripted steps ran", case.steps.len()));
    }
    let input = step.input.as_deref().unwrap_or("");
    output = vm.step(input).map_err(|e| e.to_string())?;
    check_step(step, &output.text)?;
  }

  let _ = output;
  Ok(())
}

fn check_step(step: &Step, actual: &str) -> Result<(), String> {
  if let Some(expected) = &step.expect {
    if actual != expected {
      return Err(format!("expected output {:?}, got {:?}", expected, actual));
    }
  }
  if let Some(substring) = &step.expect_contains {
    if !actual.contains(substring.as_str()) {
      return Err(format!("expected output to contain {:?}, got {:?}", substring, actual));
    }
  }
  Ok(())
}
