use core::errors::RomualdoError;

/// `NotStarted → Running → {WaitingForInput → Running}* → EndOfStory`
/// (`spec.md` §4.7). Fatal runtime errors terminate execution without
/// advancing this state — the VM stays wherever it was when the error was
/// raised, matching the spec's "terminate without advancing state".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  NotStarted,
  Running,
  WaitingForInput,
  EndOfStory,
}

impl State {
  /// The `state_code` an `artifact::VmState` carries on the wire. `artifact`
  /// can't name this enum (it must not depend on `vm`), so the numbering is
  /// owned here and documented as the contract the save format relies on.
  pub fn to_code(self) -> u32 {
    match self {
      State::NotStarted => 0,
      State::Running => 1,
      State::WaitingForInput => 2,
      State::EndOfStory => 3,
    }
  }

  pub fn from_code(code: u32) -> Result<Self, RomualdoError> {
    Ok(match code {
      0 => State::NotStarted,
      1 => State::Running,
      2 => State::WaitingForInput,
      3 => State::EndOfStory,
      other => return Err(RomualdoError::tool(format!("unknown VM state code {} in a saved state", other))),
    })
  }
}
