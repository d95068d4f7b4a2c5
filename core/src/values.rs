use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// The tag of a [`Value`], used by the constant pool and the type checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
  Bool,
  Str,
  Lecture,
  Procedure,
}

/// A runtime value.
///
/// All variants are value types: there is no heap of garbage-collected objects.
/// Text payloads use `Rc<str>` rather than `String` so that the constant-pool
/// deduplication in the code generator and cloning a value onto the VM
/// stack are both cheap, the way the teacher's own `Value` keeps scalar clones
/// cheap.
#[derive(Clone, PartialEq)]
pub enum Value {
  Bool(bool),
  Str(Rc<str>),
  Lecture(Rc<str>),
  /// Index of the chunk this procedure value refers to.
  Procedure(u32),
}

pub const VAL_TRUE: Value = Value::Bool(true);
pub const VAL_FALSE: Value = Value::Bool(false);

impl Debug for Value {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Value::Bool(true) => write!(f, "true"),
      Value::Bool(false) => write!(f, "false"),
      Value::Str(s) => write!(f, "{:?}", s),
      Value::Lecture(s) => write!(f, "{}", s),
      Value::Procedure(idx) => write!(f, "<procedure {}>", idx),
    }
  }
}

impl Value {
  pub fn kind(&self) -> ValueKind {
    match self {
      Value::Bool(_) => ValueKind::Bool,
      Value::Str(_) => ValueKind::Str,
      Value::Lecture(_) => ValueKind::Lecture,
      Value::Procedure(_) => ValueKind::Procedure,
    }
  }

  /// The user-facing string rendering used by `OpToString`: `true`/`false`
  /// for booleans, the string itself for strings, `<procedure N>` for procedures.
  pub fn to_user_string(&self) -> String {
    match self {
      Value::Bool(true) => "true".to_string(),
      Value::Bool(false) => "false".to_string(),
      Value::Str(s) => s.to_string(),
      Value::Lecture(s) => s.to_string(),
      Value::Procedure(idx) => format!("<procedure {}>", idx),
    }
  }
}
