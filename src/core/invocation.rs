//! Arguments handed to a member and the call-time error type.

use std::fmt;

use thiserror::Error;

use crate::core::object::Object;
use crate::core::shape::Shape;
use crate::core::signature::PassMode;
use crate::core::value::{Callback, Value};

/// Call-time misuse of a member. Errors raised by the member itself are
/// never converted into this type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("`{contract}` has no member `{member}` callable with these arguments")]
    NoSuchMember { contract: String, member: String },

    #[error("call to `{member}` on `{contract}` is ambiguous between: {}", candidates.join(", "))]
    AmbiguousCall {
        contract: String,
        member: String,
        candidates: Vec<String>,
    },

    #[error("`{member}` takes {expected} argument(s), got {found}")]
    ArityMismatch {
        member: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {index} of `{member}` must be passed {expected}")]
    PassModeMismatch {
        member: String,
        index: usize,
        expected: &'static str,
    },

    #[error("`{member}` takes {expected} type argument(s), got {found}")]
    GenericArityMismatch {
        member: String,
        expected: usize,
        found: usize,
    },

    #[error("missing argument {index}")]
    MissingArgument { index: usize },

    #[error("missing type argument {index}")]
    MissingTypeArgument { index: usize },

    #[error("argument {index} is not passed by reference")]
    NotByRef { index: usize },

    #[error("argument {index}: expected {expected}, found {found}")]
    ArgumentType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("type `{type_name}` has no bound member `{member}`")]
    Unbound { type_name: String, member: String },

    #[error("receiver is not a `{expected}`")]
    ReceiverMismatch { expected: String },
}

/// One argument. By-reference arguments carry the caller's own storage.
#[derive(Debug)]
pub enum Arg<'a> {
    Val(Value),
    Ref(&'a mut Value),
}

impl<'a> Arg<'a> {
    pub fn val(value: impl Into<Value>) -> Self {
        Arg::Val(value.into())
    }

    pub fn by_ref(slot: &'a mut Value) -> Self {
        Arg::Ref(slot)
    }

    pub fn is_by_ref(&self) -> bool {
        matches!(self, Arg::Ref(_))
    }

    pub fn value(&self) -> &Value {
        match self {
            Arg::Val(v) => v,
            Arg::Ref(slot) => &**slot,
        }
    }

    fn mode_name(mode: PassMode) -> &'static str {
        if mode.is_by_ref() {
            "by reference"
        } else {
            "by value"
        }
    }

    /// Whether this argument fits a parameter declared with `mode`.
    pub(crate) fn check_mode(
        &self,
        member: &dyn fmt::Display,
        index: usize,
        mode: PassMode,
    ) -> Result<(), CallError> {
        if self.is_by_ref() == mode.is_by_ref() {
            Ok(())
        } else {
            Err(CallError::PassModeMismatch {
                member: member.to_string(),
                index,
                expected: Self::mode_name(mode),
            })
        }
    }
}

/// Type arguments and arguments of a single call.
///
/// Forwarding members hand the same invocation to the real member, so a
/// `Ref` argument written by the real member lands in the caller's storage.
#[derive(Debug)]
pub struct Invocation<'a, 'b> {
    type_args: &'a [Shape],
    args: &'a mut [Arg<'b>],
}

impl<'a, 'b> Invocation<'a, 'b> {
    pub fn new(type_args: &'a [Shape], args: &'a mut [Arg<'b>]) -> Self {
        Invocation { type_args, args }
    }

    pub fn type_args(&self) -> &[Shape] {
        self.type_args
    }

    pub fn type_arg(&self, index: usize) -> Result<&Shape, CallError> {
        self.type_args
            .get(index)
            .ok_or(CallError::MissingTypeArgument { index })
    }

    pub fn args(&self) -> &[Arg<'b>] {
        &*self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn value(&self, index: usize) -> Result<&Value, CallError> {
        self.args
            .get(index)
            .map(Arg::value)
            .ok_or(CallError::MissingArgument { index })
    }

    /// The caller's storage behind a by-reference argument.
    pub fn slot(&mut self, index: usize) -> Result<&mut Value, CallError> {
        match self.args.get_mut(index) {
            Some(Arg::Ref(slot)) => Ok(&mut **slot),
            Some(Arg::Val(_)) => Err(CallError::NotByRef { index }),
            None => Err(CallError::MissingArgument { index }),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64, CallError> {
        let value = self.value(index)?;
        value.as_int().ok_or(CallError::ArgumentType {
            index,
            expected: "int",
            found: value.kind(),
        })
    }

    pub fn bool(&self, index: usize) -> Result<bool, CallError> {
        let value = self.value(index)?;
        value.as_bool().ok_or(CallError::ArgumentType {
            index,
            expected: "bool",
            found: value.kind(),
        })
    }

    pub fn str(&self, index: usize) -> Result<&str, CallError> {
        let value = self.value(index)?;
        value.as_str().ok_or(CallError::ArgumentType {
            index,
            expected: "string",
            found: value.kind(),
        })
    }

    pub fn func(&self, index: usize) -> Result<&Callback, CallError> {
        let value = self.value(index)?;
        value.as_func().ok_or(CallError::ArgumentType {
            index,
            expected: "fn",
            found: value.kind(),
        })
    }

    pub fn object(&self, index: usize) -> Result<&Object, CallError> {
        let value = self.value(index)?;
        value.as_object().ok_or(CallError::ArgumentType {
            index,
            expected: "object",
            found: value.kind(),
        })
    }
}
