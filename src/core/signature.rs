//! Member signatures and their structural keys.

use std::fmt;

use crate::core::shape::Shape;
use crate::util::Symbol;

/// How an argument is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassMode {
    /// By value; the callee cannot affect the caller's storage.
    Value,
    /// By reference, read and written (`in-out`).
    Ref,
    /// By reference, written by the callee.
    Out,
}

impl PassMode {
    /// `Ref` and `Out` share one by-reference flag when matching.
    pub fn is_by_ref(self) -> bool {
        !matches!(self, PassMode::Value)
    }
}

impl fmt::Display for PassMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassMode::Value => Ok(()),
            PassMode::Ref => write!(f, "ref "),
            PassMode::Out => write!(f, "out "),
        }
    }
}

/// A single parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub shape: Shape,
    pub mode: PassMode,
}

/// What a member was declared as. Informational only; matching ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    Getter,
    Setter,
    Adder,
    Remover,
}

/// Full signature of a required or provided member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    name: Symbol,
    params: Vec<Param>,
    ret: Shape,
    generics: Vec<Symbol>,
    kind: MemberKind,
}

/// Structural identity of a member: name, generic arity, and each
/// parameter's by-ref flag and shape. Generic parameter names and the return
/// shape are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureKey {
    pub name: Symbol,
    pub generic_arity: u16,
    pub params: Vec<(bool, Shape)>,
}

impl Signature {
    /// Start a method signature with no parameters returning `()`.
    pub fn method(name: impl Into<Symbol>) -> Self {
        Signature {
            name: name.into(),
            params: Vec::new(),
            ret: Shape::Unit,
            generics: Vec::new(),
            kind: MemberKind::Method,
        }
    }

    /// `get_{property}() -> shape`
    pub fn getter(property: &str, shape: Shape) -> Self {
        let mut sig = Signature::method(format!("get_{}", property)).returns(shape);
        sig.kind = MemberKind::Getter;
        sig
    }

    /// `set_{property}(shape)`
    pub fn setter(property: &str, shape: Shape) -> Self {
        let mut sig = Signature::method(format!("set_{}", property)).param(shape);
        sig.kind = MemberKind::Setter;
        sig
    }

    /// `add_{event}(handler)`
    pub fn adder(event: &str, handler: Shape) -> Self {
        let mut sig = Signature::method(format!("add_{}", event)).param(handler);
        sig.kind = MemberKind::Adder;
        sig
    }

    /// `remove_{event}(handler)`
    pub fn remover(event: &str, handler: Shape) -> Self {
        let mut sig = Signature::method(format!("remove_{}", event)).param(handler);
        sig.kind = MemberKind::Remover;
        sig
    }

    pub fn param(mut self, shape: Shape) -> Self {
        self.params.push(Param {
            shape,
            mode: PassMode::Value,
        });
        self
    }

    pub fn by_ref(mut self, shape: Shape) -> Self {
        self.params.push(Param {
            shape,
            mode: PassMode::Ref,
        });
        self
    }

    pub fn out(mut self, shape: Shape) -> Self {
        self.params.push(Param {
            shape,
            mode: PassMode::Out,
        });
        self
    }

    pub fn returns(mut self, shape: Shape) -> Self {
        self.ret = shape;
        self
    }

    /// Declare the member's own generic parameters. Refer to them in shapes
    /// with [`Shape::method_param`] by position.
    pub fn generic(mut self, names: &[&str]) -> Self {
        self.generics = names.iter().map(|n| Symbol::intern(n)).collect();
        self
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn ret(&self) -> &Shape {
        &self.ret
    }

    pub fn generics(&self) -> &[Symbol] {
        &self.generics
    }

    pub fn generic_arity(&self) -> usize {
        self.generics.len()
    }

    pub fn is_generic(&self) -> bool {
        !self.generics.is_empty()
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Structural identity used for dedupe, dispatch, and matching.
    pub fn key(&self) -> SignatureKey {
        SignatureKey {
            name: self.name,
            generic_arity: self.generics.len() as u16,
            params: self
                .params
                .iter()
                .map(|p| (p.mode.is_by_ref(), p.shape.clone()))
                .collect(),
        }
    }

    /// Replace contract-level placeholders in every parameter and the return.
    pub fn substitute_type_params(&self, args: &[Shape]) -> Signature {
        Signature {
            name: self.name,
            params: self
                .params
                .iter()
                .map(|p| Param {
                    shape: p.shape.substitute_type_params(args),
                    mode: p.mode,
                })
                .collect(),
            ret: self.ret.substitute_type_params(args),
            generics: self.generics.clone(),
            kind: self.kind,
        }
    }

    /// The concrete member a generic call resolves to, given the call's type
    /// arguments.
    pub fn close_generic(&self, type_args: &[Shape]) -> Signature {
        Signature {
            name: self.name,
            params: self
                .params
                .iter()
                .map(|p| Param {
                    shape: p.shape.substitute_method_params(type_args),
                    mode: p.mode,
                })
                .collect(),
            ret: self.ret.substitute_method_params(type_args),
            generics: Vec::new(),
            kind: self.kind,
        }
    }

    pub fn has_type_params(&self) -> bool {
        self.ret.has_type_params() || self.params.iter().any(|p| p.shape.has_type_params())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.generics.is_empty() {
            let names: Vec<&str> = self.generics.iter().map(|g| g.as_str()).collect();
            write!(f, "<{}>", names.join(", "))?;
        }
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}{}", p.mode, p.shape)?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.generic_arity > 0 {
            write!(f, "`{}", self.generic_arity)?;
        }
        write!(f, "(")?;
        for (i, (by_ref, shape)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if *by_ref {
                write!(f, "&")?;
            }
            write!(f, "{}", shape)?;
        }
        write!(f, ")")
    }
}
