//! Structural shapes of parameters and return values.
//!
//! A shape is what two members are compared on. Generic definitions use
//! placeholders: `TypeParam(i)` for a contract's own parameters (replaced when
//! the contract is instantiated) and `MethodParam(i)` for a member's generic
//! parameters (kept as placeholders; call sites supply the arguments).

use std::fmt;

use chrono::{DateTime, Utc};

use crate::util::Symbol;

/// Structural type of a value crossing a member boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shape {
    /// No value (`void`).
    Unit,
    /// A nominal leaf: `int`, `string`, or a user type name.
    Named(Symbol),
    /// A constructed shape such as `list<int>` or `fn<int, $M0>`.
    Applied { head: Symbol, args: Vec<Shape> },
    /// Contract-level generic parameter by ordinal.
    TypeParam(u16),
    /// Member-level generic parameter by ordinal.
    MethodParam(u16),
}

impl Shape {
    pub fn named(name: impl Into<Symbol>) -> Self {
        Shape::Named(name.into())
    }

    pub fn applied(head: impl Into<Symbol>, args: Vec<Shape>) -> Self {
        Shape::Applied {
            head: head.into(),
            args,
        }
    }

    pub fn int() -> Self {
        Shape::named("int")
    }

    pub fn float() -> Self {
        Shape::named("float")
    }

    pub fn bool() -> Self {
        Shape::named("bool")
    }

    pub fn string() -> Self {
        Shape::named("string")
    }

    pub fn timestamp() -> Self {
        Shape::named("timestamp")
    }

    pub fn list(item: Shape) -> Self {
        Shape::applied("list", vec![item])
    }

    /// A callable taking `params` and returning `ret`.
    pub fn func(params: Vec<Shape>, ret: Shape) -> Self {
        let mut args = params;
        args.push(ret);
        Shape::applied("fn", args)
    }

    pub fn type_param(index: u16) -> Self {
        Shape::TypeParam(index)
    }

    pub fn method_param(index: u16) -> Self {
        Shape::MethodParam(index)
    }

    /// Whether a contract-level placeholder occurs anywhere in this shape.
    pub fn has_type_params(&self) -> bool {
        match self {
            Shape::TypeParam(_) => true,
            Shape::Applied { args, .. } => args.iter().any(Shape::has_type_params),
            Shape::Unit | Shape::Named(_) | Shape::MethodParam(_) => false,
        }
    }

    /// Replace `TypeParam(i)` with `args[i]`. Out-of-range ordinals are kept.
    pub fn substitute_type_params(&self, args: &[Shape]) -> Shape {
        match self {
            Shape::TypeParam(i) => args
                .get(usize::from(*i))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Shape::Applied { head, args: inner } => Shape::Applied {
                head: *head,
                args: inner
                    .iter()
                    .map(|s| s.substitute_type_params(args))
                    .collect(),
            },
            Shape::Unit | Shape::Named(_) | Shape::MethodParam(_) => self.clone(),
        }
    }

    /// Replace `MethodParam(i)` with a call site's type argument.
    pub fn substitute_method_params(&self, args: &[Shape]) -> Shape {
        match self {
            Shape::MethodParam(i) => args
                .get(usize::from(*i))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Shape::Applied { head, args: inner } => Shape::Applied {
                head: *head,
                args: inner
                    .iter()
                    .map(|s| s.substitute_method_params(args))
                    .collect(),
            },
            Shape::Unit | Shape::Named(_) | Shape::TypeParam(_) => self.clone(),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Unit => write!(f, "()"),
            Shape::Named(name) => write!(f, "{}", name),
            Shape::Applied { head, args } => {
                write!(f, "{}<", head)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            Shape::TypeParam(i) => write!(f, "$T{}", i),
            Shape::MethodParam(i) => write!(f, "$M{}", i),
        }
    }
}

/// Rust types with a known shape.
pub trait Shaped {
    fn shape() -> Shape;
}

impl Shaped for () {
    fn shape() -> Shape {
        Shape::Unit
    }
}

impl Shaped for i64 {
    fn shape() -> Shape {
        Shape::int()
    }
}

impl Shaped for f64 {
    fn shape() -> Shape {
        Shape::float()
    }
}

impl Shaped for bool {
    fn shape() -> Shape {
        Shape::bool()
    }
}

impl Shaped for String {
    fn shape() -> Shape {
        Shape::string()
    }
}

impl Shaped for DateTime<Utc> {
    fn shape() -> Shape {
        Shape::timestamp()
    }
}

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> Shape {
        Shape::list(T::shape())
    }
}
