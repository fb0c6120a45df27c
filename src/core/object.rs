//! Reflective object model.
//!
//! Rust has no runtime reflection, so every adaptable type describes itself
//! once through [`Reflect`]: a table of member signatures, each bound to a
//! callable. Generated adapter types use the same [`TypeDescriptor`] shape,
//! which is what lets an adapter be dispatched exactly like a real object.
//!
//! ```ignore
//! impl Reflect for Greeter {
//!     fn describe(ty: &mut TypeBuilder<Self>) {
//!         ty.named("Greeter").method(
//!             Signature::method("Greet").param(Shape::string()).returns(Shape::string()),
//!             |this, inv| Ok(format!("{} {}", this.greeting, inv.str(0)?).into()),
//!         );
//!     }
//! }
//!
//! let greeter = Object::new(Greeter { greeting: "hello".into() });
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use anyhow::Result;
use parking_lot::RwLock;

use crate::core::contract::{Contract, ContractId};
use crate::core::invocation::{Arg, CallError, Invocation};
use crate::core::shape::Shape;
use crate::core::signature::{Signature, SignatureKey};
use crate::core::value::{Callback, Value};
use crate::util::Symbol;

/// A member body: receives the receiver as `&dyn Any` plus the invocation.
pub type Invoker = Arc<dyn Fn(&dyn Any, &mut Invocation<'_, '_>) -> Result<Value> + Send + Sync>;

pub(crate) fn invoker<F>(f: F) -> Invoker
where
    F: Fn(&dyn Any, &mut Invocation<'_, '_>) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

static NEXT_TYPE: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a concrete source or adapter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u64);

impl TypeKey {
    fn fresh() -> Self {
        TypeKey(NEXT_TYPE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// A callable member of a type.
#[derive(Clone)]
pub struct Member {
    signature: Signature,
    invoker: Invoker,
    declared_on: Symbol,
}

impl Member {
    pub(crate) fn new(signature: Signature, invoker: Invoker, declared_on: Symbol) -> Self {
        Member {
            signature,
            invoker,
            declared_on,
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Name of the type that declared this member (a base type for inherited ones).
    pub fn declared_on(&self) -> Symbol {
        self.declared_on
    }

    pub(crate) fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    pub fn call(&self, receiver: &dyn Any, invocation: &mut Invocation<'_, '_>) -> Result<Value> {
        (self.invoker)(receiver, invocation)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declared_on, self.signature)
    }
}

/// Member table of one concrete type.
#[derive(Debug)]
pub struct TypeDescriptor {
    key: TypeKey,
    name: Symbol,
    members: Vec<Member>,
    index: HashMap<SignatureKey, usize>,
    contracts: Vec<Arc<Contract>>,
    synthesized: bool,
}

impl TypeDescriptor {
    fn assemble(name: Symbol, members: Vec<Member>, contracts: Vec<Arc<Contract>>, synthesized: bool) -> Self {
        let index = members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.signature.key(), i))
            .collect();

        TypeDescriptor {
            key: TypeKey::fresh(),
            name,
            members,
            index,
            contracts,
            synthesized,
        }
    }

    /// Descriptor of a generated adapter type.
    pub(crate) fn synthesized(name: Symbol, members: Vec<Member>, contract: Arc<Contract>) -> Self {
        Self::assemble(name, members, vec![contract], true)
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Exact lookup by structural key.
    pub fn member(&self, key: &SignatureKey) -> Option<&Member> {
        self.index.get(key).map(|&i| &self.members[i])
    }

    pub fn members_named(&self, name: Symbol) -> impl Iterator<Item = &Member> + '_ {
        self.members
            .iter()
            .filter(move |m| m.signature.name() == name)
    }

    /// Contracts this type declares it implements natively.
    pub fn contracts(&self) -> &[Arc<Contract>] {
        &self.contracts
    }

    /// Whether this type natively implements `contract` (directly or through
    /// a contract that extends it).
    pub fn implements(&self, contract: &ContractId) -> bool {
        self.contracts.iter().any(|c| c.is_or_extends(contract))
    }

    /// Whether this is a generated adapter type.
    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }
}

/// Types that can be adapted describe their members once.
pub trait Reflect: Any + Send + Sync + Sized {
    fn describe(ty: &mut TypeBuilder<Self>);
}

/// Collects the member table of `T`.
pub struct TypeBuilder<T> {
    name: Symbol,
    own: Vec<(Signature, Invoker)>,
    inherited: Vec<Member>,
    contracts: Vec<Arc<Contract>>,
    _marker: PhantomData<fn(&T)>,
}

fn receiver<T: Any>(receiver: &dyn Any) -> Result<&T, CallError> {
    receiver
        .downcast_ref::<T>()
        .ok_or_else(|| CallError::ReceiverMismatch {
            expected: std::any::type_name::<T>().to_string(),
        })
}

impl<T: Reflect> TypeBuilder<T> {
    fn new() -> Self {
        TypeBuilder {
            name: Symbol::intern(std::any::type_name::<T>()),
            own: Vec::new(),
            inherited: Vec::new(),
            contracts: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Display name of the type (defaults to the Rust type path).
    pub fn named(&mut self, name: impl Into<Symbol>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn method<F>(&mut self, signature: Signature, body: F) -> &mut Self
    where
        F: Fn(&T, &mut Invocation<'_, '_>) -> Result<Value> + Send + Sync + 'static,
    {
        let invoker = invoker(move |this, inv| body(receiver::<T>(this)?, inv));
        self.own.push((signature, invoker));
        self
    }

    /// Read-write property: `get_{name}` and `set_{name}`.
    pub fn property<G, S>(&mut self, name: &str, shape: Shape, get: G, set: S) -> &mut Self
    where
        G: Fn(&T) -> Result<Value> + Send + Sync + 'static,
        S: Fn(&T, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.getter(name, shape.clone(), get);
        self.setter(name, shape, set)
    }

    /// Write-only property: `set_{name}`.
    pub fn setter<S>(&mut self, name: &str, shape: Shape, set: S) -> &mut Self
    where
        S: Fn(&T, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.method(Signature::setter(name, shape), move |this, inv| {
            let value = inv.value(0)?.clone();
            set(this, value)?;
            Ok(Value::Unit)
        })
    }

    /// Read-only property: `get_{name}`.
    pub fn getter<G>(&mut self, name: &str, shape: Shape, get: G) -> &mut Self
    where
        G: Fn(&T) -> Result<Value> + Send + Sync + 'static,
    {
        self.method(Signature::getter(name, shape), move |this, _| get(this))
    }

    /// Event: `add_{name}` and `remove_{name}`, each taking the handler.
    pub fn event<A, R>(&mut self, name: &str, handler: Shape, add: A, remove: R) -> &mut Self
    where
        A: Fn(&T, Callback) -> Result<()> + Send + Sync + 'static,
        R: Fn(&T, Callback) -> Result<()> + Send + Sync + 'static,
    {
        self.method(Signature::adder(name, handler.clone()), move |this, inv| {
            add(this, inv.func(0)?.clone())?;
            Ok(Value::Unit)
        });
        self.method(Signature::remover(name, handler), move |this, inv| {
            remove(this, inv.func(0)?.clone())?;
            Ok(Value::Unit)
        })
    }

    /// Declare a native implementation of `contract`. Coercing to it (or to
    /// anything it extends) returns the object itself, once the declared
    /// members have been checked against the contract.
    pub fn implements(&mut self, contract: &Arc<Contract>) -> &mut Self {
        self.contracts.push(Arc::clone(contract));
        self
    }

    /// Take over the members of a base type reachable through `project`.
    /// Own members with the same structural key shadow inherited ones.
    pub fn inherit<B: Reflect>(&mut self, project: fn(&T) -> &B) -> &mut Self {
        let base = descriptor_of::<B>();

        for member in base.members() {
            let inner = Arc::clone(member.invoker());
            let invoker = invoker(move |this, inv| {
                let base: &dyn Any = project(receiver::<T>(this)?);
                inner(base, inv)
            });
            self.inherited.push(Member::new(
                member.signature().clone(),
                invoker,
                member.declared_on(),
            ));
        }
        self.contracts.extend(base.contracts().iter().cloned());
        self
    }

    fn build(self) -> TypeDescriptor {
        let own: Vec<Member> = self
            .own
            .into_iter()
            .map(|(signature, invoker)| Member::new(signature, invoker, self.name))
            .collect();

        let mut members: Vec<Member> = self
            .inherited
            .into_iter()
            .filter(|base| {
                let key = base.signature().key();
                !own.iter().any(|m| m.signature().key() == key)
            })
            .collect();
        members.extend(own);

        TypeDescriptor::assemble(self.name, members, self.contracts, false)
    }
}

/// One descriptor per Rust type, built on first use.
static TYPES: LazyLock<RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// The descriptor of `T`.
pub fn descriptor_of<T: Reflect>() -> Arc<TypeDescriptor> {
    let id = TypeId::of::<T>();

    if let Some(descriptor) = TYPES.read().get(&id) {
        return Arc::clone(descriptor);
    }

    // `describe` may ask for base descriptors, so it runs with no lock held.
    let mut builder = TypeBuilder::<T>::new();
    T::describe(&mut builder);
    let built = Arc::new(builder.build());

    let mut table = TYPES.write();
    Arc::clone(table.entry(id).or_insert(built))
}

/// Pick the single member named `name` that fits the given arguments.
pub(crate) fn select_overload<'s>(
    owner: &dyn fmt::Display,
    candidates: impl Iterator<Item = &'s Signature>,
    name: &str,
    type_args: usize,
    args: &[Arg<'_>],
) -> Result<&'s Signature, CallError> {
    let fitting: Vec<&Signature> = candidates
        .filter(|s| s.name() == name)
        .filter(|s| s.generic_arity() == type_args && s.params().len() == args.len())
        .filter(|s| {
            s.params()
                .iter()
                .zip(args)
                .all(|(p, a)| p.mode.is_by_ref() == a.is_by_ref())
        })
        .collect();

    match fitting.as_slice() {
        [single] => Ok(*single),
        [] => Err(CallError::NoSuchMember {
            contract: owner.to_string(),
            member: name.to_string(),
        }),
        many => Err(CallError::AmbiguousCall {
            contract: owner.to_string(),
            member: name.to_string(),
            candidates: many.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

/// A shared handle to a reflective object.
///
/// Cloning shares the same underlying instance; [`Object::ptr_eq`] compares
/// instance identity.
#[derive(Clone)]
pub struct Object {
    value: Arc<dyn Any + Send + Sync>,
    ty: Arc<TypeDescriptor>,
}

impl Object {
    pub fn new<T: Reflect>(value: T) -> Self {
        Object::from_arc(Arc::new(value))
    }

    /// Wrap an existing `Arc`, so the caller can keep a typed handle to the
    /// same instance.
    pub fn from_arc<T: Reflect>(value: Arc<T>) -> Self {
        Object {
            value,
            ty: descriptor_of::<T>(),
        }
    }

    pub(crate) fn from_parts(value: Arc<dyn Any + Send + Sync>, ty: Arc<TypeDescriptor>) -> Self {
        Object { value, ty }
    }

    pub fn type_descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    pub fn type_key(&self) -> TypeKey {
        self.ty.key()
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.value
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Same underlying instance.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::as_ptr(&self.value) as *const () == Arc::as_ptr(&other.value) as *const ()
    }

    /// Run the member with exactly this structural signature.
    pub fn dispatch(&self, signature: &Signature, invocation: &mut Invocation<'_, '_>) -> Result<Value> {
        let member = self
            .ty
            .member(&signature.key())
            .ok_or_else(|| CallError::Unbound {
                type_name: self.ty.name().to_string(),
                member: signature.to_string(),
            })?;
        member.call(self.as_any(), invocation)
    }

    /// Call a member of this object's own type by name.
    pub fn call(&self, name: &str, args: &mut [Arg<'_>]) -> Result<Value> {
        self.call_generic(name, &[], args)
    }

    pub fn call_generic(&self, name: &str, type_args: &[Shape], args: &mut [Arg<'_>]) -> Result<Value> {
        let signature = select_overload(
            &self.ty.name(),
            self.ty.members().iter().map(Member::signature),
            name,
            type_args.len(),
            args,
        )?
        .clone();
        self.dispatch(&signature, &mut Invocation::new(type_args, args))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.ty.name(), Arc::as_ptr(&self.value) as *const ())
    }
}
