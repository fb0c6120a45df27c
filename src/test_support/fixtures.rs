//! Source types and contracts shared by unit tests.

use std::sync::{Arc, LazyLock};

use anyhow::anyhow;
use parking_lot::Mutex;

use crate::core::contract::{Contract, ContractBuilder, PropertyAccess};
use crate::core::object::{Object, Reflect, TypeBuilder};
use crate::core::shape::Shape;
use crate::core::signature::Signature;
use crate::core::value::{Callback, Value};

/// Shape of `MyEvent` handlers: `(sender, message)`.
pub fn handler_shape() -> Shape {
    Shape::func(vec![Shape::named("object"), Shape::string()], Shape::Unit)
}

static ITESTER: LazyLock<Arc<Contract>> = LazyLock::new(|| {
    ContractBuilder::new("ITester")
        .method(
            Signature::method("Repsond")
                .param(Shape::string())
                .returns(Shape::string()),
        )
        .method(Signature::method("Return5").returns(Shape::int()))
        .method(Signature::method("VoidMethod"))
        .method(Signature::method("Add6ToParam").by_ref(Shape::int()))
        .method(Signature::method("SetOutParamTo7").out(Shape::int()))
        .property("Property", Shape::int(), PropertyAccess::ReadWrite)
        .event("MyEvent", handler_shape())
        .build()
});

static ITESTER2: LazyLock<Arc<Contract>> = LazyLock::new(|| {
    ContractBuilder::new("ITester2")
        .method(
            Signature::method("Repsond")
                .param(Shape::string())
                .returns(Shape::string()),
        )
        .build()
});

static IGENERIC_TESTER: LazyLock<Arc<Contract>> = LazyLock::new(|| {
    ContractBuilder::new("IGenericTester")
        .method(
            Signature::method("IsTypeOf")
                .generic(&["T"])
                .returns(Shape::bool()),
        )
        .method(
            Signature::method("TypesAreSame")
                .generic(&["TOneT", "TWoT"])
                .returns(Shape::bool()),
        )
        .method(
            Signature::method("GenericReturn")
                .generic(&["T"])
                .returns(Shape::method_param(0)),
        )
        .method(
            Signature::method("GenericParameter")
                .generic(&["T"])
                .param(Shape::method_param(0))
                .returns(Shape::method_param(0)),
        )
        .method(
            Signature::method("GenericCompare")
                .generic(&["TOneT", "TWoT"])
                .param(Shape::method_param(0))
                .param(Shape::method_param(1))
                .returns(Shape::bool()),
        )
        .method(
            Signature::method("Return3")
                .generic(&["T"])
                .param(Shape::func(vec![Shape::int()], Shape::method_param(0)))
                .returns(Shape::list(Shape::method_param(0))),
        )
        .build()
});

static INOT_WRAPPABLE: LazyLock<Arc<Contract>> = LazyLock::new(|| {
    ContractBuilder::new("INotWrappable")
        .method(Signature::method("NotWrappable"))
        .build()
});

static IDISPOSABLE: LazyLock<Arc<Contract>> = LazyLock::new(|| {
    ContractBuilder::new("IDisposable")
        .method(Signature::method("Dispose"))
        .build()
});

static IDERIVED: LazyLock<Arc<Contract>> = LazyLock::new(|| {
    ContractBuilder::new("IDerived")
        .extends(&IDISPOSABLE)
        .method(Signature::method("Foo").returns(Shape::string()))
        .build()
});

pub fn tester_contract() -> Arc<Contract> {
    Arc::clone(&ITESTER)
}

pub fn tester2_contract() -> Arc<Contract> {
    Arc::clone(&ITESTER2)
}

pub fn generic_tester_contract() -> Arc<Contract> {
    Arc::clone(&IGENERIC_TESTER)
}

pub fn not_wrappable_contract() -> Arc<Contract> {
    Arc::clone(&INOT_WRAPPABLE)
}

pub fn disposable_contract() -> Arc<Contract> {
    Arc::clone(&IDISPOSABLE)
}

pub fn derived_contract() -> Arc<Contract> {
    Arc::clone(&IDERIVED)
}

/// Satisfies `ITester`, `ITester2` and `IGenericTester` without declaring any.
#[derive(Default)]
pub struct MyTester {
    pub property: Mutex<i64>,
    handlers: Mutex<Vec<Callback>>,
}

impl MyTester {
    /// Raise `MyEvent` with this tester as sender.
    pub fn fire_event(this: &Arc<MyTester>, message: &str) -> anyhow::Result<()> {
        let sender = Object::from_arc(Arc::clone(this));
        let handlers = this.handlers.lock().clone();
        for handler in handlers {
            handler.call(&[Value::Object(sender.clone()), Value::from(message)])?;
        }
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

impl Reflect for MyTester {
    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.named("MyTester")
            .method(
                Signature::method("Repsond")
                    .param(Shape::string())
                    .returns(Shape::string()),
                |_, inv| Ok(format!("{} response", inv.str(0)?).into()),
            )
            .method(Signature::method("Return5").returns(Shape::int()), |_, _| {
                Ok(Value::Int(5))
            })
            .method(Signature::method("VoidMethod"), |_, _| {
                Err(anyhow!("VoidMethod"))
            })
            .method(
                Signature::method("Add6ToParam").by_ref(Shape::int()),
                |_, inv| {
                    let param = inv.int(0)?;
                    *inv.slot(0)? = Value::Int(param + 6);
                    Ok(Value::Unit)
                },
            )
            .method(
                Signature::method("SetOutParamTo7").out(Shape::int()),
                |_, inv| {
                    *inv.slot(0)? = Value::Int(7);
                    Ok(Value::Unit)
                },
            )
            .property(
                "Property",
                Shape::int(),
                |this| Ok(Value::Int(*this.property.lock())),
                |this, value| {
                    let n = value
                        .as_int()
                        .ok_or_else(|| anyhow!("expected int, found {}", value.kind()))?;
                    *this.property.lock() = n;
                    Ok(())
                },
            )
            .event(
                "MyEvent",
                handler_shape(),
                |this, handler| {
                    this.handlers.lock().push(handler);
                    Ok(())
                },
                |this, handler| {
                    this.handlers.lock().retain(|h| !h.ptr_eq(&handler));
                    Ok(())
                },
            )
            .method(
                Signature::method("IsTypeOf").generic(&["T"]).returns(Shape::bool()),
                |_, inv| Ok(Value::Bool(*inv.type_arg(0)? == Shape::named("MyTester"))),
            )
            .method(
                Signature::method("TypesAreSame")
                    .generic(&["TOneT", "TWoT"])
                    .returns(Shape::bool()),
                |_, inv| Ok(Value::Bool(inv.type_arg(0)? == inv.type_arg(1)?)),
            )
            .method(
                Signature::method("GenericReturn")
                    .generic(&["T"])
                    .returns(Shape::method_param(0)),
                |_, inv| {
                    let shape = inv.type_arg(0)?;
                    Value::default_of(shape)
                        .ok_or_else(|| anyhow!("`{}` has no default value", shape))
                },
            )
            .method(
                Signature::method("GenericParameter")
                    .generic(&["T"])
                    .param(Shape::method_param(0))
                    .returns(Shape::method_param(0)),
                |_, inv| Ok(inv.value(0)?.clone()),
            )
            .method(
                Signature::method("GenericCompare")
                    .generic(&["TOneT", "TWoT"])
                    .param(Shape::method_param(0))
                    .param(Shape::method_param(1))
                    .returns(Shape::bool()),
                |_, inv| Ok(Value::Bool(inv.value(0)? == inv.value(1)?)),
            )
            .method(
                Signature::method("Return3")
                    .generic(&["T"])
                    .param(Shape::func(vec![Shape::int()], Shape::method_param(0)))
                    .returns(Shape::list(Shape::method_param(0))),
                |_, inv| {
                    let generate = inv.func(0)?;
                    let items = (0..3)
                        .map(|i| generate.call(&[Value::Int(i)]))
                        .collect::<anyhow::Result<Vec<_>>>()?;
                    Ok(Value::List(items))
                },
            );
    }
}

/// Satisfies `IDerived` (and so `IDisposable`) structurally.
pub struct MultiIf {
    message: Mutex<String>,
}

impl Default for MultiIf {
    fn default() -> Self {
        MultiIf {
            message: Mutex::new("Bar".to_string()),
        }
    }
}

impl Reflect for MultiIf {
    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.named("MultiIf")
            .method(Signature::method("Dispose"), |this, _| {
                *this.message.lock() = "Disposed".to_string();
                Ok(Value::Unit)
            })
            .method(Signature::method("Foo").returns(Shape::string()), |this, _| {
                Ok(this.message.lock().clone().into())
            });
    }
}
