//! Synthesis entry points.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

use crate::core::contract::Contract;
use crate::core::object::{Object, TypeDescriptor};
use crate::synth::cache::{AdapterCache, AdapterKey};
use crate::synth::contracted::Contracted;
use crate::synth::errors::SynthesisError;
use crate::synth::generator::{AdapterGenerator, AdapterState, AdapterType};
use crate::util::config::SynthesisConfig;

static GLOBAL: LazyLock<Synthesizer> = LazyLock::new(Synthesizer::new);

/// Owns an adapter cache and hands out adapter instances.
#[derive(Debug, Default)]
pub struct Synthesizer {
    cache: AdapterCache,
    config: SynthesisConfig,
    generations: AtomicU64,
    /// Native implementations already checked against their contract.
    verified: Mutex<HashSet<AdapterKey>>,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SynthesisConfig) -> Self {
        Synthesizer {
            config,
            ..Self::default()
        }
    }

    /// The process-wide synthesizer, with default configuration.
    pub fn global() -> &'static Synthesizer {
        &GLOBAL
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn cache(&self) -> &AdapterCache {
        &self.cache
    }

    /// How many times the generator has run.
    pub fn generations(&self) -> u64 {
        self.generations.load(Ordering::Relaxed)
    }

    /// The adapter type for (`contract`, `source`), generated on first request.
    pub fn adapter_for(
        &self,
        contract: &Arc<Contract>,
        source: &Arc<TypeDescriptor>,
    ) -> Result<Arc<AdapterType>, SynthesisError> {
        if contract.is_open() {
            return Err(SynthesisError::OpenContract {
                contract: contract.display_name(),
            });
        }

        let key = AdapterKey {
            contract: contract.id().clone(),
            source: source.key(),
        };

        self.cache.get_or_generate(&key, || {
            self.generations.fetch_add(1, Ordering::Relaxed);
            AdapterGenerator::new(&self.config).generate(contract, source)
        })
    }

    /// Check that `source`, which declares `contract` natively, really has a
    /// member for every requirement. Each pair is checked once.
    pub fn verify_native(
        &self,
        contract: &Arc<Contract>,
        source: &Arc<TypeDescriptor>,
    ) -> Result<(), SynthesisError> {
        let key = AdapterKey {
            contract: contract.id().clone(),
            source: source.key(),
        };
        if self.verified.lock().contains(&key) {
            return Ok(());
        }

        let requirements = contract.flattened();
        AdapterGenerator::new(&self.config).resolve_all(contract, source, &requirements)?;

        tracing::debug!(
            contract = %contract.display_name(),
            source = %source.name(),
            "verified native implementation"
        );
        self.verified.lock().insert(key);
        Ok(())
    }

    /// Wrap `instance` in a new adapter instance typed as `contract`.
    ///
    /// Always goes through an adapter; returning natively implementing
    /// objects as they are is [`crate::ops::coerce`]'s job.
    pub fn wrap(&self, contract: &Arc<Contract>, instance: &Object) -> Result<Contracted, SynthesisError> {
        let adapter = self.adapter_for(contract, instance.type_descriptor())?;
        let wrapped = adapter.instantiate(instance.clone());

        Ok(Contracted::new(Arc::clone(contract), wrapped))
    }

    /// The real object behind an adapter instance, or `None` when `value`
    /// is not one.
    pub fn unwrap(value: &Object) -> Option<Object> {
        value
            .downcast_ref::<AdapterState>()
            .map(|state| state.real().clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::core::contract::{ContractBuilder, PropertyAccess};
    use crate::core::invocation::{Arg, CallError};
    use crate::core::object::{descriptor_of, Reflect, TypeBuilder};
    use crate::core::shape::Shape;
    use crate::core::signature::Signature;
    use crate::core::value::{Callback, Value};
    use crate::test_support::*;

    struct Greeter;

    impl Reflect for Greeter {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.named("Greeter").method(
                Signature::method("Greet").param(Shape::string()).returns(Shape::string()),
                |_, inv| Ok(format!("hello {}", inv.str(0)?).into()),
            );
        }
    }

    fn greeting() -> Arc<Contract> {
        ContractBuilder::new("IGreeting")
            .method(Signature::method("Greet").param(Shape::string()).returns(Shape::string()))
            .build()
    }

    #[test]
    fn test_wrap_reuses_adapter_type() {
        let synth = Synthesizer::new();
        let contract = greeting();
        let real = Object::new(Greeter);

        let a = synth.wrap(&contract, &real).unwrap();
        let b = synth.wrap(&contract, &real).unwrap();

        assert_eq!(synth.generations(), 1);
        assert!(!a.object().ptr_eq(b.object()));
        assert!(Arc::ptr_eq(a.object().type_descriptor(), b.object().type_descriptor()));
        assert_eq!(
            a.call("Greet", &mut [Arg::val("duck")]).unwrap(),
            Value::from("hello duck")
        );
    }

    #[test]
    fn test_unwrap() {
        let synth = Synthesizer::new();
        let real = Object::new(Greeter);
        let wrapped = synth.wrap(&greeting(), &real).unwrap();

        assert!(Synthesizer::unwrap(wrapped.object()).unwrap().ptr_eq(&real));
        assert!(Synthesizer::unwrap(&real).is_none());
    }

    #[test]
    fn test_failures_run_generator_again() {
        let synth = Synthesizer::new();
        let contract = ContractBuilder::new("IFarewell")
            .method(Signature::method("Bye"))
            .build();
        let real = Object::new(Greeter);

        assert!(synth.wrap(&contract, &real).is_err());
        assert!(synth.wrap(&contract, &real).is_err());
        assert_eq!(synth.generations(), 2);
        assert!(synth.cache().is_empty());
    }

    #[test]
    fn test_config_reaches_generator() {
        let synth = Synthesizer::with_config(SynthesisConfig {
            adapter_suffix: "Proxy".to_string(),
            ..SynthesisConfig::default()
        });
        let real = Object::new(Greeter);
        let adapter = synth
            .adapter_for(&greeting(), real.type_descriptor())
            .unwrap();

        assert_eq!(adapter.name(), "IGreeting_Greeter_Proxy");
    }

    fn tester() -> (Arc<MyTester>, Object) {
        let real = Arc::new(MyTester::default());
        let object = Object::from_arc(Arc::clone(&real));
        (real, object)
    }

    #[test]
    fn test_calls_forward_to_real_object() {
        init_tracing();
        let (_, real) = tester();
        let wrapped = Synthesizer::new().wrap(&tester_contract(), &real).unwrap();

        assert_eq!(
            wrapped.call("Repsond", &mut [Arg::val("Foo")]).unwrap(),
            Value::from("Foo response")
        );
        assert_eq!(wrapped.call("Return5", &mut []).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_two_contracts_on_one_instance() {
        let synth = Synthesizer::new();
        let (_, real) = tester();

        let first = synth.wrap(&tester_contract(), &real).unwrap();
        let second = synth.wrap(&tester2_contract(), &real).unwrap();

        assert_eq!(
            first.call("Repsond", &mut [Arg::val("Foo")]).unwrap(),
            second.call("Repsond", &mut [Arg::val("Foo")]).unwrap()
        );
        assert_eq!(synth.generations(), 2);
        assert_eq!(synth.cache().len(), 2);
        assert!(second.call("Return5", &mut []).is_err());
    }

    #[test]
    fn test_ref_and_out_parameters() {
        let (_, real) = tester();
        let wrapped = Synthesizer::new().wrap(&tester_contract(), &real).unwrap();

        let mut foo = Value::Int(5);
        wrapped
            .call("Add6ToParam", &mut [Arg::by_ref(&mut foo)])
            .unwrap();
        assert_eq!(foo, Value::Int(11));

        let mut out = Value::Unit;
        wrapped
            .call("SetOutParamTo7", &mut [Arg::by_ref(&mut out)])
            .unwrap();
        assert_eq!(out, Value::Int(7));
    }

    #[test]
    fn test_member_errors_propagate_unchanged() {
        let (_, real) = tester();
        let wrapped = Synthesizer::new().wrap(&tester_contract(), &real).unwrap();

        let through_adapter = wrapped.call("VoidMethod", &mut []).unwrap_err();
        let direct = real.call("VoidMethod", &mut []).unwrap_err();

        assert_eq!(through_adapter.to_string(), "VoidMethod");
        assert_eq!(through_adapter.to_string(), direct.to_string());
        assert!(through_adapter.downcast_ref::<CallError>().is_none());
    }

    #[test]
    fn test_properties_share_real_state() {
        let (tester, real) = tester();
        let wrapped = Synthesizer::new().wrap(&tester_contract(), &real).unwrap();

        wrapped.set("Property", 55i64).unwrap();
        assert_eq!(*tester.property.lock(), 55);

        *tester.property.lock() = 66;
        assert_eq!(wrapped.get("Property").unwrap(), Value::Int(66));
    }

    #[test]
    fn test_generic_members() {
        let (_, real) = tester();
        let wrapped = Synthesizer::new()
            .wrap(&generic_tester_contract(), &real)
            .unwrap();

        let is_type_of = wrapped
            .call_generic("IsTypeOf", &[Shape::string()], &mut [])
            .unwrap();
        assert_eq!(is_type_of, Value::Bool(false));

        let same = wrapped
            .call_generic("TypesAreSame", &[Shape::string(), Shape::string()], &mut [])
            .unwrap();
        assert_eq!(same, Value::Bool(true));

        assert_eq!(
            wrapped
                .call_generic("GenericReturn", &[Shape::int()], &mut [])
                .unwrap(),
            Value::Int(0)
        );
        assert_eq!(
            wrapped
                .call_generic("GenericReturn", &[Shape::timestamp()], &mut [])
                .unwrap(),
            Value::Timestamp(DateTime::<Utc>::MIN_UTC)
        );

        assert_eq!(
            wrapped
                .call_generic("GenericParameter", &[Shape::string()], &mut [Arg::val("FOO")])
                .unwrap(),
            Value::from("FOO")
        );

        let compare = |a: &str, b: &str| {
            wrapped
                .call_generic(
                    "GenericCompare",
                    &[Shape::string(), Shape::string()],
                    &mut [Arg::val(a), Arg::val(b)],
                )
                .unwrap()
        };
        assert_eq!(compare("FOO", "FOO"), Value::Bool(true));
        assert_eq!(compare("FOO", "BAR"), Value::Bool(false));
    }

    #[test]
    fn test_generic_member_with_callback() {
        let (_, real) = tester();
        let wrapped = Synthesizer::new()
            .wrap(&generic_tester_contract(), &real)
            .unwrap();

        let to_text = Callback::new(|args| {
            let i = args.first().and_then(Value::as_int).unwrap_or_default();
            Ok(Value::from(i.to_string()))
        });
        let values = wrapped
            .call_generic("Return3", &[Shape::string()], &mut [Arg::val(to_text)])
            .unwrap();

        assert_eq!(
            values,
            Value::List(vec!["0".into(), "1".into(), "2".into()])
        );
    }

    #[test]
    fn test_events_reach_real_object() {
        let (tester, real) = tester();
        let wrapped = Synthesizer::new().wrap(&tester_contract(), &real).unwrap();

        let seen: Arc<parking_lot::Mutex<Option<(Object, String)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let handler = Callback::new(move |args| {
            let sender = args.first().and_then(Value::as_object).cloned();
            let message = args.get(1).and_then(Value::as_str).map(str::to_string);
            if let (Some(sender), Some(message)) = (sender, message) {
                *sink.lock() = Some((sender, message));
            }
            Ok(Value::Unit)
        });

        wrapped.subscribe("MyEvent", &handler).unwrap();
        MyTester::fire_event(&tester, "FOO").unwrap();

        let (sender, message) = seen.lock().clone().unwrap();
        assert!(sender.ptr_eq(&real));
        assert_eq!(message, "FOO");

        wrapped.unsubscribe("MyEvent", &handler).unwrap();
        assert_eq!(tester.handler_count(), 0);
    }

    #[test]
    fn test_derived_contract() {
        let real = Object::new(MultiIf::default());
        let wrapped = Synthesizer::new().wrap(&derived_contract(), &real).unwrap();

        assert_eq!(wrapped.call("Foo", &mut []).unwrap(), Value::from("Bar"));
        wrapped.call("Dispose", &mut []).unwrap();
        assert_eq!(wrapped.call("Foo", &mut []).unwrap(), Value::from("Disposed"));
        assert!(wrapped
            .object()
            .type_descriptor()
            .implements(disposable_contract().id()));
    }

    #[test]
    fn test_bad_mapping_fails_before_any_call() {
        let synth = Synthesizer::new();
        let (_, real) = tester();

        let err = synth.wrap(&not_wrappable_contract(), &real).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::MissingMember {
                member: "NotWrappable() -> ()".to_string(),
                contract: "INotWrappable".to_string(),
                source_type: "MyTester".to_string(),
            }
        );
        assert!(synth.cache().is_empty());
    }

    struct Dial {
        level: Mutex<i64>,
    }

    impl Reflect for Dial {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.named("Dial").method(
                Signature::method("Bump").param(Shape::int()).returns(Shape::int()),
                |this, inv| {
                    let mut level = this.level.lock();
                    *level += inv.int(0)?;
                    Ok(Value::Int(*level))
                },
            );
        }
    }

    struct LabelledDial {
        dial: Dial,
        label: String,
    }

    impl Reflect for LabelledDial {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.named("LabelledDial")
                .inherit::<Dial>(|this| &this.dial)
                .getter("Label", Shape::string(), |this| Ok(this.label.clone().into()));
        }
    }

    #[test]
    fn test_inherited_member_satisfies_contract() {
        let synth = Synthesizer::new();
        let contract = ContractBuilder::new("IBumpable")
            .method(Signature::method("Bump").param(Shape::int()).returns(Shape::int()))
            .property("Label", Shape::string(), PropertyAccess::Read)
            .build();
        let real = Arc::new(LabelledDial {
            dial: Dial {
                level: Mutex::new(2),
            },
            label: "volume".to_string(),
        });

        let wrapped = synth
            .wrap(&contract, &Object::from_arc(Arc::clone(&real)))
            .unwrap();

        assert_eq!(
            wrapped.call("Bump", &mut [Arg::val(40i64)]).unwrap(),
            Value::Int(42)
        );
        assert_eq!(*real.dial.level.lock(), 42);
        assert_eq!(wrapped.get("Label").unwrap(), Value::from("volume"));

        let adapter = synth
            .adapter_for(&contract, &descriptor_of::<LabelledDial>())
            .unwrap();
        assert_eq!(adapter.bindings()[0].declared_on, "Dial");
        assert_eq!(adapter.bindings()[1].declared_on, "LabelledDial");
    }

    struct Parser;

    impl Reflect for Parser {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.named("Parser")
                .method(
                    Signature::method("Parse").param(Shape::string()).returns(Shape::int()),
                    |_, inv| Ok(Value::Int(inv.str(0)?.len() as i64)),
                )
                .method(
                    Signature::method("Parse").param(Shape::string()).returns(Shape::bool()),
                    |_, inv| Ok(Value::Bool(!inv.str(0)?.is_empty())),
                );
        }
    }

    fn parsing() -> Arc<Contract> {
        ContractBuilder::new("IParse")
            .method(Signature::method("Parse").param(Shape::string()).returns(Shape::int()))
            .build()
    }

    #[test]
    fn test_ambiguous_member_is_not_cached() {
        let synth = Synthesizer::new();
        let contract = parsing();
        let real = Object::new(Parser);

        for _ in 0..2 {
            let err = synth.wrap(&contract, &real).unwrap_err();
            assert!(matches!(
                err,
                SynthesisError::AmbiguousMember { ref candidates, .. } if candidates.len() == 2
            ));
        }
        assert_eq!(synth.generations(), 2);
        assert!(synth.cache().is_empty());

        let strict = Synthesizer::with_config(SynthesisConfig {
            strict_returns: true,
            ..SynthesisConfig::default()
        });
        let wrapped = strict.wrap(&contract, &real).unwrap();
        assert_eq!(
            wrapped.call("Parse", &mut [Arg::val("duck")]).unwrap(),
            Value::Int(4)
        );
        assert_eq!(strict.cache().len(), 1);
    }
}
