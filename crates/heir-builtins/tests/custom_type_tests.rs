//! User-defined bases and records flow through the same machinery as the
//! stock types.

use heir_builtins::{install, Builtins};
use heir_core::{Callable, CtorArgs, Engine, Payload, TypeBuilder, TypeHandle};

fn setup() -> (Engine, Builtins) {
    let engine = Engine::new();
    let builtins = install(&engine);
    (engine, builtins)
}

fn counter(engine: &Engine) -> TypeHandle {
    TypeBuilder::new("Counter")
        .custom_alloc(|_cx, value| Ok(value.payload().clone()))
        .method(
            "incr",
            Callable::new(|cx, recv, _args| {
                let n = recv.payload().as_int().unwrap();
                Ok(cx.alloc(Payload::Int(n + 1)))
            }),
        )
        .register(engine)
}

#[test]
fn test_user_base_wraps_like_a_builtin() {
    let (engine, _builtins) = setup();
    let base = counter(&engine);
    let wrapped = engine.wrap(base.id()).unwrap();

    let c = wrapped
        .construct(&engine, &base.instance(Payload::Int(0)), CtorArgs::new())
        .unwrap();
    let next = engine.call_method(&c, "incr", &[]).unwrap();
    assert_eq!(next.type_id(), wrapped.id());
    assert_eq!(next.payload().as_int(), Some(1));
}

#[test]
fn test_shadowing_declared_method_still_promotes() {
    let (engine, _builtins) = setup();
    let base = counter(&engine);
    let wrapped = engine.wrap(base.id()).unwrap();
    let double = wrapped
        .subclass("DoubleCounter")
        .method(
            "incr",
            Callable::new(|cx, recv, _args| {
                let n = recv.payload().as_int().unwrap();
                Ok(cx.alloc(Payload::Int(n + 2)))
            }),
        )
        .build(&engine)
        .unwrap();

    let c = double
        .construct(&engine, &base.instance(Payload::Int(0)), CtorArgs::new())
        .unwrap();
    let next = engine.call_method(&c, "incr", &[]).unwrap();
    assert_eq!(next.type_id(), double.id());
    assert_eq!(next.payload().as_int(), Some(2));
}

#[test]
fn test_novel_declared_method_owns_its_type() {
    let (engine, _builtins) = setup();
    let base = counter(&engine);
    let wrapped = engine.wrap(base.id()).unwrap();
    let stamped = wrapped
        .subclass("Stamped")
        .method(
            "zeroed",
            Callable::new(|cx, _recv, _args| Ok(cx.alloc(Payload::Int(0)))),
        )
        .build(&engine)
        .unwrap();

    let c = stamped
        .construct(&engine, &base.instance(Payload::Int(9)), CtorArgs::new())
        .unwrap();
    // "zeroed" shadows nothing, so it runs as declared and allocates at
    // its own level without any promotion step.
    let z = engine.call_method(&c, "zeroed", &[]).unwrap();
    assert_eq!(z.type_id(), stamped.id());
    assert_eq!(z.payload().as_int(), Some(0));
}

#[test]
fn test_record_subclass_copy_promotes_with_attributes() {
    let (engine, builtins) = setup();
    let wrapped = engine.wrap(builtins.record.id()).unwrap();
    let manager = wrapped
        .subclass("Manager")
        .init(|_cx, obj, extra| {
            if let Some(name) = extra.get_named("name") {
                obj.set_attr("name", name.clone())?;
            }
            Ok(())
        })
        .build(&engine)
        .unwrap();

    let ctx = CtorArgs::new().named("name", builtins.str_of("sam"));
    let m = manager
        .construct(&engine, &builtins.record_obj(), ctx)
        .unwrap();
    m.set_attr("team", builtins.str_of("infra")).unwrap();

    let copy = engine.call_method(&m, "copy", &[]).unwrap();
    assert_eq!(copy.type_id(), manager.id());
    assert_eq!(
        copy.get_attr("name").unwrap().payload().as_str(),
        Some("sam")
    );
    assert_eq!(
        copy.get_attr("team").unwrap().payload().as_str(),
        Some("infra")
    );
    assert!(!copy.ptr_eq(&m));
}

#[test]
fn test_wrapping_record_adopts_value_state() {
    let (engine, builtins) = setup();
    let wrapped = engine.wrap(builtins.record.id()).unwrap();

    let seed = builtins.record_obj();
    seed.set_attr("kind", builtins.str_of("seed")).unwrap();

    let r = wrapped.construct(&engine, &seed, CtorArgs::new()).unwrap();
    assert_eq!(r.type_id(), wrapped.id());
    assert_eq!(
        r.get_attr("kind").unwrap().payload().as_str(),
        Some("seed")
    );
    assert!(!r.ptr_eq(&seed));
}
