//! Attribute storage across wrapping, subclassing, and promotion.

use heir_core::{
    Callable, CtorArgs, Engine, Error, Payload, StorageKind, TypeBuilder, TypeHandle,
    CTOR_ARGS_SLOT, CTOR_NAMED_SLOT,
};

fn counter_base(engine: &Engine) -> TypeHandle {
    TypeBuilder::new("Counter")
        .method(
            "bump",
            Callable::new(|cx, recv, _args| {
                let n = recv.payload().as_int().unwrap_or(0);
                Ok(cx.alloc(Payload::Int(n + 1)))
            }),
        )
        .register(engine)
}

#[test]
fn test_dynamic_storage_accepts_any_attribute() {
    let engine = Engine::new();
    let b = counter_base(&engine);
    let obj = b.instance(Payload::Int(0));

    obj.set_attr("anything", obj.clone()).unwrap();
    assert!(obj.get_attr("anything").is_ok());
    assert!(matches!(
        obj.get_attr("other"),
        Err(Error::UnknownAttribute { .. })
    ));
}

#[test]
fn test_fixed_storage_rejects_undeclared_attributes() {
    let engine = Engine::new();
    let b = TypeBuilder::new("Point")
        .storage(StorageKind::Fixed(vec!["x".into(), "y".into()]))
        .register(&engine);
    let obj = b.instance(Payload::Null);
    let one = b.instance(Payload::Int(1));

    obj.set_attr("x", one.clone()).unwrap();
    let err = obj.set_attr("z", one).unwrap_err();
    assert!(matches!(err, Error::RestrictedAttribute { .. }));
    assert_eq!(
        err.to_string(),
        "`Point` does not allow attribute `z`"
    );
}

#[test]
fn test_reserved_slots_are_never_user_visible() {
    let engine = Engine::new();
    let b = counter_base(&engine);
    let obj = b.instance(Payload::Int(0));

    for slot in [CTOR_ARGS_SLOT, CTOR_NAMED_SLOT] {
        assert!(matches!(
            obj.get_attr(slot),
            Err(Error::RestrictedAttribute { .. })
        ));
        assert!(matches!(
            obj.set_attr(slot, obj.clone()),
            Err(Error::RestrictedAttribute { .. })
        ));
    }
}

#[test]
fn test_wrapper_inherits_base_storage() {
    let engine = Engine::new();
    let b = TypeBuilder::new("Point")
        .storage(StorageKind::Fixed(vec!["x".into()]))
        .register(&engine);
    let w = engine.wrap(b.id()).unwrap();
    assert_eq!(w.storage(), b.storage());
}

#[test]
fn test_subclass_slots_extend_fixed_parent() {
    let engine = Engine::new();
    let b = TypeBuilder::new("Point")
        .storage(StorageKind::Fixed(vec!["x".into()]))
        .register(&engine);
    let w = engine.wrap(b.id()).unwrap();
    let sub = w
        .subclass("Point3")
        .slots(["z"])
        .build(&engine)
        .unwrap();

    assert_eq!(
        sub.storage(),
        &StorageKind::Fixed(vec!["x".into(), "z".into()])
    );
}

#[test]
fn test_subclass_without_slots_opens_fixed_parent() {
    let engine = Engine::new();
    let b = TypeBuilder::new("Point")
        .storage(StorageKind::Fixed(vec!["x".into()]))
        .register(&engine);
    let w = engine.wrap(b.id()).unwrap();
    let sub = w.subclass("Tagged").build(&engine).unwrap();

    // No declaration means the subclass grows a side table while the
    // declared names stay reachable.
    assert_eq!(sub.storage(), &StorageKind::Mixed(vec!["x".into()]));

    let obj = sub
        .construct(&engine, &b.instance(Payload::Null), CtorArgs::new())
        .unwrap();
    obj.set_attr("x", b.instance(Payload::Int(1))).unwrap();
    obj.set_attr("free", b.instance(Payload::Int(2))).unwrap();
}

#[test]
fn test_dynamic_parent_with_slots_goes_mixed() {
    let engine = Engine::new();
    let b = counter_base(&engine);
    let w = engine.wrap(b.id()).unwrap();
    let sub = w
        .subclass("Slotted")
        .slots(["tag"])
        .build(&engine)
        .unwrap();
    assert_eq!(sub.storage(), &StorageKind::Mixed(vec!["tag".into()]));
}

#[test]
fn test_promotion_projects_only_declared_fixed_slots() {
    let engine = Engine::new();
    let b = TypeBuilder::new("Vec1")
        .storage(StorageKind::Fixed(vec!["label".into()]))
        .method(
            "bump",
            Callable::new(|cx, recv, _args| {
                let n = recv.payload().as_int().unwrap_or(0);
                Ok(cx.alloc(Payload::Int(n + 1)))
            }),
        )
        .register(&engine);
    let w = engine.wrap(b.id()).unwrap();

    let obj = w
        .construct(&engine, &b.instance(Payload::Int(0)), CtorArgs::new())
        .unwrap();
    // "label" stays unset; promotion must skip it rather than invent it.
    let bumped = engine.call_method(&obj, "bump", &[]).unwrap();
    assert_eq!(bumped.type_id(), w.id());
    assert!(matches!(
        bumped.get_attr("label"),
        Err(Error::UnknownAttribute { .. })
    ));

    obj.set_attr("label", b.instance(Payload::Int(9))).unwrap();
    let bumped = engine.call_method(&obj, "bump", &[]).unwrap();
    assert_eq!(
        bumped.get_attr("label").unwrap().payload().as_int(),
        Some(9)
    );
}

#[test]
fn test_promotion_carries_mixed_overflow_attributes() {
    let engine = Engine::new();
    let b = counter_base(&engine);
    let w = engine.wrap(b.id()).unwrap();
    let sub = w
        .subclass("Slotted")
        .slots(["tag"])
        .build(&engine)
        .unwrap();

    let obj = sub
        .construct(&engine, &b.instance(Payload::Int(0)), CtorArgs::new())
        .unwrap();
    obj.set_attr("tag", b.instance(Payload::Int(1))).unwrap();
    obj.set_attr("extra", b.instance(Payload::Int(2))).unwrap();

    let bumped = engine.call_method(&obj, "bump", &[]).unwrap();
    assert_eq!(bumped.type_id(), sub.id());
    assert_eq!(bumped.get_attr("tag").unwrap().payload().as_int(), Some(1));
    assert_eq!(
        bumped.get_attr("extra").unwrap().payload().as_int(),
        Some(2)
    );
}

#[test]
fn test_construction_context_is_readable_and_frozen() {
    let engine = Engine::new();
    let b = counter_base(&engine);
    let w = engine.wrap(b.id()).unwrap();

    let extra = b.instance(Payload::Int(42));
    let ctx = CtorArgs::new()
        .arg(extra.clone())
        .named("origin", b.instance(Payload::Int(7)));
    let obj = w
        .construct(&engine, &b.instance(Payload::Int(0)), ctx)
        .unwrap();

    let recorded = obj.ctor_args().unwrap();
    assert_eq!(recorded.args().len(), 1);
    assert!(recorded.args()[0].ptr_eq(&extra));
    assert_eq!(
        recorded.get_named("origin").unwrap().payload().as_int(),
        Some(7)
    );

    // A promoted descendant replays the same frozen record.
    let bumped = engine.call_method(&obj, "bump", &[]).unwrap();
    let replayed = bumped.ctor_args().unwrap();
    assert!(replayed.args()[0].ptr_eq(&extra));
}
