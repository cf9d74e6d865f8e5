//! Wrapper-cache contract: memoization, weakness, eviction.

use std::sync::{Arc, Barrier};

use heir_core::{Callable, CtorArgs, Engine, Error, Payload, TypeBuilder, TypeHandle, TypeId};

fn base(engine: &Engine, name: &str) -> TypeHandle {
    TypeBuilder::new(name)
        .method(
            "next",
            Callable::new(|cx, recv, _args| {
                let n = recv.payload().as_int().unwrap_or(0);
                Ok(cx.alloc(Payload::Int(n + 1)))
            }),
        )
        .register(engine)
}

#[test]
fn test_wrap_twice_is_identical() {
    let engine = Engine::new();
    let b = base(&engine, "B");

    let first = engine.wrap(b.id()).unwrap();
    let second = engine.wrap(b.id()).unwrap();
    assert!(first.ptr_eq(&second));
}

#[test]
fn test_distinct_bases_get_distinct_wrappers() {
    let engine = Engine::new();
    let b1 = base(&engine, "B1");
    let b2 = base(&engine, "B2");

    let w1 = engine.wrap(b1.id()).unwrap();
    let w2 = engine.wrap(b2.id()).unwrap();
    assert!(!w1.ptr_eq(&w2));
    assert_eq!(w1.name(), "WrappedB1");
    assert_eq!(w2.name(), "WrappedB2");
}

#[test]
fn test_wrap_requires_live_type() {
    let engine = Engine::new();
    assert!(matches!(
        engine.wrap(TypeId::new()),
        Err(Error::UnsupportedBaseType { .. })
    ));

    let id = {
        let b = base(&engine, "B");
        b.id()
    };
    // The handle is gone, so the type is gone.
    assert!(matches!(
        engine.wrap(id),
        Err(Error::UnsupportedBaseType { .. })
    ));
}

#[test]
fn test_cache_does_not_pin_wrappers() {
    let engine = Engine::new();
    let b = base(&engine, "B");

    let first_id = engine.wrap(b.id()).unwrap().id();
    // No handle or instance survives the statement above, so the cached
    // entry is dead and a fresh wrapper gets synthesized.
    let second = engine.wrap(b.id()).unwrap();
    assert_ne!(second.id(), first_id);
}

#[test]
fn test_live_instance_pins_wrapper() {
    let engine = Engine::new();
    let b = base(&engine, "B");

    let w = {
        let wrapper = engine.wrap(b.id()).unwrap();
        wrapper
            .construct(&engine, &b.instance(Payload::Int(0)), CtorArgs::new())
            .unwrap()
    };
    let again = engine.wrap(b.id()).unwrap();
    assert_eq!(again.id(), w.type_id());
}

#[test]
fn test_purge_reports_dead_entries() {
    let engine = Engine::new();
    let b = base(&engine, "B");
    {
        let _w = engine.wrap(b.id()).unwrap();
    }
    // Dead wrapper in both indexes: the type index entry and the cache
    // entry both count.
    assert_eq!(engine.purge(), 2);
    assert_eq!(engine.purge(), 0);
}

#[test]
fn test_wrapping_a_wrapper_chains() {
    let engine = Engine::new();
    let b = base(&engine, "B");
    let w = engine.wrap(b.id()).unwrap();
    let ww = engine.wrap(w.id()).unwrap();

    assert!(!ww.ptr_eq(&w));
    assert_eq!(ww.name(), "WrappedWrappedB");
    assert!(ww.origin().unwrap().ptr_eq(&w));
    assert!(ww.is_descendant_of(&b));
}

#[test]
fn test_subclass_outside_wrapper_lineage_is_rejected() {
    let engine = Engine::new();
    let b = base(&engine, "B");
    let err = b.subclass("Sub").build(&engine).unwrap_err();
    assert!(matches!(err, Error::UnsupportedBaseType { .. }));

    let w = engine.wrap(b.id()).unwrap();
    assert!(w.subclass("Sub").build(&engine).is_ok());
}

#[test]
fn test_concurrent_wrap_yields_one_wrapper() {
    let engine = Arc::new(Engine::new());
    let b = base(&engine, "B");
    let barrier = Arc::new(Barrier::new(8));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let id = b.id();
            std::thread::spawn(move || {
                barrier.wait();
                engine.wrap(id).unwrap()
            })
        })
        .collect();

    let wrappers: Vec<TypeHandle> = threads.into_iter().map(|t| t.join().unwrap()).collect();
    assert!(wrappers.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
}

#[test]
fn test_wrapper_surface_matches_base() {
    let engine = Engine::new();
    let b = base(&engine, "B");
    let w = engine.wrap(b.id()).unwrap();

    assert_eq!(w.method_names(), b.method_names());
    assert!(w.has_method("next"));
    assert!(!w.has_method("missing"));
}
