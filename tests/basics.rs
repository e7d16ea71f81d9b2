//! Core registration and resolution behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lattice_di::{Container, DiError, ResolveOptions};

#[derive(Debug)]
struct Config {
    addr: &'static str,
}

struct Server {
    config: Arc<Config>,
}

#[test]
fn resolves_a_dependency_chain() {
    let mut container = Container::new();
    container.provide(|| Config { addr: "localhost:9" }).register().unwrap();
    container
        .provide(|config: Arc<Config>| Server { config })
        .register()
        .unwrap();

    let server = container.resolve::<Server>().unwrap();
    assert_eq!(server.config.addr, "localhost:9");
}

#[test]
fn construction_is_lazy() {
    static BUILT: AtomicUsize = AtomicUsize::new(0);

    let mut container = Container::new();
    container
        .provide(|| {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Config { addr: "" }
        })
        .register()
        .unwrap();

    assert_eq!(BUILT.load(Ordering::SeqCst), 0);
    container.resolve::<Config>().unwrap();
    container.resolve::<Config>().unwrap();
    assert_eq!(BUILT.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_provider_reports_not_found() {
    let container = Container::new();
    let err = container.resolve::<Config>().unwrap_err();
    assert!(matches!(err, DiError::NotFound(_)));
    assert!(err.to_string().contains("does not exist in the container"));
}

#[test]
fn named_providers_coexist_and_filter() {
    let mut container = Container::new();
    container.provide(|| Config { addr: "primary" }).named("primary").register().unwrap();
    container.provide(|| Config { addr: "replica" }).named("replica").register().unwrap();

    let replica = container
        .resolve_with::<Config>(ResolveOptions::new().named("replica"))
        .unwrap();
    assert_eq!(replica.addr, "replica");

    // An unfiltered request matches both.
    let err = container.resolve::<Config>().unwrap_err();
    assert!(matches!(err, DiError::Ambiguous { .. }));
    assert!(err.to_string().contains("multiple definitions"));
    assert!(err.to_string().contains("resolve_all"));
}

#[test]
fn tagged_providers_filter_by_superset() {
    let mut container = Container::new();
    container
        .provide(|| Config { addr: "eu" })
        .tagged("zone", "eu")
        .tagged("role", "primary")
        .register()
        .unwrap();

    // Requesting a subset of the stored tags matches.
    let hit = container
        .resolve_with::<Config>(ResolveOptions::new().tagged("zone", "eu"))
        .unwrap();
    assert_eq!(hit.addr, "eu");

    let miss = container.resolve_with::<Config>(ResolveOptions::new().tagged("zone", "us"));
    assert!(matches!(miss, Err(DiError::NotFound(_))));
}

#[test]
fn wildcard_tag_matches_any_requested_value() {
    let mut container = Container::new();
    container
        .provide(|| Config { addr: "any" })
        .tagged("zone", "*")
        .register()
        .unwrap();

    for zone in ["eu", "us", "ap"] {
        let hit = container
            .resolve_with::<Config>(ResolveOptions::new().tagged("zone", zone))
            .unwrap();
        assert_eq!(hit.addr, "any");
    }
}

#[test]
fn has_checks_presence_without_building() {
    static BUILT: AtomicUsize = AtomicUsize::new(0);

    let mut container = Container::new();
    container
        .provide(|| {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Config { addr: "" }
        })
        .register()
        .unwrap();

    assert!(container.has::<Config>());
    assert!(!container.has::<Server>());
    assert!(!container.has_with::<Config>(ResolveOptions::new().named("nope")));
    assert_eq!(BUILT.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_name_is_rejected_at_registration() {
    let mut container = Container::new();
    let err = container
        .provide(|| Config { addr: "" })
        .named("")
        .register()
        .unwrap_err();
    assert!(matches!(err, DiError::Registration(_)));
}

#[test]
fn empty_tag_key_is_rejected_at_registration() {
    let mut container = Container::new();
    let err = container
        .provide(|| Config { addr: "" })
        .tagged("", "v")
        .register()
        .unwrap_err();
    assert!(matches!(err, DiError::Registration(_)));
}

#[test]
fn ambiguous_identity_still_counts_as_present() {
    let mut container = Container::new();
    container.provide(|| Config { addr: "a" }).named("a").register().unwrap();
    container.provide(|| Config { addr: "b" }).named("b").register().unwrap();

    // Two providers make the unfiltered request ambiguous, not absent.
    assert!(matches!(
        container.resolve::<Config>().unwrap_err(),
        DiError::Ambiguous { .. }
    ));
    assert!(container.has::<Config>());
    assert!(container.has_with::<Config>(ResolveOptions::new().named("a")));
}

#[test]
fn prototype_values_are_not_cached() {
    static BUILT: AtomicUsize = AtomicUsize::new(0);

    let mut container = Container::new();
    container
        .provide(|| {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Config { addr: "" }
        })
        .prototype()
        .register()
        .unwrap();

    container.resolve::<Config>().unwrap();
    container.resolve::<Config>().unwrap();
    assert_eq!(BUILT.load(Ordering::SeqCst), 2);
}

#[test]
fn singleton_is_shared_between_dependents() {
    struct A {
        config: Arc<Config>,
    }
    struct B {
        config: Arc<Config>,
    }

    let mut container = Container::new();
    container.provide(|| Config { addr: "" }).register().unwrap();
    container.provide(|c: Arc<Config>| A { config: c }).register().unwrap();
    container.provide(|c: Arc<Config>| B { config: c }).register().unwrap();

    let a = container.resolve::<A>().unwrap();
    let b = container.resolve::<B>().unwrap();
    assert!(Arc::ptr_eq(&a.config, &b.config));
}

#[test]
fn optional_parameter_is_populated_when_available() {
    struct Maybe {
        config: Option<Arc<Config>>,
    }

    let mut container = Container::new();
    container.provide(|| Config { addr: "here" }).register().unwrap();
    container
        .provide(|config: Option<Arc<Config>>| Maybe { config })
        .register()
        .unwrap();

    let maybe = container.resolve::<Maybe>().unwrap();
    assert_eq!(maybe.config.as_ref().unwrap().addr, "here");
}

#[test]
fn fallible_factory_error_is_wrapped_with_key() {
    #[derive(Debug)]
    struct Broken;

    let mut container = Container::new();
    container
        .try_provide(|| Err::<Broken, _>(std::io::Error::other("listen failed")))
        .register()
        .unwrap();

    let err = container.resolve::<Broken>().unwrap_err();
    match err {
        DiError::Construction { key, source } => {
            assert!(key.type_name().contains("Broken"));
            assert!(source.to_string().contains("listen failed"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn concurrent_first_access_builds_exactly_once() {
    static BUILT: AtomicUsize = AtomicUsize::new(0);

    let mut container = Container::new();
    container
        .provide(|| {
            BUILT.fetch_add(1, Ordering::SeqCst);
            std::thread::yield_now();
            Config { addr: "shared" }
        })
        .register()
        .unwrap();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| container.resolve::<Config>().unwrap());
        }
    });
    assert_eq!(BUILT.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_singleton_can_be_retried() {
    static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

    struct Flaky;

    let mut container = Container::new();
    container
        .try_provide(|| {
            if ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("first attempt fails")
            } else {
                Ok(Flaky)
            }
        })
        .register()
        .unwrap();

    assert!(container.resolve::<Flaky>().is_err());
    assert!(container.resolve::<Flaky>().is_ok());
}
