//! Concrete build/resolve scenarios, one test per numbered case.
//!
//! Table-length assertions are adjusted from the host numbers for two
//! redesign decisions documented in DESIGN.md: this port reserves three
//! built-in slots, not two, and a module's own aggregate is never itself
//! storage-backed (each field is independently `Arc`-owned), so table
//! length is `3 + distinct service count`, not `3 + services + 1 per module`.

use std::sync::{Arc, Mutex};

use bindgraph::*;

#[test]
fn s1_empty_container_has_only_reserved_slots() {
    let builder = ContainerBuilder::new();
    let container = builder.build().unwrap();

    assert_eq!(container.state(), ContainerState::Ready);
    let injector = container.injector();
    assert!(injector.get::<ContainerHandle>().is_ok());
    assert!(injector.get::<InjectorHandle>().is_ok());
    assert!(injector.get::<dyn HostAllocator>().is_ok());
}

#[test]
fn s2_single_module_two_services() {
    struct S1 {
        x: u32,
    }
    struct S2 {
        dep: Arc<S1>,
    }

    let mut builder = ContainerBuilder::new();
    builder.add::<S1>(Provider::factory::<S1, _, ()>(|| S1 { x: 123 }));
    builder.add::<S2>(Provider::factory::<S2, _, (Arc<S1>,)>(|dep| S2 { dep }));
    let container = builder.build().unwrap();

    let injector = container.injector();
    let s1 = injector.get::<S1>().unwrap();
    let s2 = injector.get::<S2>().unwrap();
    assert_eq!(s1.x, 123);
    assert!(Arc::ptr_eq(&s2.dep, &s1));
    assert_eq!(container.graph_description().lines().count(), 6);
}

#[test]
fn s3_multi_module_autowire_is_order_independent() {
    fn build(swap: bool) -> Arc<u32> {
        struct S1 {
            x: u32,
        }
        struct S2 {
            dep: Arc<S1>,
        }

        let mut builder = ContainerBuilder::new();
        let add_s1 = |b: &mut ContainerBuilder| {
            b.add::<S1>(Provider::factory::<S1, _, ()>(|| S1 { x: 123 }));
        };
        let add_s2 = |b: &mut ContainerBuilder| {
            b.add::<S2>(Provider::factory::<S2, _, (Arc<S1>,)>(|dep| S2 { dep }));
        };
        if swap {
            add_s2(&mut builder);
            add_s1(&mut builder);
        } else {
            add_s1(&mut builder);
            add_s2(&mut builder);
        }
        let container = builder.build().unwrap();
        let injector = container.injector();
        let s2 = injector.get::<S2>().unwrap();
        Arc::new(s2.dep.x)
    }

    assert_eq!(*build(false), 123);
    assert_eq!(*build(true), 123);
}

#[test]
fn s4_factory_and_in_place_initializer() {
    #[derive(Default)]
    struct S1 {
        x: u32,
    }
    #[derive(Default)]
    struct S2 {
        y: u32,
    }

    let mut builder = ContainerBuilder::new();
    builder.add::<S1>(Provider::factory::<S1, _, ()>(|| S1 { x: 123 }));
    builder.add::<S2>(Provider::initializer::<S2, _, ()>(|s2: &mut S2| {
        s2.y = 456;
    }));
    let container = builder.build().unwrap();

    let injector = container.injector();
    assert_eq!(injector.get::<S1>().unwrap().x, 123);
    assert_eq!(injector.get::<S2>().unwrap().y, 456);
}

#[test]
fn s5_configure_hook_and_init_hook() {
    struct S1 {
        x: u32,
    }
    struct S2 {
        dep: Arc<S1>,
    }

    let flag = Arc::new(Mutex::new(false));
    let flag_for_hook = flag.clone();

    let mut builder = ContainerBuilder::new();
    builder.add_value(123u32);
    builder.add::<S1>(Provider::factory::<S1, _, (Arc<u32>,)>(|x| S1 { x: *x }));
    builder.add::<S2>(Provider::factory::<S2, _, (Arc<S1>,)>(|dep| S2 { dep }));
    builder.add_init_hook::<(Arc<S2>,), _>(move |injector| {
        let s2 = injector.get::<S2>()?;
        assert_eq!(s2.dep.x, 123);
        *flag_for_hook.lock().unwrap() = true;
        Ok(())
    });
    let container = builder.build().unwrap();

    assert!(*flag.lock().unwrap());
    assert_eq!(container.injector().get::<S2>().unwrap().dep.x, 123);
}

#[test]
fn s6_partial_failure_unwinds_prior_deinits() {
    // `fail`'s factory depends on a type nobody registers; resolving its
    // arguments fails with `MissingDependency`, which is how a failing
    // initializer is rendered in this port (there is no fallible-factory
    // signature - see DESIGN.md on `Callable`/`Request`). `dep1`/`dep2` are
    // scheduled first since `fail` depends on `dep2`, so both are torn down
    // during the unwind.
    struct Counters {
        dep1_deinit: Mutex<u32>,
        dep2_deinit: Mutex<u32>,
    }

    struct Dep1;
    struct Dep2;
    struct NeverRegistered;
    struct Fail;

    let counters = Arc::new(Counters {
        dep1_deinit: Mutex::new(0),
        dep2_deinit: Mutex::new(0),
    });

    let mut builder = ContainerBuilder::new();
    builder.add_value(counters.clone());
    builder.add::<Dep1>(Provider::factory_with_deinit::<Dep1, _, (), _, (Arc<Counters>,)>(
        || Dep1,
        |_dep1, counters: Arc<Counters>| {
            *counters.dep1_deinit.lock().unwrap() += 1;
        },
    ));
    builder.add::<Dep2>(Provider::factory_with_deinit::<Dep2, _, (Arc<Dep1>,), _, (Arc<Counters>,)>(
        |_dep1| Dep2,
        |_dep2, counters: Arc<Counters>| {
            *counters.dep2_deinit.lock().unwrap() += 1;
        },
    ));
    builder.add::<Fail>(Provider::factory::<Fail, _, (Arc<Dep2>, Arc<NeverRegistered>)>(
        |_dep2, _never| Fail,
    ));

    let err = builder.build().unwrap_err();
    assert!(matches!(err, ContainerError::Build { .. }));
    assert_eq!(*counters.dep1_deinit.lock().unwrap(), 1);
    assert_eq!(*counters.dep2_deinit.lock().unwrap(), 1);
}

// `Config`/`Repository` each derive both `Service` (the `Autowire` impl) and
// `Module` (the `ModuleDescriptor` impl): `AppModule`'s non-defaulted fields
// go through `Collector::insert_implicit`, which needs a field's own base
// type to report its field list for mask-building, so any non-defaulted
// module field's type must itself be a `Module` too (see DESIGN.md).
#[derive(Service, Module)]
struct Config {
    #[bindgraph(default = "localhost".to_owned())]
    host: String,
    #[bindgraph(default = 5432u16)]
    port: u16,
}

#[derive(Service, Module)]
struct Repository {
    config: Arc<Config>,
}

#[derive(Module)]
struct AppModule {
    config: Arc<Config>,
    repository: Arc<Repository>,
}

#[test]
fn derive_module_wires_defaults_and_nested_autowiring() {
    let mut builder = ContainerBuilder::new();
    builder.add_module::<AppModule>();
    let container = builder.build().unwrap();

    let injector = container.injector();
    assert_eq!(injector.get::<Config>().unwrap().host, "localhost");
    assert_eq!(injector.get::<Config>().unwrap().port, 5432);
    assert_eq!(
        injector.get::<Repository>().unwrap().config.host,
        "localhost"
    );
}

#[test]
fn derive_module_override_replaces_default() {
    let mut builder = ContainerBuilder::new();
    builder.add_module::<AppModule>();
    builder.add_override::<Config>(Provider::value(Config {
        host: "db.internal".to_owned(),
        port: 5432,
    }));
    let container = builder.build().unwrap();

    assert_eq!(
        container.injector().get::<Repository>().unwrap().config.host,
        "db.internal"
    );
}

#[test]
fn s7_override_last_wins() {
    struct S1 {
        x: u32,
    }

    let mut builder = ContainerBuilder::new();
    builder.add::<S1>(Provider::factory::<S1, _, ()>(|| S1 { x: 1 })); // "Mocks"
    builder.add_override::<S1>(Provider::factory::<S1, _, ()>(|| S1 { x: 123 })); // "App"
    builder.add_override::<S1>(Provider::factory::<S1, _, ()>(|| S1 { x: 789 })); // "Fallbacks" wins, declared last
    let container = builder.build().unwrap();

    assert_eq!(container.injector().get::<S1>().unwrap().x, 789);
}

#[test]
fn s8_compile_hook_mutates_collector_before_resolution() {
    struct S1 {
        x: u32,
    }

    let mut builder = ContainerBuilder::new();
    builder.add_compile_hook(|collector| {
        collector.add::<S1>(Provider::value(S1 { x: 77 }));
    });
    let container = builder.build().unwrap();

    assert_eq!(container.injector().get::<S1>().unwrap().x, 77);
}

#[test]
fn s9_deinit_hook_fires_during_teardown_before_its_dependency() {
    struct S1 {
        x: u32,
    }

    let order = Arc::new(Mutex::new(Vec::new()));
    let order_for_hook = order.clone();
    let order_for_deinit = order.clone();

    let mut builder = ContainerBuilder::new();
    builder.add::<S1>(Provider::factory_with_deinit::<S1, _, (), _, ()>(
        || S1 { x: 1 },
        move |_s1, ()| {
            order_for_deinit.lock().unwrap().push("s1_deinit");
        },
    ));
    builder.add_deinit_hook::<(Arc<S1>,), _>(move |injector| {
        let s1 = injector.get::<S1>()?;
        assert_eq!(s1.x, 1);
        order_for_hook.lock().unwrap().push("hook");
        Ok(())
    });
    let container = builder.build().unwrap();
    container.destroy();

    // The hook depends on `S1`, so it must tear down before `S1` itself does.
    assert_eq!(*order.lock().unwrap(), vec!["hook", "s1_deinit"]);
}

#[test]
fn s10_module_with_configure_installs_override_and_init_hook() {
    struct S1 {
        x: u32,
    }

    #[derive(Module)]
    struct BaseModule {
        #[bindgraph(default = S1 { x: 1 })]
        s1: S1,
    }

    struct ConfiguredModule;

    impl ModuleDescriptor for ConfiguredModule {
        fn module_type_info() -> TypeInfo {
            TypeInfo::of::<ConfiguredModule>()
        }

        fn fields() -> Vec<FieldSpec> {
            BaseModule::fields()
        }
    }

    impl Configure for ConfiguredModule {
        fn configure(collector: &mut Collector) {
            collector.add_override::<S1>(Provider::value(S1 { x: 999 }));
            collector.add_init_hook(<(Arc<S1>,) as Request>::type_infos(), |injector| {
                let s1 = injector.get::<S1>()?;
                assert_eq!(s1.x, 999);
                Ok(())
            });
        }
    }

    let mut builder = ContainerBuilder::new();
    builder.add_module_with_configure::<ConfiguredModule>();
    let container = builder.build().unwrap();

    assert_eq!(container.injector().get::<S1>().unwrap().x, 999);
}
