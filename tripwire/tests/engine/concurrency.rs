use std::sync::{Arc, Barrier};
use std::thread;

use tripwire::{Bootstrap, Outcome, Registry, Value};

use crate::init_tracing;

const THREADS: usize = 16;

#[test]
fn test_counted_term_is_consumed_exactly_once() {
    init_tracing();
    let registry = Registry::builder().seed(11).build();
    let fp = registry.register("store::put");
    registry.enable("store::put", "5*return(1)").unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let fp = Arc::clone(&fp);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..50).map(|_| fp.fire()).collect::<Vec<_>>()
            })
        })
        .collect();

    let outcomes: Vec<Option<Outcome>> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("firing thread panicked"))
        .collect();

    let returns = outcomes
        .iter()
        .filter(|o| **o == Some(Outcome::Return(Value::Int(1))))
        .count();
    let exhausted = outcomes
        .iter()
        .filter(|o| **o == Some(Outcome::Exhausted))
        .count();

    assert_eq!(returns, 5);
    assert_eq!(exhausted, THREADS * 50 - 5);
    assert_eq!(registry.count("store::put").unwrap(), 5);
}

#[test]
fn test_exactly_n_concurrent_callers_see_the_value() {
    let registry = Registry::builder().seed(12).build();
    registry.register("store::get");
    registry.enable("store::get", "5*return(1)").unwrap();

    let barrier = Arc::new(Barrier::new(5));
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.fire("store::get")
            })
        })
        .collect();

    for h in handles {
        assert_eq!(
            h.join().expect("firing thread panicked"),
            Some(Outcome::Return(Value::Int(1)))
        );
    }
    assert_eq!(registry.fire("store::get"), Some(Outcome::Exhausted));
}

#[test]
fn test_enable_disable_while_firing() {
    let registry = Registry::builder().seed(13).build();
    let fp = registry.register("raft::append");

    let firers: Vec<_> = (0..4)
        .map(|_| {
            let fp = Arc::clone(&fp);
            thread::spawn(move || {
                for _ in 0..2_000 {
                    match fp.fire() {
                        None
                        | Some(Outcome::Return(Value::Int(1)))
                        | Some(Outcome::Suppress)
                        | Some(Outcome::Exhausted) => {}
                        other => panic!("unexpected outcome {other:?}"),
                    }
                }
            })
        })
        .collect();

    let toggler = {
        let registry = registry.clone();
        thread::spawn(move || {
            for i in 0..500 {
                let term = if i % 2 == 0 { "3*return(1)" } else { "50%off" };
                registry.enable("raft::append", term).unwrap();
                let _ = registry.status("raft::append");
                let _ = registry.disable("raft::append");
            }
        })
    };

    for h in firers {
        h.join().expect("firing thread panicked");
    }
    toggler.join().expect("toggling thread panicked");
    assert!(registry.status("raft::append").is_err());
}

#[test]
fn test_independent_failpoints_fire_in_parallel() {
    let registry = Registry::builder().seed(14).build();
    let names: Vec<String> = (0..8).map(|i| format!("shard::{i}")).collect();
    for name in &names {
        registry.register(name.as_str());
        registry.enable(name, "100*return(2)").unwrap();
    }

    let handles: Vec<_> = names
        .iter()
        .cloned()
        .map(|name| {
            let registry = registry.clone();
            thread::spawn(move || {
                let fp = registry.get(&name).expect("registered");
                (0..150).filter(|_| fp.fire() == Some(Outcome::Return(Value::Int(2)))).count()
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().expect("firing thread panicked"), 100);
    }
}

#[test]
fn test_enable_racing_registration_is_never_overwritten() {
    init_tracing();
    for round in 0..500 {
        let registry = Registry::builder()
            .seed(round)
            .bootstrap(Bootstrap::parse("A=return(1)").unwrap())
            .build();

        let enabler = {
            let registry = registry.clone();
            thread::spawn(move || {
                while registry.enable("A", "off").is_err() {
                    thread::yield_now();
                }
            })
        };
        let fp = registry.register("A");
        enabler.join().expect("enabling thread panicked");

        // Once enable has succeeded the start-up term must not come back.
        assert_eq!(registry.status("A").unwrap(), "off", "round {round}");
        assert_eq!(fp.fire(), Some(Outcome::Suppress));
    }
}

#[test]
fn test_pending_term_is_live_when_registered() {
    let registry = Registry::builder()
        .seed(2)
        .bootstrap(Bootstrap::parse("A=return(1)").unwrap())
        .build();

    let observer = {
        let registry = registry.clone();
        thread::spawn(move || loop {
            if let Some(fp) = registry.get("A") {
                return fp.fire();
            }
            thread::yield_now();
        })
    };
    registry.register("A");

    assert_eq!(
        observer.join().expect("observer thread panicked"),
        Some(Outcome::Return(Value::Int(1)))
    );
}
