use tripwire::{Outcome, Registry, Value};

const FIRINGS: usize = 100_000;

#[test]
fn test_half_probability_lands_near_half() {
    let registry = Registry::builder().seed(2024).build();
    let fp = registry.register("net::drop");
    registry.enable("net::drop", "50%return(1)").unwrap();

    let mut returns = 0;
    for _ in 0..FIRINGS {
        match fp.fire() {
            Some(Outcome::Return(Value::Int(1))) => returns += 1,
            Some(Outcome::Suppress) => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    // ten standard deviations is ~1581
    assert!(
        (48_500..=51_500).contains(&returns),
        "returns = {returns}"
    );
    assert_eq!(registry.status("net::drop").unwrap(), "50%return(1)");
    assert_eq!(registry.count("net::drop").unwrap(), returns as u64);
}

#[test]
fn test_misses_do_not_consume_counts() {
    let registry = Registry::builder().seed(9).build();
    let fp = registry.register("net::drop");
    registry.enable("net::drop", "10%20*return(1)").unwrap();

    let mut returns = 0;
    let mut suppressed = 0;
    let mut exhausted = 0;
    for _ in 0..10_000 {
        match fp.fire() {
            Some(Outcome::Return(_)) => returns += 1,
            Some(Outcome::Suppress) => suppressed += 1,
            Some(Outcome::Exhausted) => exhausted += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    assert_eq!(returns, 20);
    assert!(suppressed > 0);
    assert!(exhausted > 0);
}

#[test]
fn test_same_seed_reproduces_draws() {
    let run = || {
        let registry = Registry::builder().seed(77).build();
        let fp = registry.register("disk::write");
        registry.enable("disk::write", "33%return(1)").unwrap();
        (0..1_000).map(|_| fp.fire()).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_extreme_probabilities() {
    let registry = Registry::builder().seed(5).build();
    let fp = registry.register("x");

    registry.enable("x", "0%return(1)").unwrap();
    assert!((0..1_000).all(|_| fp.fire() == Some(Outcome::Suppress)));

    registry.enable("x", "100%return(1)").unwrap();
    assert!((0..1_000).all(|_| fp.fire() == Some(Outcome::Return(Value::Int(1)))));
}
