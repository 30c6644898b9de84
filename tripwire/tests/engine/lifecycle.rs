use tripwire::{Error, Outcome, Registry, Value};

use crate::init_tracing;

fn registry() -> Registry {
    Registry::builder().seed(31).build()
}

#[test]
fn test_disable_makes_failpoint_inert() {
    let r = registry();
    let fp = r.register("io::read");
    for term in ["return(1)", "sleep(1)", "50%panic", "3*off->loop", ""] {
        r.enable("io::read", term).unwrap();
        r.disable("io::read").unwrap();
        assert!(matches!(r.status("io::read"), Err(Error::NotEnabled { .. })));
        assert_eq!(fp.fire(), None);
    }
}

#[test]
fn test_unregistered_operations_are_not_found() {
    let r = registry();
    r.register("present");
    for name in ["absent", "Present", "present "] {
        assert!(matches!(r.enable(name, "off"), Err(Error::NotFound { .. })));
        assert!(matches!(r.disable(name), Err(Error::NotFound { .. })));
        assert!(matches!(r.status(name), Err(Error::NotFound { .. })));
    }
}

#[test]
fn test_status_returns_exact_text() {
    let r = registry();
    r.register("io::read");
    for term in [
        "return(1)",
        "3*return(\"eof\")",
        " 25% sleep(2s) ",
        "1*off -> 2*print(hi) -> loop",
        "panic",
        "",
    ] {
        r.enable("io::read", term).unwrap();
        assert_eq!(r.status("io::read").unwrap(), term);
    }
}

#[test]
fn test_three_returns_then_exhausted() {
    let r = registry();
    let fp = r.register("io::read");
    r.enable("io::read", "3*return(1)").unwrap();
    for _ in 0..3 {
        assert_eq!(fp.fire(), Some(Outcome::Return(Value::Int(1))));
    }
    for _ in 0..5 {
        assert_eq!(fp.fire(), Some(Outcome::Exhausted));
    }
}

#[test]
fn test_bad_term_leaves_active_term_alone() {
    let r = registry();
    let fp = r.register("io::read");
    r.enable("io::read", "2*return(1)").unwrap();
    assert_eq!(fp.fire(), Some(Outcome::Return(Value::Int(1))));

    assert!(matches!(
        r.enable("io::read", "99%%bogus"),
        Err(Error::InvalidTerm(_))
    ));

    assert_eq!(r.status("io::read").unwrap(), "2*return(1)");
    assert_eq!(fp.fire(), Some(Outcome::Return(Value::Int(1))));
    assert_eq!(fp.fire(), Some(Outcome::Exhausted));
}

#[test]
fn test_bad_term_on_disabled_failpoint_keeps_it_disabled() {
    let r = registry();
    r.register("io::read");
    assert!(r.enable("io::read", "0*return(1)").is_err());
    assert!(matches!(r.status("io::read"), Err(Error::NotEnabled { .. })));
}

#[test]
fn test_print_logs_and_carries_on() {
    init_tracing();
    let r = registry();
    let fp = r.register("io::flush");
    r.enable("io::flush", "2*print(\"flushing\")->print").unwrap();

    for _ in 0..4 {
        assert_eq!(fp.fire(), Some(Outcome::Suppress));
    }
    assert_eq!(r.count("io::flush").unwrap(), 4);
}
