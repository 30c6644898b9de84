use tripwire::{Bootstrap, Error, Outcome, Registry, Value, FAILPOINTS_ENV};

#[test]
fn test_pending_terms_apply_on_registration() {
    let bootstrap = Bootstrap::parse("A=return(1);B=off").unwrap();
    let registry = Registry::builder().seed(1).bootstrap(bootstrap).build();

    // registration order is irrelevant
    let b = registry.register("B");
    let a = registry.register("A");

    assert_eq!(registry.status("A").unwrap(), "return(1)");
    assert_eq!(registry.status("B").unwrap(), "off");
    assert_eq!(a.fire(), Some(Outcome::Return(Value::Int(1))));
    assert_eq!(b.fire(), Some(Outcome::Suppress));
}

#[test]
fn test_unrelated_registrations_stay_disabled() {
    let bootstrap = Bootstrap::parse("A=return(1)").unwrap();
    let registry = Registry::builder().bootstrap(bootstrap).build();
    registry.register("C");
    assert!(matches!(registry.status("C"), Err(Error::NotEnabled { .. })));
}

#[test]
fn test_reregistration_reapplies_pending_term() {
    let bootstrap = Bootstrap::parse("A=1*return(1)").unwrap();
    let registry = Registry::builder().seed(1).bootstrap(bootstrap).build();

    let first = registry.register("A");
    assert_eq!(first.fire(), Some(Outcome::Return(Value::Int(1))));
    assert_eq!(first.fire(), Some(Outcome::Exhausted));

    let second = registry.register("A");
    assert_eq!(second.fire(), Some(Outcome::Return(Value::Int(1))));
}

#[test]
fn test_malformed_configuration_is_fatal() {
    for config in ["A", "A=return(1);B", "A=b=c", "A=return(1);B=frobnicate"] {
        assert!(
            matches!(Bootstrap::parse(config), Err(Error::FatalBootstrapConfig(_))),
            "{config} should be rejected"
        );
    }
}

#[test]
fn test_from_env() {
    std::env::set_var(FAILPOINTS_ENV, "env::point=2*sleep(5ms)");
    let bootstrap = Bootstrap::from_env().unwrap();
    std::env::remove_var(FAILPOINTS_ENV);

    assert_eq!(bootstrap.pending("env::point"), Some("2*sleep(5ms)"));
    assert!(Bootstrap::from_env().unwrap().is_empty());

    std::env::set_var(FAILPOINTS_ENV, "  ");
    assert!(Bootstrap::from_env().unwrap().is_empty());

    // Same variable as above; kept in one test so the two never interleave.
    #[cfg(unix)]
    {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        std::env::set_var(FAILPOINTS_ENV, OsStr::from_bytes(b"A=return(1);B=\xff"));
        let result = Bootstrap::from_env();
        std::env::remove_var(FAILPOINTS_ENV);
        assert!(
            matches!(result, Err(Error::FatalBootstrapConfig(_))),
            "non UTF-8 configuration must not start: {result:?}"
        );
    }
    std::env::remove_var(FAILPOINTS_ENV);
}
