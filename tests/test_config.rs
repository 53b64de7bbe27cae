use pagelet::Config;

#[test]
fn defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.listen_addr, "127.0.0.1:1024");
    assert_eq!(cfg.mtu, 65535);
    assert_eq!(cfg.cache_max_age_ms, 3_600_000);
    assert_eq!(cfg.query_char, '?');
}

#[test]
fn yaml_overrides_merge_with_defaults() {
    let cfg = Config::from_yaml("listen_addr: \"0.0.0.0:8080\"\nmtu: 1500\n").unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
    assert_eq!(cfg.mtu, 1500);
    // Unspecified fields keep their defaults.
    assert_eq!(cfg.cache_max_age_ms, 3_600_000);
    assert_eq!(cfg.query_char, '?');
}

#[test]
fn yaml_can_change_the_query_delimiter() {
    let cfg = Config::from_yaml("query_char: \"!\"\n").unwrap();
    assert_eq!(cfg.query_char, '!');
}

#[test]
fn malformed_yaml_is_an_error() {
    assert!(Config::from_yaml("mtu: [not a number]").is_err());
}

// Environment handling lives in a single test so parallel test threads
// never race on the process environment.
#[test]
fn listen_env_overrides_the_bind_address() {
    unsafe { std::env::set_var("LISTEN", "127.0.0.1:9999") };
    let cfg = Config::load().unwrap();
    unsafe { std::env::remove_var("LISTEN") };

    assert_eq!(cfg.listen_addr, "127.0.0.1:9999");
}
