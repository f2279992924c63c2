use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.cache.ttl_seconds = Some(60);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        cache_ttl_seconds: Some(900),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.cache.ttl_seconds, 900);
}

#[test]
fn defaults_resolve() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert!(settings.database.url.is_none());
    assert!(settings.database.run_migrations);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.backend, CacheBackendKind::Memory);
    assert_eq!(settings.cache.ttl_seconds, 300);
    assert_eq!(settings.cache.capacity, 256);
    assert_eq!(settings.cache.operation_timeout_ms, 250);
    assert_eq!(settings.snapshot.miss_timeout, Duration::from_millis(5_000));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn redis_backend_requires_url() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("redis".to_string());

    let err = Settings::from_raw(raw.clone()).expect_err("missing redis url");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.redis_url",
            ..
        }
    ));

    raw.cache.redis_url = Some("redis://127.0.0.1:6379/".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.backend, CacheBackendKind::Redis);
}

#[test]
fn unknown_backend_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("memcached".to_string());

    let err = Settings::from_raw(raw).expect_err("unknown backend");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.backend",
            ..
        }
    ));
}

#[test]
fn zero_values_name_their_key() {
    let cases: [(&str, fn(&mut RawSettings)); 4] = [
        ("server.port", |raw| raw.server.port = Some(0)),
        ("cache.ttl_seconds", |raw| raw.cache.ttl_seconds = Some(0)),
        ("database.max_connections", |raw| {
            raw.database.max_connections = Some(0)
        }),
        ("snapshot.miss_timeout_ms", |raw| {
            raw.snapshot.miss_timeout_ms = Some(0)
        }),
    ];

    for (expected, mutate) in cases {
        let mut raw = RawSettings::default();
        mutate(&mut raw);
        match Settings::from_raw(raw) {
            Err(LoadError::Invalid { key, .. }) => assert_eq!(key, expected),
            other => panic!("expected invalid `{expected}`, got {other:?}"),
        }
    }
}

#[test]
fn oversized_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds = Some(u64::MAX);

    let err = Settings::from_raw(raw.clone()).expect_err("ttl too large");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.ttl_seconds",
            ..
        }
    ));

    raw.cache.ttl_seconds = Some(MAX_TTL_SECONDS);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.ttl_seconds, MAX_TTL_SECONDS);
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["eesa-catalog"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "eesa-catalog",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--cache-backend",
        "redis",
        "--cache-warm-on-startup",
        "true",
    ]);
    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.cache_backend.as_deref(), Some("redis"));
            assert_eq!(serve.overrides.cache_warm_on_startup, Some(true));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_snapshot_arguments() {
    let args = CliArgs::parse_from([
        "eesa-catalog",
        "snapshot",
        "--database-url",
        "postgres://example",
        "--scheme",
        "2",
        "--search",
        "algorithms",
        "--pretty",
    ]);
    match args.command.expect("snapshot command") {
        Command::Snapshot(snapshot) => {
            assert_eq!(
                snapshot.database.database_url.as_deref(),
                Some("postgres://example")
            );
            let query = snapshot.query();
            assert_eq!(query.scheme.as_deref(), Some("2"));
            assert_eq!(query.search.as_deref(), Some("algorithms"));
            assert!(query.semester.is_none());
            assert!(snapshot.pretty);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_invalidate_and_migrate() {
    let args =
        CliArgs::parse_from(["eesa-catalog", "invalidate", "--database-url", "postgres://a"]);
    assert!(matches!(args.command, Some(Command::Invalidate(_))));

    let args = CliArgs::parse_from(["eesa-catalog", "migrate"]);
    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => assert!(migrate.database.database_url.is_none()),
        _ => panic!("wrong command parsed"),
    }
}
