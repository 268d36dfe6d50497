use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_describe_the_demo_setup() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.cache.document_ttl_seconds.get(), 60);
    assert_eq!(settings.delivery.mode, DeliveryMode::Log);
    assert!(!settings.metadata.enabled);
    assert_eq!(settings.metadata.ids, vec![1, 2, 3]);
    assert_eq!(settings.demo.actor_kind, "admin");
    assert_eq!(settings.demo.actor_name, "Ben");
    assert_eq!(settings.demo.document, "project_plan.pdf");
    assert_eq!(
        settings.uploads.max_request_bytes.get(),
        DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES
    );
    assert_eq!(
        settings.sessions.idle_timeout,
        Duration::from_secs(14 * 24 * 60 * 60)
    );
}

#[test]
fn zero_session_idle_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.sessions.idle_timeout_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero idle timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "sessions.idle_timeout_seconds",
            ..
        }
    ));
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
fn webhook_mode_requires_url() {
    let mut raw = RawSettings::default();
    raw.delivery.mode = Some("Webhook".to_string());

    let err = Settings::from_raw(raw.clone()).expect_err("missing url");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "delivery.webhook_url",
            ..
        }
    ));

    raw.delivery.webhook_url = Some(" https://hooks.example.com/send ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.delivery.mode,
        DeliveryMode::Webhook {
            url: "https://hooks.example.com/send".to_string()
        }
    );
}

#[test]
fn unknown_delivery_mode_is_rejected() {
    let mut raw = RawSettings::default();
    raw.delivery.mode = Some("carrier-pigeon".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "delivery.mode",
            ..
        })
    ));
}

#[test]
fn zero_cache_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.document_ttl_seconds = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["notifier"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from([
        "notifier",
        "migrate",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "notifier",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--delivery-mode",
        "webhook",
        "--metadata-enabled",
        "true",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(serve.overrides.delivery_mode.as_deref(), Some("webhook"));
            assert_eq!(serve.overrides.metadata_enabled, Some(true));
        }
        _ => panic!("wrong command parsed"),
    }
}
