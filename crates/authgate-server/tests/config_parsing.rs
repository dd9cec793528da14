use std::io::Write;
use std::time::Duration;

use authgate_server::config::loader::{load_config, load_config_with_default_path};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_toml_file() {
    let file = write_config(
        r#"
[server]
host = "127.0.0.1"
port = 9191

[logging]
level = "debug"

[auth]
issuer = "https://auth.example.com"

[auth.signing]
secret = "0123456789abcdef0123456789abcdef"

[auth.tokens]
access_token_lifetime = "5m"
refresh_token_lifetime = "7d"
refresh_token_rotation = false

[auth.sessions]
default_label = "web"
"#,
    );

    let cfg = load_config(file.path().to_str()).expect("config loads");
    assert_eq!(cfg.server.port, 9191);
    assert_eq!(cfg.addr().to_string(), "127.0.0.1:9191");
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.auth.issuer, "https://auth.example.com");
    assert_eq!(cfg.auth.tokens.access_token_lifetime, Duration::from_secs(300));
    assert_eq!(
        cfg.auth.tokens.refresh_token_lifetime,
        Duration::from_secs(7 * 24 * 3600)
    );
    assert!(!cfg.auth.tokens.refresh_token_rotation);
    assert_eq!(cfg.auth.sessions.default_label, "web");
    // untouched sections keep their defaults
    assert_eq!(cfg.auth.store.timeout, Duration::from_secs(5));
}

#[test]
fn rejects_short_secret() {
    let file = write_config(
        r#"
[auth]
issuer = "https://auth.example.com"

[auth.signing]
secret = "too-short"
"#,
    );

    let err = load_config(file.path().to_str()).unwrap_err();
    assert!(err.contains("auth config error"), "{err}");
}

#[test]
fn rejects_other_algorithms() {
    let file = write_config(
        r#"
[auth]
issuer = "https://auth.example.com"

[auth.signing]
secret = "0123456789abcdef0123456789abcdef"
algorithm = "RS256"
"#,
    );

    assert!(load_config(file.path().to_str()).is_err());
}

#[test]
fn rejects_unparseable_file() {
    let file = write_config("[server\nport = ");
    let err = load_config_with_default_path(Some(file.path())).unwrap_err();
    assert!(err.starts_with("config build error"), "{err}");
}

#[test]
fn round_trips_through_toml() {
    let file = write_config(
        r#"
[auth]
issuer = "https://auth.example.com"

[auth.signing]
secret = "0123456789abcdef0123456789abcdef"
"#,
    );
    let cfg = load_config(file.path().to_str()).expect("config loads");

    let rendered = toml::to_string(&cfg).expect("serialize");
    let again = load_config(write_config(&rendered).path().to_str()).expect("reload");
    assert_eq!(again.auth.issuer, cfg.auth.issuer);
    assert_eq!(
        again.auth.tokens.refresh_token_lifetime,
        cfg.auth.tokens.refresh_token_lifetime
    );
}
