use acme_warden::config::{self, validate_config, Config};

fn parse(toml_str: &str) -> Config {
    toml::from_str(toml_str).unwrap()
}

#[test]
fn minimal_config_gets_defaults() {
    let config = parse(
        r#"
        [acme]
        domain = "example.com"
        email = "admin@example.com"

        [http]
        [https]
        [logging]
        "#,
    );

    assert_eq!(config.acme.domain, "example.com");
    assert!(config.acme.staging);
    assert_eq!(config.acme.client_path, "acme.sh");
    assert_eq!(config.acme.renew_interval_secs, 3600);
    assert_eq!(config.acme.startup_grace_secs, 3);
    assert_eq!(config.http.listen_addr, "0.0.0.0:80");
    assert_eq!(config.https.listen_addr, "0.0.0.0:443");
    assert_eq!(config.https.shutdown_grace_secs, 5);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn explicit_values_override_defaults() {
    let config = parse(
        r#"
        [acme]
        domain = "example.com"
        email = "admin@example.com"
        staging = false
        client_path = "/opt/acme.sh/acme.sh"
        account_dir = "/var/lib/acme"
        renew_interval_secs = 600

        [http]
        listen_addr = "127.0.0.1:8080"

        [https]
        listen_addr = "127.0.0.1:8443"

        [logging]
        level = "debug"
        "#,
    );

    assert!(!config.acme.staging);
    assert_eq!(config.acme.client_path, "/opt/acme.sh/acme.sh");
    assert_eq!(
        config.acme.account_dir_path(),
        std::path::PathBuf::from("/var/lib/acme")
    );
    assert_eq!(config.acme.renew_interval_secs, 600);
    assert_eq!(config.https.listen_addr, "127.0.0.1:8443");
}

#[test]
fn validate_config_rejects_bad_listen_addr() {
    let config = parse(
        r#"
        [acme]
        domain = "example.com"
        email = "admin@example.com"

        [http]
        [https]
        listen_addr = "not-an-address"

        [logging]
        "#,
    );

    assert!(validate_config(&config).is_err());
}

#[test]
fn validate_config_rejects_empty_domain() {
    let config = parse(
        r#"
        [acme]
        domain = ""
        email = "admin@example.com"

        [http]
        [https]
        [logging]
        "#,
    );

    assert!(validate_config(&config).is_err());
}

#[test]
fn validate_config_accepts_valid_config() {
    let config = parse(
        r#"
        [acme]
        domain = "example.com"
        email = "admin@example.com"

        [http]
        [https]
        [logging]
        "#,
    );

    assert!(validate_config(&config).is_ok());
}

#[test]
fn load_config_reads_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        [acme]
        domain = "example.com"
        email = "admin@example.com"

        [http]
        [https]
        [logging]
        "#,
    )
    .unwrap();

    let config = config::load_config(path.to_str().unwrap()).unwrap();
    assert_eq!(config.acme.email, "admin@example.com");
}

#[test]
fn load_config_missing_file_fails() {
    assert!(config::load_config("/nonexistent/config.toml").is_err());
}
