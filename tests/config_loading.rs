// tests/config_loading.rs
use hotspot_crawler::config::CrawlerConfig;
use std::{env, fs};

const ENV_KEYS: [&str; 4] = [
    "CRAWLER_CONFIG_PATH",
    "DATABASE_URL",
    "STATIC_DIR",
    "CRAWL_INTERVAL_SECS",
];

fn clear_env() {
    for k in ENV_KEYS {
        env::remove_var(k);
    }
}

#[test]
fn load_from_file_reads_sections() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("crawler.toml");
    fs::write(
        &p,
        r#"
database_url = "sqlite::memory:"

[fetch]
items_per_source = 5
parallel = true

[enrich]
settle_delay_ms = 0
headless = false
"#,
    )
    .unwrap();

    let cfg = CrawlerConfig::load_from_file(&p).unwrap();
    assert_eq!(cfg.database_url, "sqlite::memory:");
    assert_eq!(cfg.fetch.items_per_source, 5);
    assert!(cfg.fetch.parallel);
    assert_eq!(cfg.fetch.timeout_secs, 10);
    assert_eq!(cfg.enrich.settle_delay_ms, 0);
    assert!(!cfg.enrich.headless);
    assert_eq!(cfg.static_dir, "static");
}

#[test]
fn invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("broken.toml");
    fs::write(&p, "[fetch\nitems_per_source = ").unwrap();
    assert!(CrawlerConfig::load_from_file(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_config_dir_then_builtin() {
    // isolate cwd so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) nothing on disk: built-in defaults
    let cfg = CrawlerConfig::load_default().unwrap();
    assert_eq!(cfg.fetch.items_per_source, 3);
    assert_eq!(cfg.schedule.interval_secs, 0);

    // 2) ./config/crawler.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/crawler.toml"),
        "[schedule]\ninterval_secs = 1800\n",
    )
    .unwrap();
    let cfg = CrawlerConfig::load_default().unwrap();
    assert_eq!(cfg.schedule.interval_secs, 1800);

    // 3) explicit path wins
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "[fetch]\nitems_per_source = 7\n").unwrap();
    env::set_var("CRAWLER_CONFIG_PATH", p_env.display().to_string());
    let cfg = CrawlerConfig::load_default().unwrap();
    assert_eq!(cfg.fetch.items_per_source, 7);
    assert_eq!(cfg.schedule.interval_secs, 0);

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn missing_env_path_is_an_error() {
    clear_env();
    env::set_var("CRAWLER_CONFIG_PATH", "/definitely/not/here/crawler.toml");
    let err = CrawlerConfig::load_default().unwrap_err();
    assert!(err.to_string().contains("CRAWLER_CONFIG_PATH"));
    clear_env();
}

#[serial_test::serial]
#[test]
fn env_overrides_apply_on_top_of_file() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    env::set_var("DATABASE_URL", "sqlite:/tmp/other.db?mode=rwc");
    env::set_var("STATIC_DIR", "/srv/static");
    env::set_var("CRAWL_INTERVAL_SECS", "600");
    let cfg = CrawlerConfig::load_default().unwrap();
    assert_eq!(cfg.database_url, "sqlite:/tmp/other.db?mode=rwc");
    assert_eq!(cfg.static_dir, "/srv/static");
    assert_eq!(cfg.schedule.interval_secs, 600);
    assert_eq!(
        cfg.screenshot_dir(),
        std::path::PathBuf::from("/srv/static/screenshots")
    );

    env::set_var("CRAWL_INTERVAL_SECS", "half an hour");
    assert!(CrawlerConfig::load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}
