// SPDX-License-Identifier: MIT

use super::*;
use std::time::Duration;

fn parse(text: &str) -> RawConfig {
    toml::from_str(text).unwrap()
}

#[test]
fn full_config_parses() {
    let raw = parse(
        r#"
        state_dir = "/var/lib/cadence"
        delivery_time = "07:30"
        utc_offset = "+00:00"
        bot_token = "file-token"
        subjects = ["english", "polity"]
        parallel_size_limit = 1048576

        [playlists]
        english = "https://youtube.com/playlist?list=PLabc"

        [retry]
        max_attempts = 5
        base_delay = "2s"
        max_delay = "30s"
        attempt_timeout = "45s"
    "#,
    );
    let config = Config::resolve(raw, None).unwrap();

    assert_eq!(config.state_dir, PathBuf::from("/var/lib/cadence"));
    assert_eq!(config.delivery_time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    assert_eq!(config.utc_offset.local_minus_utc(), 0);
    assert_eq!(config.bot_token.as_deref(), Some("file-token"));
    assert_eq!(config.subjects, vec![Subject::from("english"), Subject::from("polity")]);
    assert_eq!(config.parallel_size_limit, 1048576);
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.base_delay, Duration::from_secs(2));
    assert_eq!(config.socket_path(), PathBuf::from("/var/lib/cadence/cadenced.sock"));
}

#[test]
fn defaults_apply_for_an_empty_config() {
    let config = Config::resolve(parse("state_dir = \"/tmp/c\""), None).unwrap();

    assert_eq!(config.delivery_time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    // IST is UTC+05:30
    assert_eq!(config.utc_offset.local_minus_utc(), 5 * 3600 + 30 * 60);
    assert!(config.bot_token.is_none());
    assert!(config.subjects.is_empty());
    assert_eq!(config.parallel_size_limit, 10 * 1024 * 1024);
    assert_eq!(config.retry, RetryPolicy::default());
}

#[test]
fn env_token_wins_over_file_token() {
    let raw = parse("state_dir = \"/tmp/c\"\nbot_token = \"file-token\"");
    let config = Config::resolve(raw, Some("env-token".to_string())).unwrap();
    assert_eq!(config.bot_token.as_deref(), Some("env-token"));
}

#[test]
fn bad_delivery_time_is_rejected() {
    let raw = parse("state_dir = \"/tmp/c\"\ndelivery_time = \"6pm\"");
    assert!(matches!(
        Config::resolve(raw, None),
        Err(ConfigError::InvalidDeliveryTime(_))
    ));
}

#[test]
fn bad_offset_is_rejected() {
    let raw = parse("state_dir = \"/tmp/c\"\nutc_offset = \"+99:00\"");
    assert!(matches!(Config::resolve(raw, None), Err(ConfigError::Calendar(_))));
}

#[test]
fn unknown_keys_are_rejected() {
    let result: Result<RawConfig, _> = toml::from_str("delivery_tiem = \"18:00\"");
    assert!(result.is_err());
}

#[test]
fn playlists_build_the_library() {
    let raw = parse(
        r#"
        state_dir = "/tmp/c"
        [playlists]
        english = "https://youtube.com/playlist?list=PLxyz"
    "#,
    );
    let config = Config::resolve(raw, None).unwrap();
    let library = config.library();
    let link = library.item_link(&Subject::from("english"), 0);
    assert!(link.contains("list=PLxyz"));
    assert!(link.contains("index=1"));
}
