// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置设置测试模块
///
/// 测试默认值以及配置文件覆盖
#[cfg(test)]
mod tests {
    use prowl::config::settings::{EngineKind, Settings};
    use std::fs;

    #[test]
    fn test_defaults_without_config_files() {
        let dir = tempfile::tempdir().unwrap();

        let settings = Settings::load_from(dir.path()).expect("defaults load");

        assert_eq!(settings.crawler.delay_secs, 2.0);
        assert_eq!(settings.crawler.max_retries, 3);
        assert_eq!(settings.crawler.timeout_secs, 30);
        assert_eq!(settings.crawler.candidate_factor, 2);
        assert_eq!(settings.site.base_url, "https://www.amazon.com");
        assert_eq!(settings.site.auth_cookie, "session-token");
        assert_eq!(settings.engine.kind, EngineKind::Http);
        assert_eq!(settings.storage.data_dir, "data");
        assert_eq!(settings.auth.session_file, "cookies.json");
        assert!(settings.auth.credentials().is_none());
    }

    #[test]
    fn test_file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
[crawler]
delay_secs = 3.5
reviews_per_page = 5

[engine]
kind = "browser"
remote_debugging_url = "http://127.0.0.1:9222"

[auth]
email = "buyer@example.com"
password = "hunter2"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(dir.path()).expect("file loads");

        assert_eq!(settings.crawler.delay_secs, 3.5);
        assert_eq!(settings.crawler.reviews_per_page, 5);
        assert_eq!(settings.crawler.max_retries, 3);
        assert_eq!(settings.engine.kind, EngineKind::Browser);
        assert_eq!(
            settings.engine.remote_debugging_url.as_deref(),
            Some("http://127.0.0.1:9222")
        );
        let credentials = settings.auth.credentials().expect("credentials");
        assert_eq!(credentials.email, "buyer@example.com");
        assert!(!format!("{:?}", settings.auth).contains("hunter2"));
    }

    #[test]
    fn test_blank_credentials_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[auth]\nemail = \"  \"\npassword = \"secret\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(dir.path()).unwrap();

        assert!(settings.auth.credentials().is_none());
    }

    #[test]
    fn test_invalid_engine_kind_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[engine]\nkind = \"carrier-pigeon\"\n").unwrap();

        assert!(Settings::load_from(dir.path()).is_err());
    }

    #[test]
    fn test_session_ttl_is_bounded() {
        let mut settings = Settings::default();
        assert_eq!(settings.site.session_ttl(), chrono::Duration::hours(24));

        settings.site.session_ttl_secs = i64::MAX;
        assert_eq!(settings.site.session_ttl(), chrono::Duration::days(365));

        settings.site.session_ttl_secs = -5;
        assert_eq!(settings.site.session_ttl(), chrono::Duration::hours(24));
    }
}
