use crate::error::ConfigError;
use log::LevelFilter;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "/etc/nss_http.conf";

pub const MAX_CONFIG_LINE_LEN: usize = 1024;
pub const MAX_CONFIG_VALUE_LEN: usize = 255;

/// Longer timeouts overflow the request deadline.
pub const MAX_TIMEOUT_SECS: u64 = u32::MAX as u64;

/// Settings read from the `KEY=value` configuration file.
///
/// Built once by the caller and handed by reference to every request.
#[derive(Clone, Default, PartialEq)]
pub struct Config {
    pub server: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub debug: bool,
    /// `None` means the transfer is never cut short.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|source| ConfigError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut raw = Vec::new();
        file.read_to_end(&mut raw).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Config::parse(&String::from_utf8_lossy(&raw)))
    }

    /// Lines that are comments, unknown, empty-valued or over length are skipped.
    pub fn parse(text: &str) -> Config {
        let mut config = Config::default();

        for line in text.lines() {
            if line.starts_with('#') {
                continue;
            }

            if line.len() > MAX_CONFIG_LINE_LEN {
                log::warn!("Ignoring configuration line longer than {MAX_CONFIG_LINE_LEN} bytes");
                continue;
            }

            let (key, rest) = match line.split_once('=') {
                Some(pair) => pair,
                None => continue,
            };

            let value = match rest.split_whitespace().next() {
                Some(value) => value,
                None => continue,
            };

            if value.len() > MAX_CONFIG_VALUE_LEN {
                log::warn!("Ignoring {key}: value longer than {MAX_CONFIG_VALUE_LEN} bytes");
                continue;
            }

            match key {
                "HTTPSERVER"   => config.server = value.to_string(),
                "HTTPUSER"     => config.user = Some(value.to_string()),
                "HTTPPASSWORD" => config.password = Some(value.to_string()),
                "DEBUG"        => config.debug = value == "true",
                "TIMEOUT"      => match value.parse::<u64>() {
                    Ok(0) => config.timeout = None,
                    Ok(seconds) if seconds > MAX_TIMEOUT_SECS => {
                        log::warn!("Clamping TIMEOUT {seconds} to {MAX_TIMEOUT_SECS} seconds");
                        config.timeout = Some(Duration::from_secs(MAX_TIMEOUT_SECS));
                    }
                    Ok(seconds) => config.timeout = Some(Duration::from_secs(seconds)),
                    Err(err) => log::warn!("Ignoring TIMEOUT '{value}': {err}"),
                },
                _ => {}
            }
        }

        config
    }

    /// Stderr logger at `debug` when `DEBUG=true`, silent otherwise. The environment is not consulted.
    pub fn logger(&self) -> env_logger::Logger {
        let level = if self.debug { LevelFilter::Debug } else { LevelFilter::Off };
        env_logger::Builder::new()
            .filter_level(level)
            .target(env_logger::Target::Stderr)
            .build()
    }

    /// Installs [`Config::logger`]; a logger that is already installed stays.
    pub fn init_logging(&self) {
        let logger = self.logger();
        let level = logger.filter();
        if log::set_boxed_logger(Box::new(logger)).is_ok() {
            log::set_max_level(level);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, MAX_CONFIG_LINE_LEN, MAX_CONFIG_VALUE_LEN, MAX_TIMEOUT_SECS};
    use crate::error::ConfigError;
    use log::LevelFilter;
    use std::io::Write;
    use std::time::Duration;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_parse_all_keys() {
        init();
        let config = Config::parse(
            "HTTPSERVER=https://nss.example.test\n\
             HTTPUSER=reader\n\
             HTTPPASSWORD=s3cret\n\
             DEBUG=true\n\
             TIMEOUT=7\n",
        );

        assert_eq!(config.server, "https://nss.example.test");
        assert_eq!(config.user.as_deref(), Some("reader"));
        assert_eq!(config.password.as_deref(), Some("s3cret"));
        assert!(config.debug);
        assert_eq!(config.timeout, Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_parse_order_does_not_matter() {
        init();
        let forward = Config::parse("HTTPSERVER=http://a\nHTTPUSER=u\nHTTPPASSWORD=p\nDEBUG=true\nTIMEOUT=3\n");
        let backward = Config::parse("TIMEOUT=3\nDEBUG=true\nHTTPPASSWORD=p\nHTTPUSER=u\nHTTPSERVER=http://a\n");
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_parse_ignores_comments_and_unknown_keys() {
        init();
        let config = Config::parse(
            "# HTTPSERVER=http://commented.out\n\
             HTTPSERVER=http://example.test\n\
             PROXY=http://proxy\n\
             garbage line\n\
             \n",
        );

        assert_eq!(config.server, "http://example.test");
        assert_eq!(config.user, None);
        assert_eq!(config.password, None);
        assert!(!config.debug);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_parse_empty_credentials_are_none() {
        init();
        let config = Config::parse("HTTPSERVER=http://example.test\nHTTPUSER=\nHTTPPASSWORD=\n");
        assert_eq!(config.user, None);
        assert_eq!(config.password, None);
    }

    #[test]
    fn test_parse_takes_first_token() {
        init();
        let config = Config::parse("HTTPSERVER=  http://example.test trailing words\n");
        assert_eq!(config.server, "http://example.test");
    }

    #[test]
    fn test_parse_debug_only_when_true() {
        init();
        assert!(!Config::parse("DEBUG=yes\n").debug);
        assert!(!Config::parse("DEBUG=TRUE\n").debug);
        assert!(Config::parse("DEBUG=true\n").debug);
    }

    #[test]
    fn test_parse_timeout() {
        init();
        assert_eq!(Config::parse("TIMEOUT=0\n").timeout, None);
        assert_eq!(Config::parse("TIMEOUT=abc\n").timeout, None);
        assert_eq!(Config::parse("TIMEOUT=-5\n").timeout, None);
        assert_eq!(Config::parse("TIMEOUT=10\nTIMEOUT=bad\n").timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_parse_clamps_huge_timeout() {
        init();
        assert_eq!(
            Config::parse("TIMEOUT=18446744073709551615\n").timeout,
            Some(Duration::from_secs(MAX_TIMEOUT_SECS))
        );
        assert_eq!(
            Config::parse(&format!("TIMEOUT={MAX_TIMEOUT_SECS}\n")).timeout,
            Some(Duration::from_secs(MAX_TIMEOUT_SECS))
        );
    }

    #[test]
    fn test_logger_follows_debug_flag_only() {
        std::env::set_var("RUST_LOG", "debug");
        assert_eq!(Config::parse("DEBUG=false\n").logger().filter(), LevelFilter::Off);
        assert_eq!(Config::parse("DEBUG=true\n").logger().filter(), LevelFilter::Debug);

        std::env::set_var("RUST_LOG", "off");
        assert_eq!(Config::parse("DEBUG=true\n").logger().filter(), LevelFilter::Debug);
        std::env::remove_var("RUST_LOG");
    }

    #[test]
    fn test_parse_last_occurrence_wins() {
        init();
        let config = Config::parse("HTTPSERVER=http://first\nHTTPSERVER=http://second\n");
        assert_eq!(config.server, "http://second");
    }

    #[test]
    fn test_parse_rejects_oversized_lines_and_values() {
        init();
        let long_value = "a".repeat(MAX_CONFIG_VALUE_LEN + 1);
        let long_line = format!("HTTPUSER=u{}", " ".repeat(MAX_CONFIG_LINE_LEN));
        let text = format!("HTTPSERVER=http://ok\nHTTPSERVER={long_value}\n{long_line}\n");

        let config = Config::parse(&text);
        assert_eq!(config.server, "http://ok");
        assert_eq!(config.user, None);
    }

    #[test]
    fn test_debug_hides_password() {
        let config = Config::parse("HTTPUSER=reader\nHTTPPASSWORD=s3cret\n");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("reader"));
    }

    #[test]
    fn test_load_file() {
        init();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# nss_http").unwrap();
        writeln!(file, "HTTPSERVER=http://example.test").unwrap();
        writeln!(file, "TIMEOUT=2").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server, "http://example.test");
        assert_eq!(config.timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_load_missing_file() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("missing.conf"));
        assert!(matches!(result, Err(ConfigError::Open { .. })));
    }
}
