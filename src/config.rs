//! Server configuration, parsed from command-line flags.

use crate::storage::DEFAULT_SHARDS;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use std::path::PathBuf;
use thiserror::Error;

/// Password used when `--auth` is given without `--password`.
pub const DEFAULT_PASSWORD: &str = "password";

/// Directory the transaction log goes to unless told otherwise.
pub const DEFAULT_TX_LOG_DIR: &str = "tx_logs";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Number of storage shards
    pub shards: usize,
    /// Password clients must send before issuing commands
    pub auth: Option<String>,
    /// Directory for the transaction log, `None` to disable it
    pub tx_log: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            shards: DEFAULT_SHARDS,
            auth: None,
            tx_log: Some(PathBuf::from(DEFAULT_TX_LOG_DIR)),
        }
    }
}

/// What the binary should do after reading its flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Run(Config),
    Help,
    Version,
}

/// Errors raised while reading flags.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for {flag}")]
    InvalidValue { flag: String, value: String },

    #[error("shard count must be at least 1")]
    ZeroShards,

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

impl Config {
    /// Parses flags, excluding the program name.
    pub fn from_args<I>(args: I) -> Result<CliAction, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    config.host = value_for(&arg, &mut args)?;
                }
                "--port" | "-p" => {
                    let value = value_for(&arg, &mut args)?;
                    config.port = parse_value(&arg, value)?;
                }
                "--shards" | "-n" => {
                    let value = value_for(&arg, &mut args)?;
                    config.shards = parse_value(&arg, value)?;
                    if config.shards == 0 {
                        return Err(ConfigError::ZeroShards);
                    }
                }
                "--auth" => {
                    if config.auth.is_none() {
                        config.auth = Some(DEFAULT_PASSWORD.to_string());
                    }
                }
                "--password" => {
                    config.auth = Some(value_for(&arg, &mut args)?);
                }
                "--tx-log-dir" => {
                    config.tx_log = Some(PathBuf::from(value_for(&arg, &mut args)?));
                }
                "--no-tx-log" => {
                    config.tx_log = None;
                }
                "--help" => return Ok(CliAction::Help),
                "--version" | "-v" => return Ok(CliAction::Version),
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }

        Ok(CliAction::Run(config))
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn value_for(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<String, ConfigError> {
    args.next()
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        flag: flag.to_string(),
        value,
    })
}

/// Usage text printed for `--help`.
pub fn help_text() -> String {
    format!(
        r#"
shardcache - A sharded in-memory cache with scalar, dictionary and list stores

USAGE:
    shardcache [OPTIONS]

OPTIONS:
    -h, --host <HOST>         Host to bind to (default: {host})
    -p, --port <PORT>         Port to listen on (default: {port})
    -n, --shards <N>          Number of storage shards (default: {shards})
        --auth                Require the password '{password}' before commands
        --password <PW>       Require the given password before commands
        --tx-log-dir <DIR>    Transaction log directory (default: {tx_dir})
        --no-tx-log           Do not record writes
    -v, --version             Print version information
        --help                Print this help message

EXAMPLES:
    shardcache                          # Start on {host}:{port}
    shardcache --port 9000 --shards 64  # More shards, another port
    shardcache --password hunter2       # Clients must authorize first

CONNECTING:
    Any line-based TCP client works:
    $ nc {host} {port}
    Successful connection
    SET name "Ariz K" 10m
    Success
    GET name
    Ariz K
"#,
        host = DEFAULT_HOST,
        port = DEFAULT_PORT,
        shards = DEFAULT_SHARDS,
        password = DEFAULT_PASSWORD,
        tx_dir = DEFAULT_TX_LOG_DIR,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliAction, ConfigError> {
        Config::from_args(args.iter().map(|s| s.to_string()))
    }

    fn run_config(args: &[&str]) -> Config {
        match parse(args) {
            Ok(CliAction::Run(config)) => config,
            other => panic!("expected a config, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let config = run_config(&[]);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.shards, 32);
        assert_eq!(config.auth, None);
        assert_eq!(config.tx_log, Some(PathBuf::from("tx_logs")));
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
    }

    #[test]
    fn test_all_flags() {
        let config = run_config(&[
            "-h",
            "0.0.0.0",
            "--port",
            "9000",
            "-n",
            "8",
            "--password",
            "secret",
            "--tx-log-dir",
            "/tmp/logs",
        ]);

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.shards, 8);
        assert_eq!(config.auth.as_deref(), Some("secret"));
        assert_eq!(config.tx_log, Some(PathBuf::from("/tmp/logs")));
    }

    #[test]
    fn test_auth_uses_default_password() {
        assert_eq!(run_config(&["--auth"]).auth.as_deref(), Some("password"));

        // An explicit password wins regardless of order
        let config = run_config(&["--password", "pw", "--auth"]);
        assert_eq!(config.auth.as_deref(), Some("pw"));
    }

    #[test]
    fn test_no_tx_log() {
        assert_eq!(run_config(&["--no-tx-log"]).tx_log, None);
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["--help"]), Ok(CliAction::Help));
        assert_eq!(parse(&["-v"]), Ok(CliAction::Version));
        assert!(help_text().contains("--shards"));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse(&["--port"]),
            Err(ConfigError::MissingValue("--port".into()))
        );
        assert_eq!(
            parse(&["--port", "http"]),
            Err(ConfigError::InvalidValue {
                flag: "--port".into(),
                value: "http".into()
            })
        );
        assert_eq!(parse(&["--shards", "0"]), Err(ConfigError::ZeroShards));
        assert_eq!(
            parse(&["--verbose"]),
            Err(ConfigError::UnknownArgument("--verbose".into()))
        );
    }
}
