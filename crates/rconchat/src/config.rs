//! 設定檔與執行參數
//!
//! 優先順序：命令列參數 > 環境變數（密碼）> 設定檔 > 內建預設值

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use encoding_rs::Encoding;
use rconcore::chat::{DEFAULT_MARKER, DEFAULT_OFFSET, DEFAULT_TARGET};
use rconcore::encoding::{default_encoding, encoding_for_label};
use rconcore::{ChatFilter, LogSource, RconConfig, TellrawFormatter};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cli::Cli;

/// 預設 RCON 連接埠
pub const DEFAULT_PORT: u16 = 25575;

/// 設定錯誤
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("無法讀取設定檔 {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("設定檔格式錯誤 {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("未知的文字編碼: {0}")]
    UnknownEncoding(String),

    #[error("未指定伺服器主機（命令列 HOST 或設定檔 host）")]
    MissingHost,
}

/// 設定檔內容（所有欄位皆可省略）
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    10
}

impl FileConfig {
    /// 預設設定檔路徑
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rconchat").join("config.json"))
    }

    /// 載入設定檔
    ///
    /// 指定路徑時讀取或解析失敗皆為錯誤；
    /// 使用預設路徑時檔案不存在或格式錯誤則退回預設值
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let Some(path) = Self::default_path() else {
            return Ok(Self::with_defaults());
        };
        if !path.exists() {
            debug!("未找到設定檔 {}，使用預設值", path.display());
            return Ok(Self::with_defaults());
        }

        match Self::load_from(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("{}，使用預設值", e);
                Ok(Self::with_defaults())
            }
        }
    }

    /// 從指定檔案載入
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 與反序列化空物件 `{}` 的結果相同
    pub fn with_defaults() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            ..Default::default()
        }
    }
}

/// 每行之間的節奏
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    None,
    Interactive,
    Delay(Duration),
}

/// 合併後的執行參數
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: LogSource,
    pub host: String,
    pub port: u16,
    pub password: String,
    pub pacing: Pacing,
    pub dry_run: bool,
    pub filter: ChatFilter,
    pub formatter: TellrawFormatter,
    pub encoding: &'static Encoding,
    pub rcon: RconConfig,
}

impl Settings {
    /// 合併命令列參數與設定檔
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let encoding = match cli.encoding.or(file.encoding) {
            Some(label) => {
                encoding_for_label(&label).ok_or(ConfigError::UnknownEncoding(label))?
            }
            None => default_encoding(),
        };

        // -i 優先於自動延遲
        let pacing = if cli.input {
            Pacing::Interactive
        } else {
            match cli.delay.or(file.delay_ms) {
                Some(ms) if ms > 0 => Pacing::Delay(Duration::from_millis(ms)),
                _ => Pacing::None,
            }
        };

        let host = cli.host.or(file.host).ok_or(ConfigError::MissingHost)?;

        let password = cli.password.or(file.password).unwrap_or_else(|| {
            warn!("未提供 RCON 密碼，將以空密碼登入");
            String::new()
        });

        Ok(Self {
            source: LogSource::from_arg(&cli.logfile),
            host,
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            password,
            pacing,
            dry_run: cli.dry_run,
            filter: ChatFilter::new(
                cli.marker
                    .or(file.marker)
                    .unwrap_or_else(|| DEFAULT_MARKER.to_string()),
                cli.offset.or(file.offset).unwrap_or(DEFAULT_OFFSET),
            ),
            formatter: TellrawFormatter::new(
                cli.target
                    .or(file.target)
                    .unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            ),
            encoding,
            rcon: RconConfig {
                connect_timeout: Duration::from_secs(file.connect_timeout_secs),
                read_timeout: Duration::from_secs(file.read_timeout_secs),
                ..RconConfig::default()
            },
        })
    }

    /// `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["rconchat"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(
            cli(&["latest.log", "localhost", "-P", "pw"]),
            FileConfig::with_defaults(),
        )
        .unwrap();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.password, "pw");
        assert_eq!(settings.pacing, Pacing::None);
        assert_eq!(settings.filter, ChatFilter::default());
        assert_eq!(settings.formatter, TellrawFormatter::default());
        assert_eq!(settings.encoding, default_encoding());
        assert_eq!(settings.endpoint(), "localhost:25575");
        assert_eq!(settings.rcon.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            port: Some(30000),
            target: Some("@p".to_string()),
            delay_ms: Some(500),
            ..FileConfig::with_defaults()
        };
        let settings = Settings::resolve(
            cli(&["logs/*", "mc", "-p", "25580", "-P", "x"]),
            file,
        )
        .unwrap();
        assert_eq!(settings.port, 25580);
        assert_eq!(settings.formatter.target, "@p");
        assert_eq!(settings.pacing, Pacing::Delay(Duration::from_millis(500)));
        assert_eq!(settings.source, LogSource::Directory(PathBuf::from("logs/")));
    }

    #[test]
    fn test_interactive_beats_delay() {
        let settings = Settings::resolve(
            cli(&["a.log", "mc", "-P", "x", "-i", "--delay", "100"]),
            FileConfig::with_defaults(),
        )
        .unwrap();
        assert_eq!(settings.pacing, Pacing::Interactive);
    }

    #[test]
    fn test_unknown_encoding() {
        let result = Settings::resolve(
            cli(&["a.log", "mc", "-P", "x", "--encoding", "klingon"]),
            FileConfig::with_defaults(),
        );
        assert!(matches!(result, Err(ConfigError::UnknownEncoding(_))));
    }

    #[test]
    fn test_host_from_file() {
        let file = FileConfig {
            host: Some("mc.example.net".to_string()),
            ..FileConfig::with_defaults()
        };
        let settings = Settings::resolve(cli(&["latest.log", "-P", "x"]), file.clone()).unwrap();
        assert_eq!(settings.endpoint(), "mc.example.net:25575");

        // 命令列優先
        let settings = Settings::resolve(cli(&["latest.log", "other", "-P", "x"]), file).unwrap();
        assert_eq!(settings.host, "other");
    }

    #[test]
    fn test_missing_host() {
        let result =
            Settings::resolve(cli(&["latest.log", "-P", "x"]), FileConfig::with_defaults());
        assert!(matches!(result, Err(ConfigError::MissingHost)));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "host": "mc", "port": 25999, "marker": "[Chat]", "read_timeout_secs": 3 }"#,
        )
        .unwrap();

        let config = FileConfig::load(Some(&path)).unwrap();
        assert_eq!(config.host.as_deref(), Some("mc"));
        assert_eq!(config.port, Some(25999));
        assert_eq!(config.marker.as_deref(), Some("[Chat]"));
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.read_timeout_secs, 3);
    }

    #[test]
    fn test_empty_object_matches_defaults() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FileConfig::with_defaults());
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let dir = tempdir().unwrap();
        let result = FileConfig::load(Some(&dir.path().join("nope.json")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_explicit_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ port: ").unwrap();
        let result = FileConfig::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
