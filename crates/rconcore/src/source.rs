//! 日誌來源模組
//!
//! 解析輸入路徑（單一檔案或 `目錄/*`），並讀取純文字或 gzip 壓縮的日誌

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use flate2::read::MultiGzDecoder;
use thiserror::Error;
use tracing::debug;

use crate::encoding::decode_text;

/// 目錄萬用字元標記
pub const WILDCARD: char = '*';

/// gzip 檔案開頭的魔術數字
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// 日誌來源錯誤
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("無法讀取 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("無法解壓縮 {path}: {source}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("找不到目錄: {0}")]
    DirectoryNotFound(PathBuf),
}

/// 日誌檔案格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Gzip,
}

impl LogFormat {
    /// 依檔案內容判斷格式
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(&GZIP_MAGIC) {
            Self::Gzip
        } else {
            Self::Plain
        }
    }
}

/// 輸入的日誌來源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    /// 單一日誌檔或壓縮檔
    File(PathBuf),
    /// 目錄中的所有檔案
    Directory(PathBuf),
}

impl LogSource {
    /// 從命令列參數解析；結尾為 `*` 代表目錄
    ///
    /// # Example
    /// ```
    /// use rconcore::source::LogSource;
    /// use std::path::PathBuf;
    ///
    /// assert_eq!(LogSource::from_arg("logs/*"), LogSource::Directory(PathBuf::from("logs/")));
    /// assert_eq!(LogSource::from_arg("latest.log"), LogSource::File(PathBuf::from("latest.log")));
    /// ```
    pub fn from_arg(arg: &str) -> Self {
        match arg.strip_suffix(WILDCARD) {
            Some("") => Self::Directory(PathBuf::from(".")),
            Some(dir) => Self::Directory(PathBuf::from(dir)),
            None => Self::File(PathBuf::from(arg)),
        }
    }

    /// 列出要處理的檔案
    ///
    /// 目錄中的檔案依名稱排序，子目錄會被略過
    pub fn files(&self) -> Result<Vec<PathBuf>, SourceError> {
        match self {
            Self::File(path) => Ok(vec![path.clone()]),
            Self::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(SourceError::DirectoryNotFound(dir.clone()));
                }

                let entries = fs::read_dir(dir).map_err(|source| SourceError::Io {
                    path: dir.clone(),
                    source,
                })?;

                let mut files = Vec::new();
                for entry in entries {
                    let entry = entry.map_err(|source| SourceError::Io {
                        path: dir.clone(),
                        source,
                    })?;
                    let path = entry.path();
                    if path.is_file() {
                        files.push(path);
                    } else {
                        debug!("略過非檔案項目: {}", path.display());
                    }
                }
                files.sort();
                Ok(files)
            }
        }
    }
}

/// 讀取整個日誌檔並切分為行
///
/// 檔案在回傳前就已關閉；gzip 依內容判斷，不看副檔名
pub fn read_log_lines(
    path: &Path,
    encoding: &'static Encoding,
) -> Result<Vec<String>, SourceError> {
    let raw = fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let format = LogFormat::detect(&raw);
    debug!("讀取 {} ({:?}, {} 位元組)", path.display(), format, raw.len());

    let bytes = match format {
        LogFormat::Plain => raw,
        LogFormat::Gzip => {
            let mut out = Vec::new();
            MultiGzDecoder::new(raw.as_slice())
                .read_to_end(&mut out)
                .map_err(|source| SourceError::Decompress {
                    path: path.to_path_buf(),
                    source,
                })?;
            out
        }
    };

    let text = decode_text(&bytes, encoding);
    Ok(text.lines().map(str::to_string).collect())
}
