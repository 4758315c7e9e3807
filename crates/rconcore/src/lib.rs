//! RCON Chat Core Library
//!
//! 將 Minecraft 伺服器日誌中的聊天訊息重播到線上伺服器：
//! - `rcon`: RCON 協定連線與指令執行
//! - `source`: 日誌檔案/目錄解析與 gzip 解壓
//! - `encoding`: 日誌文字編碼
//! - `chat`: 聊天行擷取與 tellraw 指令產生
//! - `replay`: 重播流程與節奏控制

pub mod chat;
pub mod encoding;
pub mod rcon;
pub mod replay;
pub mod source;

pub use chat::{ChatFilter, TellrawFormatter};
pub use rcon::{RconClient, RconConfig, RconError};
pub use replay::{
    run_session, until_interrupted, CommandSink, DelayPacer, DryRunSink, NoPacing, Pace, Pacer,
    ReplayError, ReplayEvent, ReplayOutcome, ReplayReport, ReplayStats, Replayer,
};
pub use source::{read_log_lines, LogFormat, LogSource, SourceError};
