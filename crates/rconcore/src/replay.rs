//! 重播流程
//!
//! 逐檔讀取日誌、挑出聊天行，並以 `tellraw` 指令送到伺服器。
//! 指令的接收端（[`CommandSink`]）與節奏控制（[`Pacer`]）都是 trait，
//! 方便以 RCON 連線、dry-run 或測試替身替換。

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use encoding_rs::Encoding;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chat::{ChatFilter, TellrawFormatter};
use crate::encoding::default_encoding;
use crate::rcon::{RconClient, RconError};
use crate::source::{read_log_lines, SourceError};

/// 重播錯誤
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Rcon(#[from] RconError),
}

/// 指令接收端
#[allow(async_fn_in_trait)]
pub trait CommandSink {
    /// 執行指令並回傳伺服器回應；空字串代表成功
    async fn execute(&mut self, command: &str) -> Result<String, RconError>;

    /// 關閉連線（可重複呼叫）
    async fn close(&mut self);
}

impl CommandSink for RconClient {
    async fn execute(&mut self, command: &str) -> Result<String, RconError> {
        self.command(command).await
    }

    async fn close(&mut self) {
        self.disconnect().await;
    }
}

/// 不連線，只把指令寫到輸出
pub struct DryRunSink<W: Write> {
    writer: W,
}

impl<W: Write> DryRunSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CommandSink for DryRunSink<W> {
    async fn execute(&mut self, command: &str) -> Result<String, RconError> {
        writeln!(self.writer, "{}", command)?;
        Ok(String::new())
    }

    async fn close(&mut self) {
        let _ = self.writer.flush();
    }
}

/// 節奏控制的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Continue,
    Stop,
}

/// 每送出一行後的節奏控制
#[allow(async_fn_in_trait)]
pub trait Pacer {
    /// `index` 為目前檔案中聊天行的序號（從 0 開始）
    async fn wait(&mut self, index: usize) -> Pace;
}

/// 不暫停
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPacing;

impl Pacer for NoPacing {
    async fn wait(&mut self, _index: usize) -> Pace {
        Pace::Continue
    }
}

/// 每行之間固定延遲
#[derive(Debug, Clone, Copy)]
pub struct DelayPacer {
    delay: Duration,
}

impl DelayPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Pacer for DelayPacer {
    async fn wait(&mut self, _index: usize) -> Pace {
        tokio::time::sleep(self.delay).await;
        Pace::Continue
    }
}

/// 重播過程中的事件，供呼叫端輸出狀態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEvent {
    /// 已讀取檔案
    FileOpened { path: PathBuf, total_lines: usize },
    /// 檔案中的聊天行數
    ChatLinesFound { path: PathBuf, count: usize },
    /// 指令已送出
    CommandSent { index: usize, command: String },
    /// 伺服器回傳了非空回應，或指令無法送出（視為失敗，但繼續處理）
    CommandFailed { index: usize, response: String },
    /// 檔案處理完畢
    FileFinished { path: PathBuf },
    /// 操作者中斷，即將斷線
    Interrupted,
}

/// 重播結束的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// 所有檔案處理完畢
    Completed,
    /// 節奏控制要求停止（例如輸入結束）
    Stopped,
    /// 操作者中斷
    Interrupted,
}

/// 統計數據
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub files: usize,
    pub lines: usize,
    pub chat_lines: usize,
    pub commands_sent: usize,
    pub failed_commands: usize,
}

/// 重播結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    pub outcome: ReplayOutcome,
    pub stats: ReplayStats,
}

/// 重播器
#[derive(Debug, Clone)]
pub struct Replayer {
    filter: ChatFilter,
    formatter: TellrawFormatter,
    encoding: &'static Encoding,
}

impl Replayer {
    pub fn new(filter: ChatFilter, formatter: TellrawFormatter) -> Self {
        Self {
            filter,
            formatter,
            encoding: default_encoding(),
        }
    }

    /// 設定日誌文字編碼
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// 讀取單一檔案並產生要送出的指令
    pub fn commands_for(&self, path: &Path) -> Result<(usize, Vec<String>), SourceError> {
        let lines = read_log_lines(path, self.encoding)?;
        let commands = self
            .filter
            .chat_lines(&lines)
            .iter()
            .map(|text| self.formatter.format(text))
            .collect();
        Ok((lines.len(), commands))
    }

    /// 依序重播所有檔案
    ///
    /// 統計寫入 `stats`，即使 future 中途被丟棄也保留已完成的部分
    pub async fn run<S, P, F>(
        &self,
        sink: &mut S,
        files: &[PathBuf],
        pacer: &mut P,
        stats: &mut ReplayStats,
        observer: &mut F,
    ) -> Result<ReplayOutcome, ReplayError>
    where
        S: CommandSink,
        P: Pacer,
        F: FnMut(ReplayEvent),
    {
        for path in files {
            // 檔案內容一次讀入，送出指令時檔案已關閉
            let (total_lines, commands) = self.commands_for(path)?;
            stats.files += 1;
            stats.lines += total_lines;
            stats.chat_lines += commands.len();
            info!(
                "{}: {} 行，其中 {} 行聊天",
                path.display(),
                total_lines,
                commands.len()
            );

            observer(ReplayEvent::FileOpened {
                path: path.clone(),
                total_lines,
            });
            observer(ReplayEvent::ChatLinesFound {
                path: path.clone(),
                count: commands.len(),
            });

            for (index, command) in commands.into_iter().enumerate() {
                let result = sink.execute(&command).await;
                let failure = match result {
                    Ok(response) => {
                        stats.commands_sent += 1;
                        debug!("指令 #{} 已送出", index);
                        observer(ReplayEvent::CommandSent { index, command });
                        (!response.trim().is_empty()).then_some(response)
                    }
                    // 單一指令的失敗，不影響後續行
                    Err(err @ RconError::CommandTooLong { .. }) => Some(err.to_string()),
                    Err(err) => return Err(err.into()),
                };

                if let Some(response) = failure {
                    warn!("指令 #{} 失敗: {}", index, response);
                    stats.failed_commands += 1;
                    observer(ReplayEvent::CommandFailed { index, response });
                }

                if pacer.wait(index).await == Pace::Stop {
                    info!("節奏控制要求停止");
                    return Ok(ReplayOutcome::Stopped);
                }
            }

            observer(ReplayEvent::FileFinished { path: path.clone() });
        }

        Ok(ReplayOutcome::Completed)
    }
}

impl Default for Replayer {
    fn default() -> Self {
        Self::new(ChatFilter::default(), TellrawFormatter::default())
    }
}

/// 執行 `future` 直到完成或 `interrupt` 觸發；被中斷時回傳 `None`
///
/// `future` 被中斷時會直接丟棄，它借用的資源隨即釋放
pub async fn until_interrupted<T, F, I>(future: F, interrupt: I) -> Option<T>
where
    F: Future<Output = T>,
    I: Future<Output = ()>,
{
    tokio::select! {
        value = future => Some(value),
        _ = interrupt => None,
    }
}

/// 執行一次完整的重播工作階段
///
/// 重播與 `interrupt` 競速；不論結果為何（完成、停止、中斷或錯誤），
/// 結束前都會關閉 `sink` 一次
pub async fn run_session<S, P, F, I>(
    replayer: &Replayer,
    sink: &mut S,
    files: &[PathBuf],
    pacer: &mut P,
    observer: &mut F,
    interrupt: I,
) -> Result<ReplayReport, ReplayError>
where
    S: CommandSink,
    P: Pacer,
    F: FnMut(ReplayEvent),
    I: Future<Output = ()>,
{
    let mut stats = ReplayStats::default();

    let replay = replayer.run(sink, files, pacer, &mut stats, observer);
    let result = match until_interrupted(replay, interrupt).await {
        Some(result) => result,
        None => {
            info!("收到中斷信號");
            Ok(ReplayOutcome::Interrupted)
        }
    };

    if matches!(result, Ok(ReplayOutcome::Interrupted)) {
        observer(ReplayEvent::Interrupted);
    }
    sink.close().await;

    result.map(|outcome| ReplayReport { outcome, stats })
}
