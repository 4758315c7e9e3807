//! 終端機狀態訊息

use rconcore::{ReplayEvent, ReplayReport};

/// 將重播事件轉為要印出的狀態行；不需輸出的事件回傳 `None`
pub fn describe(event: &ReplayEvent, endpoint: &str) -> Option<String> {
    match event {
        ReplayEvent::FileOpened { path, total_lines } => Some(format!(
            "目前日誌檔 {} 共有 {} 行",
            path.display(),
            total_lines
        )),
        ReplayEvent::ChatLinesFound { count, .. } => {
            Some(format!("目前日誌檔共有 {} 行聊天訊息", count))
        }
        ReplayEvent::CommandFailed { response, .. } => Some(response.trim_end().to_string()),
        ReplayEvent::CommandSent { .. } => None,
        ReplayEvent::FileFinished { .. } => Some("關閉目前日誌檔，開啟下一個檔案".to_string()),
        ReplayEvent::Interrupted => Some(format!("\n正在中斷與 {} 的連線...", endpoint)),
    }
}

/// 結束時的摘要
pub fn summary(report: &ReplayReport) -> String {
    let stats = &report.stats;
    format!(
        "共處理 {} 個檔案、{} 行聊天訊息，已送出 {} 則（{} 則失敗）",
        stats.files, stats.chat_lines, stats.commands_sent, stats.failed_commands
    )
}
