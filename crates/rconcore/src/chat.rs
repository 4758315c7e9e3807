//! 聊天訊息擷取
//!
//! 從伺服器日誌中挑出聊天行，並轉成 `tellraw` 指令

use serde_json::json;

/// 預設聊天標記
pub const DEFAULT_MARKER: &str = "[CHAT]";

/// 預設聊天內容起始位置（字元）
///
/// `[12:34:56] [Render thread/INFO]: [CHAT] ` 剛好 40 個字元
pub const DEFAULT_OFFSET: usize = 40;

/// 預設 tellraw 目標選擇器
pub const DEFAULT_TARGET: &str = "@a";

/// 聊天行過濾器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatFilter {
    /// 判斷是否為聊天行的子字串
    pub marker: String,
    /// 聊天內容在行中的起始字元位置
    pub offset: usize,
}

impl ChatFilter {
    pub fn new(marker: impl Into<String>, offset: usize) -> Self {
        Self {
            marker: marker.into(),
            offset,
        }
    }

    pub fn is_chat(&self, line: &str) -> bool {
        line.contains(&self.marker)
    }

    /// 擷取聊天內容；行長不足時回傳空字串
    ///
    /// # Example
    /// ```
    /// use rconcore::chat::ChatFilter;
    ///
    /// let filter = ChatFilter::default();
    /// let line = "[12:34:56] [Render thread/INFO]: [CHAT] <Steve> hello";
    /// assert_eq!(filter.extract(line).as_deref(), Some("<Steve> hello"));
    /// assert_eq!(filter.extract("[12:34:56] [Server thread/INFO]: Done"), None);
    /// ```
    pub fn extract(&self, line: &str) -> Option<String> {
        if !self.is_chat(line) {
            return None;
        }
        let text: String = line.chars().skip(self.offset).collect();
        Some(text.trim().to_string())
    }

    /// 依序擷取所有聊天行
    pub fn chat_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<String> {
        lines
            .iter()
            .filter_map(|line| self.extract(line.as_ref()))
            .collect()
    }
}

impl Default for ChatFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER, DEFAULT_OFFSET)
    }
}

/// `tellraw` 指令產生器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TellrawFormatter {
    /// 目標選擇器，例如 `@a`
    pub target: String,
}

impl TellrawFormatter {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// 產生 `tellraw <target> [{"text":"..."}]`，文字會經過 JSON 跳脫
    pub fn format(&self, text: &str) -> String {
        let component = json!([{ "text": text }]);
        format!("tellraw {} {}", self.target, component)
    }
}

impl Default for TellrawFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}
