//! 終端機手動節奏控制

use std::io::{self, Write};

use rconcore::{Pace, Pacer};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

/// 每行送出後顯示 `序號: ` 提示，等待使用者按 Enter
///
/// 輸入結束（EOF）或讀取失敗時停止重播
pub struct TerminalPacer<R, W> {
    lines: Lines<R>,
    prompt: W,
}

impl TerminalPacer<BufReader<Stdin>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), io::stdout())
    }
}

impl<R: AsyncBufRead + Unpin, W: Write> TerminalPacer<R, W> {
    pub fn new(input: R, prompt: W) -> Self {
        Self {
            lines: input.lines(),
            prompt,
        }
    }

    #[cfg(test)]
    fn prompt_output(&self) -> &W {
        &self.prompt
    }
}

impl<R: AsyncBufRead + Unpin, W: Write> Pacer for TerminalPacer<R, W> {
    async fn wait(&mut self, index: usize) -> Pace {
        let _ = write!(self.prompt, "{}: ", index);
        let _ = self.prompt.flush();

        match self.lines.next_line().await {
            Ok(Some(_)) => Pace::Continue,
            Ok(None) => {
                let _ = writeln!(self.prompt);
                Pace::Stop
            }
            Err(e) => {
                warn!("讀取終端機輸入失敗: {}", e);
                Pace::Stop
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enter_continues() {
        let mut pacer = TerminalPacer::new(&b"\n\n"[..], Vec::new());
        assert_eq!(pacer.wait(0).await, Pace::Continue);
        assert_eq!(pacer.wait(1).await, Pace::Continue);
        assert_eq!(pacer.prompt_output().as_slice(), b"0: 1: ");
    }

    #[tokio::test]
    async fn test_eof_stops() {
        let mut pacer = TerminalPacer::new(&b"\n"[..], Vec::new());
        assert_eq!(pacer.wait(0).await, Pace::Continue);
        assert_eq!(pacer.wait(1).await, Pace::Stop);
    }
}
