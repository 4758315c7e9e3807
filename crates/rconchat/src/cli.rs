use std::path::PathBuf;

use clap::Parser;

/// 將舊的聊天日誌透過 RCON 重播到 Minecraft 伺服器
#[derive(Debug, Parser)]
#[command(
    name = "rconchat",
    version,
    about = "Replay Minecraft chat logs in-game over RCON",
    after_help = "LOGFILE 結尾加上 '*'（例如 logs/*）會處理該目錄中的所有檔案"
)]
pub struct Cli {
    /// 日誌檔、日誌壓縮檔，或 `目錄/*`
    #[arg(value_name = "LOGFILE")]
    pub logfile: String,

    /// 要連線的伺服器主機（省略時使用設定檔的 host）
    #[arg(value_name = "HOST")]
    pub host: Option<String>,

    /// RCON 連接埠（預設 25575）
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// RCON 密碼
    #[arg(short = 'P', long, env = "RCON_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// 每送出一行後，需在終端機按 Enter 才繼續
    #[arg(short = 'i', long = "input")]
    pub input: bool,

    /// 判斷聊天行的標記（預設 `[CHAT]`）
    #[arg(long)]
    pub marker: Option<String>,

    /// 聊天內容在行中的起始字元位置（預設 40）
    #[arg(long)]
    pub offset: Option<usize>,

    /// tellraw 目標選擇器（預設 `@a`）
    #[arg(long)]
    pub target: Option<String>,

    /// 日誌文字編碼，例如 `utf-8`、`big5`（預設 utf-8）
    #[arg(long)]
    pub encoding: Option<String>,

    /// 每行之間自動延遲的毫秒數
    #[arg(long, value_name = "MS")]
    pub delay: Option<u64>,

    /// 不連線，只印出要送出的指令
    #[arg(long)]
    pub dry_run: bool,

    /// 設定檔路徑（預設為使用者設定目錄下的 rconchat/config.json）
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// 顯示除錯日誌
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_and_short_flags() {
        let cli = Cli::try_parse_from([
            "rconchat", "-p", "25580", "-P", "hunter2", "-i", "logs/*", "mc.example.net",
        ])
        .unwrap();
        assert_eq!(cli.logfile, "logs/*");
        assert_eq!(cli.host.as_deref(), Some("mc.example.net"));
        assert_eq!(cli.port, Some(25580));
        assert_eq!(cli.password.as_deref(), Some("hunter2"));
        assert!(cli.input);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_long_flags() {
        let cli = Cli::try_parse_from([
            "rconchat",
            "latest.log",
            "localhost",
            "--port",
            "1234",
            "--input",
            "--target",
            "@p",
            "--delay",
            "250",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.port, Some(1234));
        assert!(cli.input);
        assert_eq!(cli.target.as_deref(), Some("@p"));
        assert_eq!(cli.delay, Some(250));
        assert!(cli.dry_run);
    }

    #[test]
    fn test_host_is_optional() {
        let cli = Cli::try_parse_from(["rconchat", "latest.log"]).unwrap();
        assert_eq!(cli.host, None);
    }

    #[test]
    fn test_missing_logfile_is_an_error() {
        assert!(Cli::try_parse_from(["rconchat"]).is_err());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        assert!(Cli::try_parse_from(["rconchat", "a.log", "host", "-p", "99999"]).is_err());
    }
}
