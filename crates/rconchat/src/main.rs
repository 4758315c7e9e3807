//! RCON 聊天重播工具
//!
//! 讀取伺服器日誌（純文字或 gzip），把聊天行以 tellraw 指令重播到線上伺服器

mod cli;
mod config;
mod output;
mod pace;

use std::io;

use clap::Parser;
use rconcore::{
    run_session, until_interrupted, CommandSink, DelayPacer, DryRunSink, NoPacing, Pacer,
    RconClient, RconError, ReplayError, ReplayEvent, ReplayReport, Replayer, SourceError,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;
use config::{ConfigError, FileConfig, Pacing, Settings};
use pace::TerminalPacer;

/// 應用程式錯誤
#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Rcon(#[from] RconError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error("無法建立執行環境: {0}")]
    Runtime(#[from] io::Error),
}

// 所有明確的結束路徑（包含錯誤）都以結束碼 0 離開
fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return;
        }
    };

    init_tracing(cli.verbose);

    if let Err(err) = start(cli) {
        println!("錯誤: {}", err);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn start(cli: Cli) -> Result<(), AppError> {
    let file_config = FileConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(cli, file_config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(&settings));

    // 終端機輸入在背景執行緒阻塞讀取，不等待它結束
    runtime.shutdown_background();
    result
}

async fn run(settings: &Settings) -> Result<(), AppError> {
    let files = settings.source.files()?;
    info!("共有 {} 個日誌檔待處理", files.len());

    if settings.dry_run {
        let mut sink = DryRunSink::new(io::stdout());
        let report = replay(settings, &mut sink, &files).await?;
        println!("{}", output::summary(&report));
        return Ok(());
    }

    // 連線與登入期間也要能以 Ctrl-C 正常結束
    let mut client = RconClient::new(settings.rcon.clone());
    let connected = until_interrupted(connect(&mut client, settings), interrupt_signal()).await;
    match connected {
        Some(Ok(())) => {}
        Some(Err(e)) => {
            client.disconnect().await;
            return Err(e.into());
        }
        None => {
            if let Some(line) = output::describe(&ReplayEvent::Interrupted, &settings.endpoint()) {
                println!("{}", line);
            }
            client.disconnect().await;
            return Ok(());
        }
    }
    println!("已連線到 {}", settings.endpoint());

    let report = replay(settings, &mut client, &files).await?;
    println!("{}", output::summary(&report));
    Ok(())
}

async fn connect(client: &mut RconClient, settings: &Settings) -> Result<(), RconError> {
    client.connect(&settings.host, settings.port).await?;
    client.login(&settings.password).await
}

/// 依設定選擇節奏控制並執行重播
async fn replay<S: CommandSink>(
    settings: &Settings,
    sink: &mut S,
    files: &[std::path::PathBuf],
) -> Result<ReplayReport, ReplayError> {
    match settings.pacing {
        Pacing::None => replay_with(settings, sink, files, &mut NoPacing).await,
        Pacing::Delay(delay) => {
            replay_with(settings, sink, files, &mut DelayPacer::new(delay)).await
        }
        Pacing::Interactive => {
            replay_with(settings, sink, files, &mut TerminalPacer::stdio()).await
        }
    }
}

async fn replay_with<S: CommandSink, P: Pacer>(
    settings: &Settings,
    sink: &mut S,
    files: &[std::path::PathBuf],
    pacer: &mut P,
) -> Result<ReplayReport, ReplayError> {
    let replayer = Replayer::new(settings.filter.clone(), settings.formatter.clone())
        .with_encoding(settings.encoding);
    let endpoint = settings.endpoint();
    let mut observer = |event: ReplayEvent| {
        if let Some(line) = output::describe(&event, &endpoint) {
            println!("{}", line);
        }
    };

    run_session(
        &replayer,
        sink,
        files,
        pacer,
        &mut observer,
        interrupt_signal(),
    )
    .await
}

/// 等待 Ctrl-C；無法註冊信號時永遠不觸發
async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("無法監聽中斷信號: {}", e);
        std::future::pending::<()>().await;
    }
}
