//! RCON 客戶端
//!
//! 非同步 RCON 連線管理：連線、驗證、執行指令

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::protocol::{
    decode, Packet, PacketType, ProtocolError, AUTH_FAILURE_ID, MAX_COMMAND_PAYLOAD,
    MAX_RESPONSE_PAYLOAD,
};

lazy_static! {
    /// Minecraft 格式碼（§ 加上一個顏色/樣式字元）
    static ref FORMATTING_CODE: Regex = Regex::new(r"§[0-9a-fk-orA-FK-OR]").unwrap();
}

/// RCON 客戶端錯誤
#[derive(Debug, Error)]
pub enum RconError {
    #[error("連線失敗: {0}")]
    ConnectionFailed(#[from] io::Error),

    #[error("連線逾時")]
    Timeout,

    #[error("未連線")]
    NotConnected,

    #[error("伺服器已關閉連線")]
    ConnectionClosed,

    #[error("DNS 解析失敗: {0}")]
    DnsResolutionFailed(String),

    #[error("RCON 密碼錯誤")]
    AuthenticationFailed,

    #[error("指令過長: {len} 位元組（上限 {max}）")]
    CommandTooLong { len: usize, max: usize },

    #[error("非預期的回應 id: 預期 {expected}，收到 {actual}")]
    UnexpectedResponse { expected: i32, actual: i32 },

    #[error("協定錯誤: {0}")]
    Protocol(#[from] ProtocolError),
}

/// 連線狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Authenticated,
}

/// RCON 客戶端配置
#[derive(Debug, Clone)]
pub struct RconConfig {
    /// 連線逾時
    pub connect_timeout: Duration,
    /// 等待單一回應封包的逾時
    pub read_timeout: Duration,
    /// 讀取緩衝區大小
    pub read_buffer_size: usize,
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            read_buffer_size: 8192,
        }
    }
}

/// RCON 客戶端
pub struct RconClient {
    stream: Option<TcpStream>,
    config: RconConfig,
    state: ConnectionState,
    /// 尚未解析成封包的位元組
    read_buffer: BytesMut,
    /// 下一個 request id
    next_id: i32,
}

impl RconClient {
    /// 創建新的 RCON 客戶端
    pub fn new(config: RconConfig) -> Self {
        Self {
            stream: None,
            config,
            state: ConnectionState::Disconnected,
            read_buffer: BytesMut::new(),
            next_id: 1,
        }
    }

    /// 獲取連線狀態
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// 連線到伺服器
    ///
    /// # Arguments
    /// * `host` - 主機名稱或 IP
    /// * `port` - RCON 連接埠
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<(), RconError> {
        self.state = ConnectionState::Connecting;
        info!("正在連線到 {}:{}", host, port);

        let addr = format!("{}:{}", host, port);
        let socket_addrs: Vec<SocketAddr> = match tokio::net::lookup_host(&addr).await {
            Ok(addrs) => addrs.collect(),
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(RconError::DnsResolutionFailed(e.to_string()));
            }
        };

        let Some(target) = socket_addrs.first() else {
            self.state = ConnectionState::Disconnected;
            return Err(RconError::DnsResolutionFailed(format!(
                "無法解析主機: {}",
                host
            )));
        };

        debug!("已解析到位址: {:?}", socket_addrs);

        let stream = match timeout(self.config.connect_timeout, TcpStream::connect(target)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                self.state = ConnectionState::Disconnected;
                return Err(RconError::ConnectionFailed(e));
            }
            Err(_) => {
                self.state = ConnectionState::Disconnected;
                return Err(RconError::Timeout);
            }
        };

        stream.set_nodelay(true)?;

        info!("已連線到 {}:{}", host, port);
        self.stream = Some(stream);
        self.read_buffer.clear();
        self.state = ConnectionState::Connected;

        Ok(())
    }

    /// 以密碼登入
    pub async fn login(&mut self, password: &str) -> Result<(), RconError> {
        let id = self.allocate_id();
        self.send_packet(&Packet::new(id, PacketType::Login, password))
            .await?;

        // 部分伺服器會先送一個空的 RESPONSE 封包
        loop {
            let packet = self.read_packet().await?;
            if packet.request_id == AUTH_FAILURE_ID {
                warn!("RCON 驗證失敗");
                return Err(RconError::AuthenticationFailed);
            }
            if packet.request_id != id {
                return Err(RconError::UnexpectedResponse {
                    expected: id,
                    actual: packet.request_id,
                });
            }
            if packet.kind == PacketType::Command {
                break;
            }
        }

        self.state = ConnectionState::Authenticated;
        info!("RCON 驗證成功");
        Ok(())
    }

    /// 執行指令並回傳伺服器回應（已移除格式碼）
    pub async fn command(&mut self, command: &str) -> Result<String, RconError> {
        if command.len() > MAX_COMMAND_PAYLOAD {
            return Err(RconError::CommandTooLong {
                len: command.len(),
                max: MAX_COMMAND_PAYLOAD,
            });
        }

        let id = self.allocate_id();
        self.send_packet(&Packet::new(id, PacketType::Command, command))
            .await?;
        debug!("已發送: {}", command);

        let mut response = Vec::new();
        loop {
            let packet = self.read_packet().await?;
            if packet.request_id != id {
                return Err(RconError::UnexpectedResponse {
                    expected: id,
                    actual: packet.request_id,
                });
            }
            let more = packet.payload.len() >= MAX_RESPONSE_PAYLOAD;
            response.extend_from_slice(&packet.payload);
            if !more {
                break;
            }
        }

        let text = String::from_utf8_lossy(&response);
        Ok(strip_formatting(&text))
    }

    /// 斷開連線（可重複呼叫）
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            info!("已斷開連線");
        }
        self.read_buffer.clear();
        self.state = ConnectionState::Disconnected;
    }

    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        // 保留 -1 給驗證失敗
        self.next_id = if self.next_id == i32::MAX {
            1
        } else {
            self.next_id + 1
        };
        id
    }

    async fn send_packet(&mut self, packet: &Packet) -> Result<(), RconError> {
        let stream = self.stream.as_mut().ok_or(RconError::NotConnected)?;
        stream.write_all(&packet.encode()).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_packet(&mut self) -> Result<Packet, RconError> {
        let mut chunk = vec![0u8; self.config.read_buffer_size];
        loop {
            if let Some((packet, consumed)) = decode(&self.read_buffer)? {
                self.read_buffer.advance(consumed);
                return Ok(packet);
            }

            let stream = self.stream.as_mut().ok_or(RconError::NotConnected)?;
            let n = timeout(self.config.read_timeout, stream.read(&mut chunk))
                .await
                .map_err(|_| RconError::Timeout)??;

            if n == 0 {
                self.stream = None;
                self.state = ConnectionState::Disconnected;
                return Err(RconError::ConnectionClosed);
            }
            self.read_buffer.extend_from_slice(&chunk[..n]);
        }
    }
}

impl Default for RconClient {
    fn default() -> Self {
        Self::new(RconConfig::default())
    }
}

/// 移除 Minecraft 格式碼（例如 `§c`）
pub fn strip_formatting(input: &str) -> String {
    FORMATTING_CODE.replace_all(input, "").into_owned()
}
