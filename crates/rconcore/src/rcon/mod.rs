//! RCON 協定模組
//!
//! 實作 Minecraft 遠端主控台（RCON）的封包格式與連線管理

mod client;
mod protocol;

pub use client::{strip_formatting, ConnectionState, RconClient, RconConfig, RconError};
pub use protocol::{decode, Packet, PacketType, ProtocolError, MAX_COMMAND_PAYLOAD};
