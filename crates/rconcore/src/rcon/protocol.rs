//! RCON 封包格式
//!
//! 所有整數皆為 little endian：
//! `length (i32)` `request id (i32)` `type (i32)` `payload` `\0\0`
//! 其中 length 為 length 欄位之後的位元組數

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// 單一指令 payload 上限（伺服器端限制）
pub const MAX_COMMAND_PAYLOAD: usize = 1446;

/// 回應片段 payload 上限，剛好等於此值代表後面還有片段
pub const MAX_RESPONSE_PAYLOAD: usize = 4096;

/// id + type + 兩個結尾 NUL
const HEADER_AND_PADDING: usize = 4 + 4 + 2;

/// length 欄位允許的最小值（空 payload）
pub const MIN_PACKET_LENGTH: usize = HEADER_AND_PADDING;

/// length 欄位允許的最大值
pub const MAX_PACKET_LENGTH: usize = HEADER_AND_PADDING + MAX_RESPONSE_PAYLOAD + 4;

/// 驗證失敗時伺服器回傳的 request id
pub const AUTH_FAILURE_ID: i32 = -1;

/// 封包解析錯誤
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("封包長度不合法: {0}")]
    InvalidLength(i32),

    #[error("封包結尾缺少 NUL 填充")]
    MissingPadding,
}

/// 封包類型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// 伺服器回應（SERVERDATA_RESPONSE_VALUE）
    Response,
    /// 執行指令（SERVERDATA_EXECCOMMAND），驗證回應也使用此值
    Command,
    /// 登入驗證（SERVERDATA_AUTH）
    Login,
    /// 未知類型
    Unknown(i32),
}

impl PacketType {
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::Response,
            2 => Self::Command,
            3 => Self::Login,
            other => Self::Unknown(other),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::Response => 0,
            Self::Command => 2,
            Self::Login => 3,
            Self::Unknown(other) => other,
        }
    }
}

/// RCON 封包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub request_id: i32,
    pub kind: PacketType,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(request_id: i32, kind: PacketType, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            request_id,
            kind,
            payload: payload.into(),
        }
    }

    /// payload 以 UTF-8 解讀（不合法字元以 U+FFFD 取代）
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// 編碼為線路格式
    pub fn encode(&self) -> BytesMut {
        let length = HEADER_AND_PADDING + self.payload.len();
        let mut buf = BytesMut::with_capacity(4 + length);
        buf.put_i32_le(length as i32);
        buf.put_i32_le(self.request_id);
        buf.put_i32_le(self.kind.as_i32());
        buf.put_slice(&self.payload);
        buf.put_u8(0);
        buf.put_u8(0);
        buf
    }
}

/// 嘗試從緩衝區開頭解析一個完整封包
///
/// 資料不足時回傳 `Ok(None)`；成功時回傳封包與消耗的位元組數
pub fn decode(data: &[u8]) -> Result<Option<(Packet, usize)>, ProtocolError> {
    if data.len() < 4 {
        return Ok(None);
    }

    let mut header = &data[..4];
    let length = header.get_i32_le();
    if length < MIN_PACKET_LENGTH as i32 || length > MAX_PACKET_LENGTH as i32 {
        return Err(ProtocolError::InvalidLength(length));
    }

    let total = 4 + length as usize;
    if data.len() < total {
        return Ok(None);
    }

    let mut body = &data[4..total];
    let request_id = body.get_i32_le();
    let kind = PacketType::from_i32(body.get_i32_le());

    let payload_len = body.len() - 2;
    if body[payload_len..] != [0u8, 0] {
        return Err(ProtocolError::MissingPadding);
    }
    let payload = body[..payload_len].to_vec();

    Ok(Some((
        Packet {
            request_id,
            kind,
            payload,
        },
        total,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let packet = Packet::new(7, PacketType::Command, "list");
        let bytes = packet.encode();

        assert_eq!(&bytes[..4], &14i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &7i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &2i32.to_le_bytes());
        assert_eq!(&bytes[12..16], b"list");
        assert_eq!(&bytes[16..], &[0, 0]);
    }

    #[test]
    fn test_decode_partial() {
        let bytes = Packet::new(1, PacketType::Response, "hello").encode();
        assert_eq!(decode(&bytes[..3]), Ok(None));
        assert_eq!(decode(&bytes[..bytes.len() - 1]), Ok(None));
    }

    #[test]
    fn test_decode_two_packets_in_buffer() {
        let mut data = Packet::new(1, PacketType::Response, "a").encode().to_vec();
        data.extend_from_slice(&Packet::new(2, PacketType::Response, "").encode());

        let (first, used) = decode(&data).unwrap().unwrap();
        assert_eq!(first.request_id, 1);
        assert_eq!(first.payload_text(), "a");

        let (second, rest) = decode(&data[used..]).unwrap().unwrap();
        assert_eq!(second.request_id, 2);
        assert!(second.payload.is_empty());
        assert_eq!(used + rest, data.len());
    }

    #[test]
    fn test_decode_invalid_length() {
        let data = 3i32.to_le_bytes();
        assert_eq!(decode(&data), Err(ProtocolError::InvalidLength(3)));

        let data = 100_000i32.to_le_bytes();
        assert_eq!(decode(&data), Err(ProtocolError::InvalidLength(100_000)));
    }

    #[test]
    fn test_decode_missing_padding() {
        let mut data = Packet::new(1, PacketType::Response, "ok").encode().to_vec();
        let last = data.len() - 1;
        data[last] = b'!';
        assert_eq!(decode(&data), Err(ProtocolError::MissingPadding));
    }

    #[test]
    fn test_auth_failure_id_is_negative() {
        let data = Packet::new(AUTH_FAILURE_ID, PacketType::Command, "").encode();
        let (packet, _) = decode(&data).unwrap().unwrap();
        assert_eq!(packet.request_id, -1);
        assert_eq!(packet.kind, PacketType::Command);
    }
}
