//! 日誌文字編碼模組
//!
//! 伺服器日誌通常是 UTF-8，但舊版 Windows 伺服器可能以系統編碼（如 Big5、GBK）寫入

use encoding_rs::{Encoding, UTF_8};

/// 依 WHATWG 標籤尋找編碼（例如 `utf-8`、`big5`、`gbk`、`windows-1252`）
///
/// # Example
/// ```
/// use rconcore::encoding::encoding_for_label;
///
/// assert!(encoding_for_label("big5").is_some());
/// assert!(encoding_for_label("no-such-encoding").is_none());
/// ```
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// 預設編碼
pub fn default_encoding() -> &'static Encoding {
    UTF_8
}

/// 將位元組解碼為字串
///
/// 開頭的 BOM 會被移除並優先於指定編碼；無效字元會被替換為 U+FFFD
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let text = decode_text("[CHAT] <Steve> héllo".as_bytes(), default_encoding());
        assert_eq!(text, "[CHAT] <Steve> héllo");
    }

    #[test]
    fn test_decode_big5() {
        // "你好" in Big5: 0xa7 0x41 0xa6 0x6e
        let big5 = encoding_for_label("big5").unwrap();
        let text = decode_text(&[0xa7, 0x41, 0xa6, 0x6e], big5);
        assert_eq!(text, "你好");
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let text = decode_text(&[b'o', b'k', 0xff], default_encoding());
        assert_eq!(text, "ok\u{FFFD}");
    }

    #[test]
    fn test_bom_is_stripped() {
        let text = decode_text(&[0xef, 0xbb, 0xbf, b'h', b'i'], default_encoding());
        assert_eq!(text, "hi");
    }

    #[test]
    fn test_label_lookup_is_case_insensitive() {
        assert_eq!(encoding_for_label("UTF-8"), Some(UTF_8));
        assert_eq!(encoding_for_label(" utf8 "), Some(UTF_8));
    }
}
