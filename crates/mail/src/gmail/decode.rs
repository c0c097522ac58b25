//! Header and body decoding for Gmail message payloads
//!
//! Gmail hands back raw header values (which may contain RFC 2047
//! encoded-words such as `=?UTF-8?B?SGVsbG8=?=`) and base64url body data
//! with the padding stripped. This module turns both into plain strings.
//!
//! Header decoding is best-effort and never fails: anything that does not
//! decode cleanly is passed through as literal text. Body decoding is
//! strict and reports malformed data to the caller.

use std::borrow::Cow;
use std::sync::LazyLock;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use regex::{Captures, Regex};

use super::api::{Header, MessagePart, MessagePayload};

/// A complete encoded-word: `=?charset?encoding?text?=`
static ENCODED_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^=\?([^?]+)\?([QB])\?([^?]+)\?=$").expect("encoded-word pattern is valid")
});

/// A `Q` escape: `=` followed by two uppercase hex digits
static Q_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=([0-9A-F]{2})").expect("Q escape pattern is valid"));

/// Standard alphabet, padding optional, non-zero trailing bits accepted
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Errors produced while decoding message data
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unsupported charset: {0}")]
    UnsupportedCharset(String),

    #[error("unsupported encoded-word encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("not an encoded-word")]
    NotEncodedWord,
}

/// Character sets an encoded-word may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charset {
    Utf8,
    Latin1,
    Ascii,
    Utf16Le,
}

impl Charset {
    fn from_label(label: &str) -> Result<Self, DecodeError> {
        match label.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin1" | "iso-8859-1" | "binary" => Ok(Self::Latin1),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            "utf-16le" | "utf16le" | "ucs-2" | "ucs2" => Ok(Self::Utf16Le),
            _ => Err(DecodeError::UnsupportedCharset(label.to_string())),
        }
    }

    fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Ascii => bytes.iter().map(|&b| char::from(b & 0x7f)).collect(),
            Self::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }
}

/// Get the decoded value of the first header named `name`
///
/// Names are matched exactly (case-sensitive). Returns an empty string when
/// no header matches or the matching header has an empty value.
pub fn get_header(headers: &[Header], name: &str) -> String {
    match headers.iter().find(|h| h.name == name) {
        Some(header) if !header.value.is_empty() => decode_header_value(&header.value),
        _ => String::new(),
    }
}

/// Decode all RFC 2047 encoded-words in a raw header value
///
/// The value is cut after every `?=`, so adjacent encoded-words are decoded
/// separately and joined without whitespace. Segments that are not a
/// complete, decodable encoded-word are kept verbatim, which makes this a
/// no-op on plain text.
pub fn decode_header_value(raw: &str) -> String {
    raw.split_inclusive("?=")
        .map(|segment| decode_encoded_word(segment).unwrap_or(Cow::Borrowed(segment)))
        .collect()
}

/// Decode a single segment that must be exactly one encoded-word
fn decode_encoded_word(segment: &str) -> Result<Cow<'_, str>, DecodeError> {
    let caps = ENCODED_WORD
        .captures(segment)
        .ok_or(DecodeError::NotEncodedWord)?;
    let charset = &caps[1];
    let encoding = &caps[2];
    let text = &caps[3];

    match encoding.to_ascii_uppercase().as_str() {
        "B" => {
            let charset = Charset::from_label(charset)?;
            let bytes = STANDARD_LENIENT.decode(text.replace('-', "+").replace('_', "/"))?;
            Ok(Cow::Owned(charset.decode(&bytes)))
        }
        "Q" => Ok(Cow::Owned(decode_q(text))),
        other => Err(DecodeError::UnsupportedEncoding(other.to_string())),
    }
}

/// Decode `Q` text: `_` is a space, `=XX` is the character with code XX
///
/// Each escape maps to a single character; multi-byte sequences are not
/// reassembled through the declared charset.
fn decode_q(text: &str) -> String {
    let spaced = text.replace('_', " ");
    Q_ESCAPE
        .replace_all(&spaced, |caps: &Captures| {
            u8::from_str_radix(&caps[1], 16)
                .map(|b| char::from(b).to_string())
                .unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Decode base64url data as delivered by the Gmail API
///
/// `-` and `_` are mapped back to `+` and `/`, missing padding is restored,
/// and the decoded bytes are read as UTF-8 (invalid sequences are replaced).
/// Characters outside the alphabet are an error.
pub fn base64url_decode(data: &str) -> Result<String, DecodeError> {
    let mut standard: String = data
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    while standard.len() % 4 != 0 {
        standard.push('=');
    }

    let bytes = STANDARD_LENIENT.decode(standard)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extract the plain-text body from a message payload
///
/// For multipart payloads only the top-level parts are searched, and only
/// the first `text/plain` part is used. Otherwise the payload's own body
/// data is decoded. Returns an empty string when there is nothing to
/// decode.
pub fn extract_body(payload: &MessagePayload) -> Result<String, DecodeError> {
    if let Some(parts) = &payload.parts {
        return match find_plain_text_part(parts).and_then(part_data) {
            Some(data) => base64url_decode(data),
            None => Ok(String::new()),
        };
    }

    match payload.body.as_ref().and_then(|b| b.data.as_deref()) {
        Some(data) => base64url_decode(data),
        None => Ok(String::new()),
    }
}

fn find_plain_text_part(parts: &[MessagePart]) -> Option<&MessagePart> {
    parts
        .iter()
        .find(|p| p.mime_type.as_deref() == Some("text/plain"))
}

fn part_data(part: &MessagePart) -> Option<&str> {
    part.body.as_ref()?.data.as_deref()
}
