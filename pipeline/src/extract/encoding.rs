//! Character encoding detection for raw input files.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Below this chardet confidence the legacy western encoding is assumed
const MIN_CONFIDENCE: f32 = 0.9;

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 (with or without BOM) is reported as `utf-8`. Anything else is
/// handed to chardet; western labels are normalized to `iso-8859-1` or
/// `windows-1252`, and low-confidence guesses fall back to `windows-1252`.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let (charset, confidence, _) = chardet::detect(bytes);
    match charset.to_lowercase().as_str() {
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        // Not valid UTF-8, so whatever chardet thinks the bytes are not that
        "" | "ascii" | "utf-8" | "utf8" | "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ if confidence >= MIN_CONFIDENCE => charset,
        _ => "windows-1252".to_string(),
    }
}

/// Decode bytes using the given encoding label. A UTF-8 BOM is stripped.
/// Unknown labels fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let encoding = match encoding.to_lowercase().as_str() {
        // encoding_rs maps latin-1 to its windows-1252 superset, as browsers do
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => WINDOWS_1252,
        other => Encoding::for_label(other.as_bytes()).unwrap_or(UTF_8),
    };
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}
