// Volume label field encoding

use super::constants::VOLUME_LABEL_LEN;
use fat32fmt_core::LogSink;

/// Encode `label` into the 11-byte BS_VolLab field.
///
/// Bytes are copied verbatim up to the first NUL or the end of the string;
/// the rest of the field is zero-filled. Labels longer than 11 bytes are
/// truncated with a warning on `sink`.
pub fn encode_volume_label(label: &str, sink: &dyn LogSink) -> [u8; VOLUME_LABEL_LEN] {
    let bytes = label.as_bytes();
    let significant = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());

    if significant > VOLUME_LABEL_LEN {
        sink.warn(&format!(
            "Label is larger than allowed {} chars, truncating to '{}'",
            VOLUME_LABEL_LEN,
            String::from_utf8_lossy(&bytes[..VOLUME_LABEL_LEN])
        ));
    }

    let mut field = [0u8; VOLUME_LABEL_LEN];
    let len = significant.min(VOLUME_LABEL_LEN);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// Decode a label field for display: stops at NUL, trims trailing spaces.
pub fn decode_volume_label(field: &[u8]) -> Option<String> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let label = String::from_utf8_lossy(&field[..end]).trim_end().to_string();
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}
