use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Clean up the text of a single shown string.
///
/// Applies NFC normalization, ligature replacement, bullet standardization
/// and removal of replacement and control characters. Spaces are left
/// untouched: word boundaries between spans are decided by the layout pass.
pub fn cleanup_span_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    let ligatures = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
        ("\u{FB06}", "st"),
    ];
    for (lig, replacement) in &ligatures {
        result = result.replace(lig, replacement);
    }

    for bullet in ['\u{25CF}', '\u{25CB}', '\u{25A0}'] {
        result = result.replace(bullet, "\u{2022}");
    }

    // Tabs become spaces; every other control character is dropped.
    static RE_CONTROL: OnceLock<Regex> = OnceLock::new();
    let re_control =
        RE_CONTROL.get_or_init(|| Regex::new(r"[\x00-\x08\x0A-\x1F\x7F\u{FFFD}]").unwrap());
    result = re_control.replace_all(&result, "").replace('\t', " ");

    result
}
