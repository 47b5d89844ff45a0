//! Script-based language identification.
//!
//! Counts characters per Unicode block and picks the dominant script. Works
//! without any vendor and is most useful on short texts, where statistical
//! detectors are least reliable.

use regex::Regex;
use std::sync::OnceLock;

/// Minimum share of counted characters the dominant script must reach.
pub const SCRIPT_RATIO_THRESHOLD: f64 = 0.30;

struct ScriptRanges {
    code: &'static str,
    ranges: &'static [(u32, u32)],
}

/// Scripts that map onto a single supported language.
///
/// Shared blocks are attributed to one language: Cyrillic to Russian,
/// Arabic to Arabic, Devanagari to Hindi. Kana goes to Japanese, CJK
/// ideographs to Chinese. Order breaks ties.
const SCRIPT_TABLE: &[ScriptRanges] = &[
    ScriptRanges {
        code: "he",
        ranges: &[(0x0590, 0x05FF), (0xFB1D, 0xFB4F)],
    },
    ScriptRanges {
        code: "ar",
        ranges: &[
            (0x0600, 0x06FF),
            (0x0750, 0x077F),
            (0xFB50, 0xFDFF),
            (0xFE70, 0xFEFF),
        ],
    },
    ScriptRanges {
        code: "ko",
        ranges: &[(0xAC00, 0xD7AF), (0x1100, 0x11FF), (0x3130, 0x318F)],
    },
    ScriptRanges {
        code: "ja",
        ranges: &[(0x3040, 0x309F), (0x30A0, 0x30FF), (0x31F0, 0x31FF)],
    },
    ScriptRanges {
        code: "zh",
        ranges: &[(0x4E00, 0x9FFF), (0x3400, 0x4DBF), (0xF900, 0xFAFF)],
    },
    ScriptRanges {
        code: "ru",
        ranges: &[(0x0400, 0x04FF), (0x0500, 0x052F)],
    },
    ScriptRanges {
        code: "el",
        ranges: &[(0x0370, 0x03FF), (0x1F00, 0x1FFF)],
    },
    ScriptRanges {
        code: "hi",
        ranges: &[(0x0900, 0x097F)],
    },
    ScriptRanges {
        code: "bn",
        ranges: &[(0x0980, 0x09FF)],
    },
    ScriptRanges {
        code: "gu",
        ranges: &[(0x0A80, 0x0AFF)],
    },
    ScriptRanges {
        code: "ta",
        ranges: &[(0x0B80, 0x0BFF)],
    },
    ScriptRanges {
        code: "te",
        ranges: &[(0x0C00, 0x0C7F)],
    },
    ScriptRanges {
        code: "kn",
        ranges: &[(0x0C80, 0x0CFF)],
    },
    ScriptRanges {
        code: "ml",
        ranges: &[(0x0D00, 0x0D7F)],
    },
    ScriptRanges {
        code: "si",
        ranges: &[(0x0D80, 0x0DFF)],
    },
    ScriptRanges {
        code: "th",
        ranges: &[(0x0E00, 0x0E7F)],
    },
];

/// Dominant script found in a text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptDetection {
    pub code: &'static str,
    /// Share of counted characters belonging to the script, 0.0..=1.0
    pub ratio: f64,
}

fn script_of(c: char) -> Option<usize> {
    let cp = c as u32;
    SCRIPT_TABLE.iter().position(|script| {
        script
            .ranges
            .iter()
            .any(|&(start, end)| (start..=end).contains(&cp))
    })
}

/// Unicode punctuation plus the ASCII punctuation set, which also covers
/// symbols such as `$` and `+`.
fn punctuation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{P}[:punct:]]").expect("valid regex"))
}

/// Estimate the language of `text` from its script alone.
///
/// Returns `None` when nothing is counted or the dominant script stays
/// below [`SCRIPT_RATIO_THRESHOLD`].
pub fn detect_by_script(text: &str) -> Option<ScriptDetection> {
    let mut counts = [0usize; SCRIPT_TABLE.len()];
    let mut total = 0usize;

    // Everything except whitespace and punctuation counts, emoji and other symbols included
    let stripped = punctuation_regex().replace_all(text, "");
    for c in stripped.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if let Some(idx) = script_of(c) {
            counts[idx] += 1;
        }
    }

    if total == 0 {
        return None;
    }

    // max_by_key returns the last maximum; iterate reversed so table order wins ties
    let (best_idx, best_count) = counts
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|&(_, count)| *count)
        .map(|(idx, count)| (idx, *count))?;

    if best_count == 0 {
        return None;
    }

    let ratio = best_count as f64 / total as f64;
    if ratio >= SCRIPT_RATIO_THRESHOLD {
        Some(ScriptDetection {
            code: SCRIPT_TABLE[best_idx].code,
            ratio,
        })
    } else {
        None
    }
}

/// Whether any character of `text` belongs to the script table entry for `code`.
pub fn contains_script(text: &str, code: &str) -> bool {
    text.chars()
        .filter_map(script_of)
        .any(|idx| SCRIPT_TABLE[idx].code == code)
}

fn is_latin_letter(c: char) -> bool {
    matches!(c as u32,
        0x0041..=0x005A
        | 0x0061..=0x007A
        | 0x00C0..=0x00D6
        | 0x00D8..=0x00F6
        | 0x00F8..=0x024F
        | 0x1E00..=0x1EFF)
}

/// True if the text has at least one letter and every letter is Latin.
///
/// Digits, punctuation, symbols and whitespace are allowed anywhere.
pub fn is_latin_only(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(is_latin_letter)
}
