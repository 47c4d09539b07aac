//! CJK/Latin spacing adjustment.
//!
//! Ported from the reference implementation's `adjust_space`: scans for
//! maximal runs of `[A-Za-z0-9 ]` flanked by a CJK character (or another
//! alphanumeric run) on either side, collapses single-space-separated
//! single characters within the run ("A B C" -> "ABC"), and inserts exactly
//! one space between the run and a flanking CJK token, except where a
//! digit directly abuts the boundary.

use once_cell::sync::Lazy;
use regex::Regex;

static EN_IN_ZH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\p{Han}|[a-z0-9]+\s)?([a-z0-9 ]+)(\p{Han}|[a-z0-9]+)?").unwrap()
});

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Trim leading/trailing ASCII digits only (mirrors Python's `str.strip(digits)`).
fn strip_digits(s: &str) -> &str {
    s.trim_matches(is_digit)
}

/// Collapse single-space-separated single word-characters within `center`.
///
/// This mirrors the reference implementation's inner substitution
/// `re.sub(r'((\d) )?(\b\w) ?(?!\w{2})', r'\2\3', center)`, which Rust's
/// `regex` crate cannot express directly (no lookahead), so it is
/// implemented as an explicit left-to-right scan over non-overlapping
/// matches.
fn collapse_single_char_runs(center: &str) -> String {
    let chars: Vec<char> = center.chars().collect();
    let n = chars.len();
    let mut out = String::new();
    let mut i = 0;

    // Would consuming the trailing " ?" at `after` still satisfy the
    // negative lookahead `(?!\w{2})`?
    let lookahead_ok = |after: usize| -> bool {
        !(after + 1 < n && is_word(chars[after]) && is_word(chars[after + 1]))
    };

    while i < n {
        let mut matched = false;

        // Path A: optional "(\d) " prefix consumed.
        if i + 1 < n && is_digit(chars[i]) && chars[i + 1] == ' ' {
            let q = i + 2;
            if q < n && is_word(chars[q]) {
                let after_char = q + 1;
                if after_char < n && chars[after_char] == ' ' && lookahead_ok(after_char + 1) {
                    out.push(chars[i]);
                    out.push(chars[q]);
                    i = after_char + 1;
                    matched = true;
                } else if lookahead_ok(after_char) {
                    out.push(chars[i]);
                    out.push(chars[q]);
                    i = after_char;
                    matched = true;
                }
            }
        }

        // Path B: no digit-space prefix, just a lone word char at a boundary.
        if !matched && is_word(chars[i]) {
            let boundary = i == 0 || !is_word(chars[i - 1]);
            if boundary {
                let after_char = i + 1;
                if after_char < n && chars[after_char] == ' ' && lookahead_ok(after_char + 1) {
                    out.push(chars[i]);
                    i = after_char + 1;
                    matched = true;
                } else if lookahead_ok(after_char) {
                    out.push(chars[i]);
                    i = after_char;
                    matched = true;
                }
            }
        }

        if !matched {
            out.push(chars[i]);
            i += 1;
        }
    }

    out
}

fn replacer(caps: &regex::Captures, full: &str) -> String {
    let left = caps.get(1).map(|m| m.as_str());
    let center = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let right = caps.get(3).map(|m| m.as_str());

    let mut final_text = collapse_single_char_runs(center).trim().to_string();

    if let Some(left) = left {
        if strip_digits(left) == left && strip_digits(center) == center {
            final_text = format!(" {final_text}");
        }
        final_text = format!("{}{}", left.trim_end(), final_text);
    } else {
        // The CJK char immediately to the left may have been consumed by a
        // previous (non-overlapping) match; recover it by looking one byte
        // back from the start of the center group in the original string.
        let center_start = caps.get(2).unwrap().start();
        if center_start > 0 {
            if let Some(prev) = full[..center_start].chars().next_back() {
                if prev.is_alphabetic() && !prev.is_ascii() && strip_digits(center) == center {
                    final_text = format!(" {final_text}");
                }
            }
        }
    }

    if let Some(right) = right {
        if strip_digits(center) == center {
            final_text.push(' ');
        }
        final_text.push_str(right.trim_start());
    }

    final_text
}

/// Adjust CJK/Latin spacing in `txt`.
pub fn adjust_space(txt: &str) -> String {
    let mut out = String::with_capacity(txt.len());
    let mut last_end = 0;
    for caps in EN_IN_ZH.captures_iter(txt) {
        let m = caps.get(0).unwrap();
        out.push_str(&txt[last_end..m.start()]);
        out.push_str(&replacer(&caps, txt));
        last_end = m.end();
    }
    out.push_str(&txt[last_end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_spelled_out_letters() {
        assert_eq!(collapse_single_char_runs("a b c"), "abc");
    }

    #[test]
    fn inserts_space_between_cjk_and_latin() {
        let result = adjust_space("你好world再见");
        assert!(result.contains("你好 world 再见"));
    }

    #[test]
    fn no_space_introduced_between_digit_and_unit() {
        // "3个" should stay glued -- no CJK/Latin boundary space before a
        // CJK unit character directly following a digit run.
        let result = adjust_space("3个苹果");
        assert_eq!(result, "3个苹果");
    }

    #[test]
    fn idempotent_on_plain_ascii() {
        let input = "hello world";
        let once = adjust_space(input);
        let twice = adjust_space(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn is_idempotent_on_already_spaced_text() {
        let input = "你好 world 再见";
        assert_eq!(adjust_space(input), input);
    }
}
