//! Punctuation helpers shared by the server-side merger (seam fix) and the
//! client-side result sink (trailing trim).

/// Punctuation characters recognised at a merge seam, ported verbatim from
/// `server_recognize.py`'s seam-fix character set.
pub const SEAM_PUNCTUATION: &str = "，。！？；：、「」『』（）《》【】[]{},.!?;:\"'";

/// `true` if `c` is one of the characters the merger drops at a segment
/// seam (spec §4.4 step 5).
pub fn is_seam_punctuation(c: char) -> bool {
    SEAM_PUNCTUATION.contains(c)
}

/// Drop the last token (and its timestamp) from an accumulated token/
/// timestamp pair if the last token is seam punctuation.
pub fn drop_trailing_seam_punctuation(tokens: &mut Vec<String>, timestamps: &mut Vec<f64>) {
    if let Some(last) = tokens.last() {
        if last.chars().count() == 1 && last.chars().next().is_some_and(is_seam_punctuation) {
            tokens.pop();
            timestamps.pop();
        }
    }
}

/// Trim any trailing characters present in `trash_punc` from `text` (spec
/// §4.6's client-side punctuation trim, default `trash_punc = "，。,."`).
pub fn trim_trailing_punctuation(text: &str, trash_punc: &str) -> String {
    text.trim_end_matches(|c| trash_punc.contains(c)).to_string()
}

/// Drop the space after a non-alphanumeric character when it isn't itself
/// followed by an alphanumeric character, ported from the merger's token
/// recomposition regex (`([^a-zA-Z0-9]) (?![a-zA-Z0-9])` -> `\1`).
fn collapse_space_after_punct(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let is_alnum = c.is_ascii_alphanumeric();
        let followed_by_lone_space = !is_alnum
            && i + 1 < chars.len()
            && chars[i + 1] == ' '
            && !chars.get(i + 2).is_some_and(|n| n.is_ascii_alphanumeric());
        out.push(c);
        i += if followed_by_lone_space { 2 } else { 1 };
    }
    out
}

/// Recompose a token/timestamp list into display text: join with spaces,
/// drop BPE continuation markers, then collapse the punctuation seam
/// spacing above (spec §4.4 step 7).
pub fn join_tokens_to_text(tokens: &[String]) -> String {
    let joined = tokens.join(" ").replace("@@ ", "");
    collapse_space_after_punct(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_seam_punctuation() {
        let mut tokens = vec!["你".to_string(), "好".to_string(), "，".to_string()];
        let mut timestamps = vec![0.0, 0.1, 0.2];
        drop_trailing_seam_punctuation(&mut tokens, &mut timestamps);
        assert_eq!(tokens, vec!["你", "好"]);
        assert_eq!(timestamps, vec![0.0, 0.1]);
    }

    #[test]
    fn leaves_non_punctuation_tail_alone() {
        let mut tokens = vec!["你".to_string(), "好".to_string()];
        let mut timestamps = vec![0.0, 0.1];
        drop_trailing_seam_punctuation(&mut tokens, &mut timestamps);
        assert_eq!(tokens, vec!["你", "好"]);
    }

    #[test]
    fn trims_default_trash_punc() {
        assert_eq!(trim_trailing_punctuation("你好，。", "，。,."), "你好");
    }

    #[test]
    fn does_not_trim_interior_punctuation() {
        assert_eq!(trim_trailing_punctuation("你好，世界", "，。,."), "你好，世界");
    }

    #[test]
    fn join_drops_continuation_markers() {
        // The seam collapse only fires on a space *after* punctuation, not
        // before it, so a word-boundary comma still carries its leading
        // space through untouched — this matches the merger it's ported
        // from.
        let tokens = vec!["hel@@".to_string(), "lo".to_string(), ",".to_string(), "world".to_string()];
        assert_eq!(join_tokens_to_text(&tokens), "hello , world");
    }

    #[test]
    fn join_collapses_space_after_trailing_punctuation() {
        let tokens = vec!["你好".to_string(), "，".to_string()];
        assert_eq!(join_tokens_to_text(&tokens), "你好，");
    }
}
