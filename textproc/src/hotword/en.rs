//! English hot-word table: case-insensitive, flexible-spacing substitution.
//!
//! Ported from `hot_sub_en.py`. For each pattern `P`, the *match key* is
//! `P` lowercased with all non-word characters stripped. A sentence is a
//! candidate for `P` if its lowercased, space-stripped form contains the
//! match key as a substring; when it is, every occurrence of `P`'s letters
//! (allowing arbitrary whitespace between them, but not bridging into a
//! neighbouring Latin token) is replaced with `P`'s canonical spelling.

#[derive(Debug, Clone, Default)]
pub struct EnTable {
    /// (match_key, canonical_pattern)
    entries: Vec<(String, String)>,
}

fn match_key(pattern: &str) -> String {
    pattern
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

impl EnTable {
    pub fn from_words(words: impl IntoIterator<Item = String>) -> Self {
        let entries = words.into_iter().map(|w| (match_key(&w), w)).collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn substitute(&self, text: &str) -> String {
        if self.entries.is_empty() {
            return text.to_string();
        }
        let folded: String = text
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let mut result = text.to_string();
        for (key, canonical) in &self.entries {
            if key.is_empty() || !folded.contains(key.as_str()) {
                continue;
            }
            result = replace_flexible(&result, key, canonical);
        }
        result
    }
}

/// Replace every occurrence of `key`'s letters in `text`, allowing
/// arbitrary whitespace between consecutive letters but requiring a
/// non-letter (or string boundary) on both sides of the match, with
/// `replacement`.
fn replace_flexible(text: &str, key: &str, replacement: &str) -> String {
    let key_chars: Vec<char> = key.chars().collect();
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let klen = key_chars.len();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    let is_letter = |c: char| c.is_ascii_alphabetic();

    while i < n {
        if klen > 0 && chars[i].to_ascii_lowercase() == key_chars[0] {
            let left_ok = i == 0 || !is_letter(chars[i - 1]);
            if left_ok {
                let mut j = i + 1;
                let mut k = 1;
                let mut ok = true;
                while k < klen {
                    while j < n && chars[j].is_whitespace() {
                        j += 1;
                    }
                    if j < n && chars[j].to_ascii_lowercase() == key_chars[k] {
                        j += 1;
                        k += 1;
                    } else {
                        ok = false;
                        break;
                    }
                }
                let right_ok = ok && (j >= n || !is_letter(chars[j]));
                if right_ok {
                    out.push_str(replacement);
                    i = j;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_flexible_spacing_case_insensitive() {
        let table = EnTable::from_words(["CapsWriter".to_string()]);
        assert_eq!(
            table.substitute("caps writer is fast"),
            "CapsWriter is fast"
        );
    }

    #[test]
    fn does_not_bridge_into_neighbouring_word() {
        let table = EnTable::from_words(["cap".to_string()]);
        assert_eq!(table.substitute("capital"), "capital");
    }

    #[test]
    fn no_match_key_skips_substitution() {
        let table = EnTable::from_words(["CapsWriter".to_string()]);
        assert_eq!(table.substitute("nothing relevant here"), "nothing relevant here");
    }
}
