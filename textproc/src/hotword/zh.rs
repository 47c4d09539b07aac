//! Chinese hot-word table: exact, case-sensitive substring replacement.
//!
//! A single left-to-right pass; when multiple keys could match at the same
//! position, the longest key wins (spec §4.2).

#[derive(Debug, Clone, Default)]
pub struct ZhTable {
    /// Patterns sorted longest-first so the greedy scan prefers longer keys.
    entries: Vec<(String, String)>,
}

impl ZhTable {
    /// Build a table from `(pattern, replacement)` pairs. For this table
    /// pattern and replacement are the same string (hot-word files list one
    /// canonical spelling per line; the "pattern" is also the "replacement"
    /// — the ASR's mis-rendering is a prefix/substring of other tokens the
    /// merger already emitted, so the substitution target and the
    /// canonical form are identical here by construction of how the file
    /// is authored).
    pub fn from_words(words: impl IntoIterator<Item = String>) -> Self {
        let mut entries: Vec<(String, String)> =
            words.into_iter().map(|w| (w.clone(), w)).collect();
        entries.sort_by_key(|(k, _)| std::cmp::Reverse(k.chars().count()));
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn substitute(&self, text: &str) -> String {
        if self.entries.is_empty() {
            return text.to_string();
        }
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        'outer: while i < n {
            for (pattern, replacement) in &self.entries {
                let plen = pattern.chars().count();
                if plen == 0 || i + plen > n {
                    continue;
                }
                if chars[i..i + plen].iter().collect::<String>() == *pattern {
                    out.push_str(replacement);
                    i += plen;
                    continue 'outer;
                }
            }
            out.push(chars[i]);
            i += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_exact_substring() {
        let table = ZhTable::from_words(["深圳".to_string()]);
        assert_eq!(table.substitute("我在深圳工作"), "我在深圳工作");
    }

    #[test]
    fn prefers_longer_key_on_collision() {
        let table = ZhTable::from_words(["龙华区".to_string(), "龙华".to_string()]);
        assert_eq!(table.substitute("我在龙华区"), "我在龙华区");
    }

    #[test]
    fn empty_table_is_identity() {
        let table = ZhTable::default();
        assert_eq!(table.substitute("不变"), "不变");
    }
}
