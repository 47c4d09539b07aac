//! Rule hot-word table: `LHS = RHS` regex substitution pairs.
//!
//! Ported from `hot_sub_rule.py`. `LHS` is a regex, `RHS` is the
//! substitution text and may reference capture groups with `\1`-style
//! back-references (translated to this crate's `regex` replacement syntax
//! at load time).

use log::warn;
use regex::Regex;

#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<(Regex, String)>,
}

/// Translate Python-style `\1` back-references in `rhs` into the `regex`
/// crate's `${1}` replacement syntax.
fn translate_backrefs(rhs: &str) -> String {
    let mut out = String::with_capacity(rhs.len());
    let mut chars = rhs.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(d) = chars.peek().copied() {
                if d.is_ascii_digit() {
                    chars.next();
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

impl RuleTable {
    /// Parse `LHS = RHS` lines. Blank lines and lines starting with `#` are
    /// comments. A line whose `LHS` fails to compile as a regex is logged
    /// and skipped (spec §7: "Hot-word file syntax error: log the
    /// offending line and keep the previous table active" — applied here
    /// per-line so one bad rule does not discard the rest of the file).
    pub fn from_lines(lines: impl IntoIterator<Item = String>) -> Self {
        let mut rules = Vec::new();
        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = trimmed.split_once(" = ") else {
                warn!("hot-rule.txt: skipping malformed line: {trimmed:?}");
                continue;
            };
            match Regex::new(lhs) {
                Ok(re) => rules.push((re, translate_backrefs(rhs))),
                Err(e) => warn!("hot-rule.txt: skipping invalid regex {lhs:?}: {e}"),
            }
        }
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn substitute(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (re, rhs) in &self.rules {
            result = re.replace_all(&result, rhs.as_str()).into_owned();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_simple_rule() {
        let table = RuleTable::from_lines(["你好 = 您好".to_string()]);
        assert_eq!(table.substitute("你好世界"), "您好世界");
    }

    #[test]
    fn supports_backreferences() {
        let table = RuleTable::from_lines([r"(\d+)元 = ¥\1".to_string()]);
        assert_eq!(table.substitute("价格是100元"), "价格是¥100");
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let table = RuleTable::from_lines([
            "# a comment".to_string(),
            "".to_string(),
            "a = b".to_string(),
        ]);
        assert_eq!(table.substitute("a"), "b");
    }

    #[test]
    fn skips_malformed_line_without_panicking() {
        let table = RuleTable::from_lines(["no equals sign here".to_string()]);
        assert!(table.is_empty());
    }
}
