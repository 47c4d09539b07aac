//! C1 text normaliser public contract: `normalise(text, options) -> text`.
//!
//! Composes the spacing adjustment and Chinese-number ITN. Punctuation
//! trimming (seam-fix and trailing-trim) is exposed separately in
//! [`crate::punctuation`] since it operates on token/timestamp pairs and
//! trailing character runs respectively, owned by the merger and the
//! client result sink rather than by a single whole-text transform.

use crate::itn::chinese_to_num;
use crate::spacing::adjust_space;

#[derive(Debug, Clone, Copy)]
pub struct NormaliseOptions {
    pub format_num: bool,
    pub format_spell: bool,
}

impl Default for NormaliseOptions {
    fn default() -> Self {
        Self {
            format_num: true,
            format_spell: true,
        }
    }
}

/// Apply spacing adjustment and Chinese-number ITN, in that order.
///
/// Any failure inside a candidate classification falls back to the
/// original matched substring (enforced inside [`chinese_to_num`] itself),
/// so this function never fails the caller's pipeline.
pub fn normalise(text: &str, opts: NormaliseOptions) -> String {
    let mut out = text.to_string();
    if opts.format_spell {
        out = adjust_space(&out);
    }
    if opts.format_num {
        out = chinese_to_num(&out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_on_sampled_corpus() {
        let corpus = [
            "你好world再见",
            "三万五千二百个",
            "七上八下",
            "幺九二点幺六八",
            "hello there",
        ];
        for t in corpus {
            let once = normalise(t, NormaliseOptions::default());
            let twice = normalise(&once, NormaliseOptions::default());
            assert_eq!(once, twice, "not idempotent for {t:?}");
        }
    }

    #[test]
    fn respects_disabled_format_num() {
        let opts = NormaliseOptions {
            format_num: false,
            format_spell: true,
        };
        let result = normalise("三万五千二", opts);
        assert_eq!(result, "三万五千二");
    }

    #[test]
    fn respects_disabled_format_spell() {
        let opts = NormaliseOptions {
            format_num: true,
            format_spell: false,
        };
        // No spacing pass, but ITN still runs.
        let result = normalise("三", opts);
        assert_eq!(result, "3");
    }
}
