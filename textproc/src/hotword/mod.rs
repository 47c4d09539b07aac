//! Hot-word engine (C2): three independently-enabled substitution tables
//! applied in order — Chinese, English, rules — plus an RCU-style reload
//! wrapper around a live file set.

mod en;
mod rule;
pub mod watcher;
mod zh;

pub use en::EnTable;
pub use rule::RuleTable;
pub use watcher::{load_engine, HotwordPaths, HotwordWatcher};
pub use zh::ZhTable;

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Which of the three tables are active. A disabled table is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct HotwordConfig {
    pub hot_zh: bool,
    pub hot_en: bool,
    pub hot_rule: bool,
}

/// Immutable snapshot of the three hot-word tables, swapped in as a whole
/// by [`SharedHotwordEngine::reload`] (design note §9: "a reload produces
/// a new engine and atomically replaces the shared pointer").
#[derive(Debug, Clone, Default)]
pub struct HotwordEngine {
    zh: ZhTable,
    en: EnTable,
    rule: RuleTable,
    config: HotwordConfig,
}

impl HotwordEngine {
    pub fn new(zh: ZhTable, en: EnTable, rule: RuleTable, config: HotwordConfig) -> Self {
        Self {
            zh,
            en,
            rule,
            config,
        }
    }

    /// Apply the Chinese, English, then rule tables, in that order (spec
    /// §4.2). Each table independently no-ops when disabled or empty.
    pub fn substitute(&self, text: &str) -> String {
        let mut out = text.to_string();
        if self.config.hot_zh && !self.zh.is_empty() {
            out = self.zh.substitute(&out);
        }
        if self.config.hot_en && !self.en.is_empty() {
            out = self.en.substitute(&out);
        }
        if self.config.hot_rule && !self.rule.is_empty() {
            out = self.rule.substitute(&out);
        }
        out
    }
}

/// Shared, atomically-swappable handle to the active [`HotwordEngine`].
///
/// A reader calling [`Self::current`] sees either the old or the new
/// engine in its entirety, never a torn mix of tables — the swap is a
/// single pointer store (design note §9).
#[derive(Clone)]
pub struct SharedHotwordEngine {
    inner: Arc<ArcSwap<HotwordEngine>>,
}

impl SharedHotwordEngine {
    pub fn new(engine: HotwordEngine) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(engine)),
        }
    }

    pub fn current(&self) -> Arc<HotwordEngine> {
        self.inner.load_full()
    }

    pub fn reload(&self, engine: HotwordEngine) {
        self.inner.store(Arc::new(engine));
    }

    pub fn substitute(&self, text: &str) -> String {
        self.current().substitute(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_table_is_a_no_op() {
        let engine = HotwordEngine::new(
            ZhTable::from_words(["深圳".to_string()]),
            EnTable::default(),
            RuleTable::default(),
            HotwordConfig {
                hot_zh: false,
                hot_en: false,
                hot_rule: false,
            },
        );
        assert_eq!(engine.substitute("深圳"), "深圳");
    }

    #[test]
    fn reload_swaps_atomically_and_is_visible_to_readers() {
        let shared = SharedHotwordEngine::new(HotwordEngine::default());
        assert_eq!(shared.substitute("caps writer"), "caps writer");

        let updated = HotwordEngine::new(
            ZhTable::default(),
            EnTable::from_words(["CapsWriter".to_string()]),
            RuleTable::default(),
            HotwordConfig {
                hot_zh: false,
                hot_en: true,
                hot_rule: false,
            },
        );
        shared.reload(updated);
        assert_eq!(shared.substitute("caps writer"), "CapsWriter");
    }

    #[test]
    fn applies_tables_in_zh_en_rule_order() {
        // The rule table runs last, so it can clean up after zh/en.
        let engine = HotwordEngine::new(
            ZhTable::default(),
            EnTable::from_words(["CapsWriter".to_string()]),
            RuleTable::from_lines(["CapsWriter = CW".to_string()]),
            HotwordConfig {
                hot_zh: false,
                hot_en: true,
                hot_rule: true,
            },
        );
        assert_eq!(engine.substitute("caps writer"), "CW");
    }
}
