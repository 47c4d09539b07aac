//! Text post-processing: Chinese-number ITN, CJK/Latin spacing, punctuation
//! handling (C1), and the hot-word substitution engine (C2).

pub mod hotword;
pub mod itn;
pub mod normalise;
pub mod punctuation;
pub mod spacing;

pub use hotword::{HotwordConfig, HotwordEngine, SharedHotwordEngine};
pub use normalise::{normalise, NormaliseOptions};
pub use punctuation::{drop_trailing_seam_punctuation, join_tokens_to_text, trim_trailing_punctuation};
