//! Auxiliary SRT generator (spec §4.6): aligns a user-edited, line-broken
//! transcript against the ASR's per-token timestamps by a scouting-window
//! longest-common-subsequence heuristic, producing SRT cues.
//!
//! A client-side post-process over file-transcription output, not part
//! of the real-time path. Ported from `srt_from_txt.py`'s `Scout` /
//! `get_scout` / `lines_match_words`, including its exact tolerance and
//! rollback constants — this is a heuristic tuned against Chinese ASR
//! output and changing the constants changes its accuracy, not just its
//! style.

const NUMERAL_CHARS: &str = "零一二三四五六七八九十百千万幺两点时分秒之";

#[derive(Debug, Clone)]
pub struct Word {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Build a word list from a token/timestamp stream: `@@` continuation
/// markers are stripped and each word's end time is capped at the next
/// word's start (`get_words`'s `min(end, next.start)` pass).
pub fn words_from_tokens(tokens: &[String], timestamps: &[f64]) -> Vec<Word> {
    let mut words: Vec<Word> = tokens
        .iter()
        .zip(timestamps.iter())
        .map(|(token, &ts)| Word {
            text: token.replace('@', ""),
            start: ts,
            end: ts + 0.2,
        })
        .collect();
    for i in 0..words.len().saturating_sub(1) {
        let next_start = words[i + 1].start;
        words[i].end = words[i].end.min(next_start);
    }
    words
}

struct Scout {
    hit: i32,
    miss: i32,
    score: i32,
    start: usize,
}

fn strip_scout_chars(line: &str) -> String {
    line.chars()
        .filter(|c| !",.?:%，。？、".contains(*c) && !c.is_whitespace() && !c.is_ascii_digit())
        .collect::<String>()
        .to_lowercase()
}

/// Port of `get_scout`: probe forward from `cursor` up to six times,
/// each time starting one word later than the last high-scoring probe,
/// and keep the best-scoring attempt.
fn get_scout(line: &str, words: &[Word], cursor: usize) -> Option<Scout> {
    let words_num = words.len();
    let mut scout_list: Vec<Scout> = Vec::new();
    let mut scout_num = 5;
    let mut attempt = 0;
    let mut cursor = cursor;

    while attempt <= scout_num {
        attempt += 1;
        let mut remaining = strip_scout_chars(line);

        while cursor < words_num && !remaining.is_empty() && !remaining.contains(words[cursor].text.as_str())
        {
            cursor += 1;
        }
        let start = cursor;

        if cursor == words_num {
            break;
        }

        let mut tolerance = 5;
        let mut hit = 0;
        let mut miss = 0;
        while cursor < words_num && tolerance > 0 {
            let word = words[cursor].text.to_lowercase();
            if !remaining.is_empty() && remaining.contains(word.as_str()) {
                remaining = remaining.replacen(word.as_str(), "", 1);
                hit += 1;
                cursor += 1;
                tolerance = 5;
            } else {
                if !NUMERAL_CHARS.contains(words[cursor].text.as_str()) {
                    tolerance -= 1;
                    miss += 1;
                }
                cursor += 1;
            }
            if remaining.is_empty() {
                break;
            }
        }

        let score = hit - miss;
        let high_scoring = hit >= 2;
        scout_list.push(Scout { hit, miss, score, start });

        if high_scoring {
            cursor = start + 1;
            scout_num += 1;
        }
    }

    scout_list.into_iter().max_by_key(|s| s.score)
}

pub struct SubtitleCue {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

fn strip_probe_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| " ,.?!，。？！@".contains(c))
}

/// Port of `lines_match_words`: scout ahead to find each line's starting
/// word, then probe up to 8 words forward extending the cue's end time
/// while consuming matched words from the line's text.
pub fn lines_match_words(text_lines: &[String], words: &[Word]) -> Vec<SubtitleCue> {
    let words_num = words.len();
    let mut cues = Vec::new();
    let mut cursor = 0usize;

    for (index, line) in text_lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let scout = match get_scout(line, words, cursor) {
            Some(s) => s,
            None => {
                log::warn!("srt alignment failed at line {index}, stopping");
                break;
            }
        };
        cursor = scout.start;
        let score = scout.score;

        if cursor >= words_num {
            break;
        }

        let mut temp_text: String = line
            .chars()
            .filter(|c| !",.?，。？、".contains(*c) && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        let t1 = words[cursor].start;
        let mut t2 = words[cursor].end;
        let threshold = 8;
        let mut probe = cursor;

        while probe - cursor < threshold {
            if probe >= words_num {
                break;
            }
            let word = strip_probe_punctuation(&words[probe].text.to_lowercase()).to_string();
            let t4 = words[probe].end;
            probe += 1;
            if !word.is_empty() && temp_text.contains(word.as_str()) {
                temp_text = temp_text.replacen(word.as_str(), "", 1);
                t2 = t4;
                cursor = probe;
                if temp_text.is_empty() {
                    break;
                }
            }
        }

        cues.push(SubtitleCue {
            index,
            start: t1,
            end: t2,
            text: line.trim_end().to_string(),
        });

        if score <= 0 {
            cursor = cursor.saturating_sub(20);
        }
    }

    cues
}

fn format_timestamp(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as i64;
    let millis = total_millis % 1000;
    let total_secs = total_millis / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;
    format!("{hours:02}:{mins:02}:{secs:02},{millis:03}")
}

/// Render cues as an SRT document.
pub fn compose_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!("{}\n", cue.index + 1));
        out.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(cue.start),
            format_timestamp(cue.end)
        ));
        out.push_str(&cue.text);
        out.push_str("\n\n");
    }
    out
}

/// Full pipeline: token/timestamp stream plus a line-broken transcript
/// in, an SRT document out.
pub fn generate_srt(text_lines: &[String], tokens: &[String], timestamps: &[f64]) -> String {
    let words = words_from_tokens(tokens, timestamps);
    let cues = lines_match_words(text_lines, &words);
    compose_srt(&cues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_words() -> Vec<Word> {
        let tokens = vec!["hel@@".into(), "lo".into(), "wor@@".into(), "ld".into()];
        let timestamps = vec![0.0, 0.2, 1.0, 1.2];
        words_from_tokens(&tokens, &timestamps)
    }

    #[test]
    fn words_from_tokens_strips_continuation_markers() {
        let words = sample_words();
        assert_eq!(words[0].text, "hel");
        assert_eq!(words[2].text, "wor");
    }

    #[test]
    fn words_end_time_is_capped_by_next_start() {
        let words = sample_words();
        assert!(words[0].end <= words[1].start);
    }

    #[test]
    fn format_timestamp_renders_srt_style() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(61.5), "00:01:01,500");
    }

    #[test]
    fn generate_srt_produces_one_cue_per_nonblank_line() {
        let tokens: Vec<String> = "hello world".chars().map(|c| c.to_string()).collect();
        let timestamps: Vec<f64> = (0..tokens.len()).map(|i| i as f64 * 0.2).collect();
        let lines = vec!["hello world".to_string()];
        let doc = generate_srt(&lines, &tokens, &timestamps);
        assert!(doc.contains("1\n"));
        assert!(doc.contains("-->"));
        assert!(doc.contains("hello world"));
    }
}
