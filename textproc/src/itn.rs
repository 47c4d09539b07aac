//! Chinese-number -> Arabic-number inverse text normalisation (ITN).
//!
//! Ported from the reference `chinese_itn.py`. The reference's top-level
//! candidate pattern relies on PCRE lookbehind and conditional groups that
//! Rust's `regex` crate cannot express, so candidate extraction is a
//! hand-written left-to-right scan over the same character classes; once a
//! candidate substring is isolated, classification and conversion follow
//! the original almost verbatim.

use once_cell::sync::Lazy;
use regex::Regex;

const CORE_CHARS: &str = "零幺一二两三四五六七八九十百千万亿点比";
const UNIT_AFTER_NUM: &str = "年月日号分";
const TRAILING_UNITS: &str = "个只分万亿秒";

/// Four-character (or longer) idioms that must not be touched by ITN even
/// though they contain number-like characters.
static IDIOMS: Lazy<Vec<Vec<char>>> = Lazy::new(|| {
    let raw = "正经八百 五零二落 五零四散 \
        五十步笑百步 乌七八糟 污七八糟 四百四病 思绪万千 \
        十有八九 十之八九 三十而立 三十六策 三十六计 三十六行 \
        三五成群 三百六十行 三六九等 \
        七老八十 七零八落 七零八碎 七七八八 乱七八遭 乱七八糟 略知一二 零零星星 零七八碎 \
        九九归一 二三其德 二三其意 无银三百两 八九不离十 \
        百分之百 年三十 烂七八糟 一点一滴 路易十六 九三学社 五四运动 入木三分 三十六计";
    raw.split_whitespace().map(|s| s.chars().collect()).collect()
});

fn is_core(c: char) -> bool {
    CORE_CHARS.contains(c)
}

fn is_unit_after_num(c: char) -> bool {
    UNIT_AFTER_NUM.contains(c)
}

fn is_trailing_unit(c: char) -> bool {
    TRAILING_UNITS.contains(c) || c.is_ascii_alphabetic()
}

static PURE_NUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[零幺一二三四五六七八九]+(点[零幺一二三四五六七八九]+)* *[a-zA-Z个只分万亿秒]?$").unwrap()
});
static VALUE_NUM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^十?(零?[一二两三四五六七八九十][十百千万]{1,2})*零?[一二三四五六七八九]?(点[零一二三四五六七八九]+)? *[a-zA-Z个只分万亿秒]?$").unwrap()
});
static PERCENT_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^百分之[零一二三四五六七八九十百千万]+(点[零一二三四五六七八九]+)?$").unwrap());
static FRACTION_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[零一二三四五六七八九十百千万]+(点[零一二三四五六七八九]+)?分之[零一二三四五六七八九十百千万]+(点[零一二三四五六七八九]+)?$").unwrap()
});
static RATIO_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[零一二三四五六七八九十百千万]+(点[零一二三四五六七八九]+)?比[零一二三四五六七八九十百千万]+(点[零一二三四五六七八九]+)?$").unwrap()
});
static TIME_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[零一二三四五六七八九十]+点[零一二三四五六七八九十]+分([零一二三四五六七八九十]+秒)?$").unwrap()
});
static DATE_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([零一二三四五六七八九]+年)?[一二三四五六七八九十]+月[一二三四五六七八九十]+[日号]$").unwrap()
});

fn num_map(c: char) -> Option<char> {
    Some(match c {
        '零' => '0',
        '一' | '幺' => '1',
        '二' | '两' => '2',
        '三' => '3',
        '四' => '4',
        '五' => '5',
        '六' => '6',
        '七' => '7',
        '八' => '8',
        '九' => '9',
        '点' => '.',
        _ => return None,
    })
}

fn value_map(c: char) -> Option<i64> {
    Some(match c {
        '零' => 0,
        '一' | '两' => 1,
        '二' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        '十' => 10,
        '百' => 100,
        '千' => 1000,
        '万' => 10_000,
        '亿' => 100_000_000,
        _ => return None,
    })
}

/// Split a candidate into (stripped-of-unit, unit-suffix), mirroring
/// `original.strip(common_units + ascii_letters).strip()`.
fn strip_unit(original: &str) -> (&str, &str) {
    let stripped = original.trim_matches(|c: char| {
        TRAILING_UNITS.contains(c) || c.is_ascii_alphabetic() || c.is_whitespace()
    });
    if stripped.len() != original.len() {
        let unit = &original[stripped.len()..];
        (stripped, unit)
    } else {
        (stripped, "")
    }
}

fn convert_pure_num(original: &str, strict: bool) -> String {
    let (stripped, unit) = strip_unit(original);
    if stripped == "一" && !strict {
        return original.to_string();
    }
    let mut out = String::new();
    for c in stripped.chars() {
        match num_map(c) {
            Some(d) => out.push(d),
            None => return original.to_string(),
        }
    }
    out.push_str(unit);
    out
}

fn convert_value_num(original: &str) -> String {
    let (stripped, unit) = strip_unit(original);
    let with_point = if stripped.contains('点') {
        stripped.to_string()
    } else {
        format!("{stripped}点")
    };
    let parts: Vec<&str> = with_point.split('点').collect();
    if parts.len() != 2 {
        return original.to_string();
    }
    let (int_part, decimal_part) = (parts[0], parts[1]);
    if int_part.is_empty() {
        return original.to_string();
    }

    let (mut value, mut temp, mut base): (i64, i64, i64) = (0, 0, 1);
    for c in int_part.chars() {
        match c {
            '十' => {
                temp = if temp == 0 { 10 } else { value_map('十').unwrap() * temp };
                base = 1;
            }
            '零' => base = 1,
            '一' | '二' | '两' | '三' | '四' | '五' | '六' | '七' | '八' | '九' => {
                temp += value_map(c).unwrap();
            }
            '万' => {
                value += temp;
                value *= 10_000;
                base = 1_000;
                temp = 0;
            }
            '亿' => {
                value += temp;
                value *= 100_000_000;
                base = 10_000_000;
                temp = 0;
            }
            '百' | '千' => {
                let scale = value_map(c).unwrap();
                value += temp * scale;
                base = scale / 10;
                temp = 0;
            }
            _ => return original.to_string(),
        }
    }
    value += temp * base;

    let mut final_str = value.to_string();
    let decimal_str = convert_pure_num(decimal_part, true);
    if !decimal_str.is_empty() && decimal_str.chars().all(|c| c.is_ascii_digit()) {
        final_str.push('.');
        final_str.push_str(&decimal_str);
    }
    final_str.push_str(unit);
    final_str
}

fn convert_fraction_value(original: &str) -> Option<String> {
    let mut parts = original.splitn(2, "分之");
    let denominator = parts.next()?;
    let numerator = parts.next()?;
    Some(format!(
        "{}/{}",
        convert_value_num(numerator),
        convert_value_num(denominator)
    ))
}

fn convert_percent_value(original: &str) -> Option<String> {
    let rest: String = original.chars().skip(3).collect();
    Some(format!("{}%", convert_value_num(&rest)))
}

fn convert_ratio_value(original: &str) -> Option<String> {
    let mut parts = original.splitn(2, '比');
    let num1 = parts.next()?;
    let num2 = parts.next()?;
    Some(format!(
        "{}:{}",
        convert_value_num(num1),
        convert_value_num(num2)
    ))
}

fn convert_time_value(original: &str) -> Option<String> {
    let res: Vec<&str> = original
        .split(|c| c == '点' || c == '分' || c == '秒')
        .filter(|s| !s.is_empty())
        .collect();
    if res.len() < 2 {
        return None;
    }
    let mut out = format!(
        "{}:{}",
        convert_value_num(res[0]),
        convert_value_num(res[1])
    );
    if res.len() > 2 {
        out.push(':');
        out.push_str(&convert_value_num(res[2]));
    }
    if res.len() > 3 {
        out.push('.');
        out.push_str(&convert_pure_num(res[3], false));
    }
    Some(out)
}

fn convert_date_value(original: &str) -> Option<String> {
    let mut rest = original;
    let mut out = String::new();
    if let Some(idx) = rest.find('年') {
        let (year, tail) = rest.split_at(idx);
        out.push_str(&convert_pure_num(year, false));
        out.push('年');
        rest = &tail['年'.len_utf8()..];
    }
    if let Some(idx) = rest.find('月') {
        let (month, tail) = rest.split_at(idx);
        out.push_str(&convert_value_num(month));
        out.push('月');
        rest = &tail['月'.len_utf8()..];
    }
    if let Some(idx) = rest.find('日') {
        let (day, _tail) = rest.split_at(idx);
        out.push_str(&convert_value_num(day));
        out.push('日');
    } else if let Some(idx) = rest.find('号') {
        let (day, _tail) = rest.split_at(idx);
        out.push_str(&convert_value_num(day));
        out.push('号');
    }
    Some(out)
}

fn classify_and_convert(candidate: &str) -> String {
    let stripped_core = candidate.trim_matches(|c: char| TRAILING_UNITS.contains(c));
    if PURE_NUM.is_match(stripped_core) {
        return convert_pure_num(candidate, false);
    }
    if VALUE_NUM.is_match(stripped_core) {
        return convert_value_num(candidate);
    }
    if PERCENT_VALUE.is_match(candidate) {
        if let Some(v) = convert_percent_value(candidate) {
            return v;
        }
    }
    if FRACTION_VALUE.is_match(candidate) {
        if let Some(v) = convert_fraction_value(candidate) {
            return v;
        }
    }
    if RATIO_VALUE.is_match(candidate) {
        if let Some(v) = convert_ratio_value(candidate) {
            return v;
        }
    }
    if TIME_VALUE.is_match(candidate) {
        if let Some(v) = convert_time_value(candidate) {
            return v;
        }
    }
    if DATE_VALUE.is_match(candidate) {
        if let Some(v) = convert_date_value(candidate) {
            return v;
        }
    }
    candidate.to_string()
}

/// Naive char-index substring search, mirroring Python's `str.find` but in
/// char (not byte) offsets, since idiom-overlap checks below are done in
/// char-index space.
fn find_char_idx(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
}

fn is_suppressed_by_idiom(text_chars: &[char], l_pos: usize, r_pos: usize) -> bool {
    IDIOMS.iter().any(|idiom| {
        find_char_idx(text_chars, idiom).map_or(false, |idx| idx >= l_pos && idx < r_pos)
    })
}

struct Candidate {
    start: usize,
    end: usize,
    head_start: usize,
}

fn scan_candidates(chars: &[char]) -> Vec<Candidate> {
    let n = chars.len();
    let mut out = Vec::new();
    let mut i = 0;
    while i < n {
        if !is_core(chars[i]) {
            i += 1;
            continue;
        }
        let start = i;
        let mut j = i;
        let mut last_was_core = false;
        while j < n {
            if is_core(chars[j]) {
                j += 1;
                last_was_core = true;
                continue;
            }
            if last_was_core && j + 1 < n && chars[j] == '分' && chars[j + 1] == '之' {
                j += 2;
                last_was_core = true;
                continue;
            }
            if last_was_core && is_unit_after_num(chars[j]) {
                j += 1;
                last_was_core = false;
                continue;
            }
            if last_was_core && chars[j] == ' ' && j + 1 < n && is_core(chars[j + 1]) {
                j += 1;
                last_was_core = false;
                continue;
            }
            break;
        }
        // Optional single trailing unit/letter, directly after a core char.
        if last_was_core && j < n && is_trailing_unit(chars[j]) {
            j += 1;
        } else if j > 0
            && j < n
            && chars[j - 1] == ' '
            && j >= 2
            && is_core(chars[j - 2])
            && chars[j].is_ascii_alphabetic()
        {
            j += 1;
        }

        // Optional single leading Latin letter (plus whitespace) immediately
        // before the candidate.
        let mut head_start = start;
        if start > 0 {
            let mut k = start;
            while k > 0 && chars[k - 1].is_whitespace() {
                k -= 1;
            }
            if k > 0 && chars[k - 1].is_ascii_alphabetic() {
                head_start = k - 1;
            }
        }

        out.push(Candidate {
            start,
            end: j,
            head_start,
        });
        i = j.max(start + 1);
    }
    out
}

/// Convert Chinese spoken-form numbers in `text` to Arabic digits.
pub fn chinese_to_num(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let candidates = scan_candidates(&chars);

    let mut out = String::new();
    let mut cursor = 0usize;
    for cand in candidates {
        let l_pos = cand.start.saturating_sub(2);
        let candidate_str: String = chars[cand.start..cand.end].iter().collect();

        out.extend(&chars[cursor..cand.head_start]);

        let converted = if is_suppressed_by_idiom(&chars, l_pos, cand.end) {
            candidate_str.clone()
        } else {
            classify_and_convert(&candidate_str)
        };

        if cand.head_start < cand.start {
            let head: String = chars[cand.head_start..cand.start].iter().collect();
            out.push_str(&head);
        }
        out.push_str(&converted);
        cursor = cand.end;
    }
    out.extend(&chars[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_ip_style_digit_sequence() {
        assert_eq!(chinese_to_num("幺九二点幺六八点零点幺"), "192.168.0.1");
    }

    #[test]
    fn converts_scalar_value() {
        assert_eq!(chinese_to_num("三万五千二"), "35200");
    }

    #[test]
    fn converts_percentage() {
        assert_eq!(chinese_to_num("百分之五十"), "50%");
    }

    #[test]
    fn converts_fraction() {
        assert_eq!(chinese_to_num("三分之一"), "1/3");
    }

    #[test]
    fn converts_ratio() {
        assert_eq!(chinese_to_num("三比一"), "3:1");
    }

    #[test]
    fn converts_clock_time() {
        assert_eq!(chinese_to_num("八点三十分二十秒"), "8:30:20");
    }

    #[test]
    fn idiom_is_suppressed() {
        assert_eq!(chinese_to_num("七上八下"), "七上八下");
    }

    #[test]
    fn non_idiom_digit_phrase_is_still_converted() {
        assert_eq!(chinese_to_num("七个苹果"), "7个苹果");
    }

    #[test]
    fn is_idempotent_on_already_converted_text() {
        let once = chinese_to_num("三万五千二");
        let twice = chinese_to_num(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn preserves_leading_latin_letter() {
        let result = chinese_to_num("a幺九二");
        assert_eq!(result, "a192");
    }
}
