//! 候选号码解析
//!
//! 从 OCR 全文中解析出可能的身份号码。两种方式并行：
//! - 分组：全文所有 4 位数字词拼接，共 12 位时作为候选
//! - 整行：长度超过 12 且只由数字和空格组成的行

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::checksum::IDENTIFIER_LEN;

/// 号码在证件上按 4 位一组印刷
const GROUP_LEN: usize = 4;

static DIGIT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9 ]+$").expect("valid regex"));

/// 候选集合
///
/// 插入时去掉所有空白，按去空白后的字符串去重。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    items: BTreeSet<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入候选，返回是否为新值
    pub fn insert(&mut self, raw: &str) -> bool {
        let normalized = strip_whitespace(raw);
        if normalized.is_empty() {
            return false;
        }
        self.items.insert(normalized)
    }

    pub fn extend_from(&mut self, other: &CandidateSet) {
        for item in &other.items {
            self.items.insert(item.clone());
        }
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.items.contains(&strip_whitespace(candidate))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = CandidateSet::new();
        for raw in iter {
            set.insert(raw);
        }
        set
    }
}

/// 分组候选
///
/// 按空白切词，收集全文中所有恰好 4 位 ASCII 数字的词。
/// 拼接后恰好 12 位时作为唯一的分组候选（以空格连接），否则没有分组候选。
pub fn grouped_candidate(text: &str) -> Option<String> {
    let groups: Vec<&str> = text.split_whitespace().filter(|w| is_digit_group(w)).collect();
    (groups.len() * GROUP_LEN == IDENTIFIER_LEN).then(|| groups.join(" "))
}

fn is_digit_group(word: &str) -> bool {
    word.len() == GROUP_LEN && word.bytes().all(|b| b.is_ascii_digit())
}

/// 整行候选
///
/// 返回第一行长度超过 12 个字符且只含数字和空格的行。
pub fn line_candidate(text: &str) -> Option<String> {
    text.split('\n')
        .filter(|line| line.chars().count() > IDENTIFIER_LEN)
        .find(|line| DIGIT_LINE.is_match(line))
        .map(|line| line.to_string())
}

/// 解析一次 OCR 输出的全部候选
///
/// 两种方式的结果都保留，不互相去重；去重由 [`CandidateSet`] 完成。
pub fn parse_candidates(text: &str) -> Vec<String> {
    grouped_candidate(text)
        .into_iter()
        .chain(line_candidate(text))
        .collect()
}

pub(crate) fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_three_groups() {
        let text = "GOVERNMENT OF INDIA\nName\n2341 2341 2346\nVID";
        assert_eq!(grouped_candidate(text), Some("2341 2341 2346".to_string()));
    }

    #[test]
    fn test_grouped_requires_exactly_twelve_digits() {
        // 两组、四组都不是 12 位
        assert_eq!(grouped_candidate("1234 5678 DOB"), None);
        assert_eq!(grouped_candidate("1234 5678 9012 3456"), None);
    }

    #[test]
    fn test_grouped_counts_every_group_in_text() {
        // 出生年份和 VID 段也计入，总计 20 位，不构成候选
        let text = "Year of Birth : 1985\nMale\n2341 2341 2346\nVID 1234";
        assert_eq!(grouped_candidate(text), None);

        // 被其他词隔开的分组仍然拼在一起
        assert_eq!(
            grouped_candidate("2341 2341 DOB 2346"),
            Some("2341 2341 2346".to_string())
        );
        assert_eq!(grouped_candidate("2346 1990 2020 DOB 2341"), None);
    }

    #[test]
    fn test_line_candidate() {
        let text = "Male\n2341 2341 2346\n";
        assert_eq!(line_candidate(text), Some("2341 2341 2346".to_string()));
        assert_eq!(line_candidate("12 34\nabc 1234 5678 9012"), None);
    }

    #[test]
    fn test_line_candidate_requires_more_than_twelve_chars() {
        assert_eq!(line_candidate("234123412346"), None);
        assert_eq!(line_candidate("2341234123460"), Some("2341234123460".to_string()));
    }

    #[test]
    fn test_parse_keeps_both_forms() {
        let text = "2341 2341 2346";
        let parsed = parse_candidates(text);
        assert_eq!(parsed.len(), 2);

        let set: CandidateSet = parsed.iter().map(String::as_str).collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains("234123412346"));
    }

    #[test]
    fn test_candidate_set_normalizes() {
        let mut set = CandidateSet::new();
        assert!(set.insert("2341 2341\t2346"));
        assert!(!set.insert("234123412346"));
        assert!(!set.insert("   "));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["234123412346"]);
    }
}
