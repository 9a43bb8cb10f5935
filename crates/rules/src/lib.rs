//! Identifier rules: checksum, candidate parsing and region matching.

mod candidates;
mod checksum;

pub use candidates::{grouped_candidate, line_candidate, parse_candidates, CandidateSet};
pub use checksum::{validate, IDENTIFIER_LEN};

use serde::{Deserialize, Serialize};
use std::fmt;

/// 遮盖匹配时数字词的最小长度
pub const MIN_MATCH_LEN: usize = 2;

/// 身份号码
///
/// 12 位 ASCII 数字，无分隔符。创建后不可修改。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// 去掉空白后校验，通过 Verhoeff 校验才返回
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = candidates::strip_whitespace(raw);
        validate(&digits).then_some(Self(digits))
    }

    /// 只要求 12 位数字，不做校验位检查（宽松模式）
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let digits = candidates::strip_whitespace(raw);
        let well_formed =
            digits.len() == IDENTIFIER_LEN && digits.bytes().all(|b| b.is_ascii_digit());
        well_formed.then_some(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    /// 日志中只显示末四位
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XXXX XXXX {}", &self.0[IDENTIFIER_LEN - 4..])
    }
}

/// 判断 OCR 词是否需要遮盖
///
/// 去空白后全为数字、长度至少 2，且是某个号码的子串。
/// 子串策略会遮盖偶然命中的短数字，这是为了覆盖 OCR 把号码拆成多段的情况。
pub fn token_matches(token: &str, identifiers: &[Identifier]) -> bool {
    let token = token.trim();
    if token.len() < MIN_MATCH_LEN || !token.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    identifiers.iter().any(|id| id.as_str().contains(token))
}
