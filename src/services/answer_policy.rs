//! 正确答案定位
//!
//! 所有来源（表格、题库、AI）都用同一个函数把"正确答案字符串"换算成选项下标，
//! 差异只体现在 [`AnswerMatchPolicy`] 上。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 正确答案匹配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMatchPolicy {
    /// 必须恰好匹配一个选项，否则视为错误
    Strict,
    /// 取第一个匹配的选项，没有匹配时回退到第 0 个
    Lenient,
}

impl FromStr for AnswerMatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(AnswerMatchPolicy::Strict),
            "lenient" => Ok(AnswerMatchPolicy::Lenient),
            other => Err(format!("未知的答案匹配策略: {}", other)),
        }
    }
}

impl fmt::Display for AnswerMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerMatchPolicy::Strict => write!(f, "strict"),
            AnswerMatchPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// 匹配结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerResolution {
    Matched(usize),
    /// 宽松策略下没有匹配，回退到 0
    FellBack,
    NotFound,
    Ambiguous,
}

impl AnswerResolution {
    /// 最终使用的下标；严格策略失败时为 `None`
    pub fn index(self) -> Option<usize> {
        match self {
            AnswerResolution::Matched(i) => Some(i),
            AnswerResolution::FellBack => Some(0),
            AnswerResolution::NotFound | AnswerResolution::Ambiguous => None,
        }
    }
}

/// 在选项中查找正确答案（比较前两边都 trim，区分大小写）
pub fn resolve_correct_index<S: AsRef<str>>(
    options: &[S],
    answer: &str,
    policy: AnswerMatchPolicy,
) -> AnswerResolution {
    let answer = answer.trim();
    let mut matches = options
        .iter()
        .enumerate()
        .filter(|(_, option)| !answer.is_empty() && option.as_ref().trim() == answer)
        .map(|(i, _)| i);

    let first = matches.next();
    let has_more = matches.next().is_some();

    match (policy, first) {
        (AnswerMatchPolicy::Strict, Some(_)) if has_more => AnswerResolution::Ambiguous,
        (_, Some(i)) => AnswerResolution::Matched(i),
        (AnswerMatchPolicy::Strict, None) => AnswerResolution::NotFound,
        (AnswerMatchPolicy::Lenient, None) => AnswerResolution::FellBack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: [&str; 4] = ["3", " 4 ", "5", "6"];

    #[test]
    fn matches_trimmed_option() {
        assert_eq!(
            resolve_correct_index(&OPTIONS, "4", AnswerMatchPolicy::Strict),
            AnswerResolution::Matched(1)
        );
    }

    #[test]
    fn match_is_case_sensitive() {
        let options = ["Paris", "London", "Rome", "Berlin"];
        assert_eq!(
            resolve_correct_index(&options, "paris", AnswerMatchPolicy::Strict),
            AnswerResolution::NotFound
        );
    }

    #[test]
    fn lenient_falls_back_to_first_option() {
        let resolution = resolve_correct_index(&OPTIONS, "42", AnswerMatchPolicy::Lenient);
        assert_eq!(resolution, AnswerResolution::FellBack);
        assert_eq!(resolution.index(), Some(0));
    }

    #[test]
    fn strict_rejects_duplicate_matches() {
        let options = ["yes", "no", "yes", "maybe"];
        assert_eq!(
            resolve_correct_index(&options, "yes", AnswerMatchPolicy::Strict),
            AnswerResolution::Ambiguous
        );
        assert_eq!(
            resolve_correct_index(&options, "yes", AnswerMatchPolicy::Lenient),
            AnswerResolution::Matched(0)
        );
    }

    #[test]
    fn policy_parses_from_env_text() {
        assert_eq!("Strict".parse::<AnswerMatchPolicy>(), Ok(AnswerMatchPolicy::Strict));
        assert!("loose".parse::<AnswerMatchPolicy>().is_err());
    }
}
