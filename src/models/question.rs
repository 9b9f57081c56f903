use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 每道选择题的选项数量
pub const OPTION_COUNT: usize = 4;

/// 草稿内题目的标识，只在草稿内唯一，不会被持久化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionId(Uuid);

impl QuestionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 草稿中的一道选择题
///
/// 题干 + 4 个选项 + 正确选项下标（可能未设置）。
/// 新建草稿时的空白占位题就是一个未完成的 `QuestionDraft`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub options: [String; OPTION_COUNT],
    /// 0..=3，`None` 表示尚未选择
    pub correct_option: Option<usize>,
}

impl QuestionDraft {
    pub fn new(
        prompt: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_option: Option<usize>,
    ) -> Self {
        Self {
            id: QuestionId::new(),
            prompt: prompt.into(),
            options,
            correct_option,
        }
    }

    /// 空白占位题（带新的 id）
    pub fn placeholder() -> Self {
        Self::new(String::new(), Default::default(), None)
    }

    /// 从任意长度的选项列表构造：多余的丢弃，不足的补空串
    pub fn from_option_list(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: Option<usize>,
    ) -> Self {
        let mut slots: [String; OPTION_COUNT] = Default::default();
        for (slot, option) in slots.iter_mut().zip(options) {
            *slot = option;
        }
        Self::new(prompt, slots, correct_option)
    }

    /// 题干非空、4 个选项都非空、且已选择正确选项
    pub fn is_complete(&self) -> bool {
        !self.prompt.trim().is_empty()
            && self.options.iter().all(|o| !o.trim().is_empty())
            && self.correct_option.is_some_and(|i| i < OPTION_COUNT)
    }

    /// 题干、选项全空且没有正确选项
    pub fn is_placeholder(&self) -> bool {
        self.prompt.is_empty()
            && self.options.iter().all(|o| o.is_empty())
            && self.correct_option.is_none()
    }

    /// 正确选项对应的文本
    pub fn correct_answer(&self) -> Option<&str> {
        self.correct_option
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }

    /// 忽略 id 比较内容
    pub fn same_content(&self, other: &QuestionDraft) -> bool {
        self.prompt == other.prompt
            && self.options == other.options
            && self.correct_option == other.correct_option
    }
}
