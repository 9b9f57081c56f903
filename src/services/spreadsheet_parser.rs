//! 表格导入服务 - 业务能力层
//!
//! 把表格行转换为 `QuestionDraft` 列表。全有或全无：任何一行有问题，
//! 整个导入被拒绝，并一次性报告所有行的所有问题。

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::{ParseError, RowIssue};
use crate::models::{QuestionDraft, SpreadsheetRow, OPTION_COUNT};
use crate::services::answer_policy::{resolve_correct_index, AnswerMatchPolicy, AnswerResolution};

pub const QUESTION_COLUMN: &str = "Question";
pub const OPTION_COLUMNS: [&str; OPTION_COUNT] = ["Option 1", "Option 2", "Option 3", "Option 4"];
pub const CORRECT_ANSWER_COLUMN: &str = "Correct Answer";

/// 必需的列（按表头顺序）
pub const REQUIRED_COLUMNS: [&str; 6] = [
    QUESTION_COLUMN,
    OPTION_COLUMNS[0],
    OPTION_COLUMNS[1],
    OPTION_COLUMNS[2],
    OPTION_COLUMNS[3],
    CORRECT_ANSWER_COLUMN,
];

/// 表格题目解析器
pub struct SpreadsheetQuestionParser {
    policy: AnswerMatchPolicy,
}

impl SpreadsheetQuestionParser {
    pub fn new() -> Self {
        Self::with_policy(AnswerMatchPolicy::Strict)
    }

    pub fn with_policy(policy: AnswerMatchPolicy) -> Self {
        Self { policy }
    }

    /// 解析所有行
    ///
    /// # 返回
    /// 成功时按文件顺序每行一道题；失败时返回全部错误，不产生任何题目
    pub fn parse(&self, rows: &[SpreadsheetRow]) -> Result<Vec<QuestionDraft>, Vec<ParseError>> {
        let Some(first) = rows.first() else {
            warn!("⚠️ 表格为空");
            return Err(vec![ParseError::EmptySheet]);
        };

        let header = normalize_row(first);
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !header.contains_key(**column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            warn!("⚠️ 表格缺少列: {}", missing.join(", "));
            return Err(vec![ParseError::MissingColumns(missing)]);
        }

        let mut drafts = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            // 表头占第 1 行
            let line = index + 2;
            match self.parse_row(&normalize_row(row)) {
                Ok(draft) => drafts.push(draft),
                Err(issues) => {
                    debug!("第 {} 行有 {} 个问题", line, issues.len());
                    errors.extend(issues.into_iter().map(|issue| ParseError::Row { row: line, issue }));
                }
            }
        }

        if errors.is_empty() {
            info!("✓ 表格解析完成，共 {} 道题", drafts.len());
            Ok(drafts)
        } else {
            warn!("⚠️ 表格导入被拒绝: {} 个错误", errors.len());
            Err(errors)
        }
    }

    fn parse_row(&self, row: &HashMap<String, String>) -> Result<QuestionDraft, Vec<RowIssue>> {
        let mut issues = Vec::new();

        let prompt = cell(row, QUESTION_COLUMN);
        if prompt.is_empty() {
            issues.push(RowIssue::EmptyPrompt);
        }

        let options: [String; OPTION_COUNT] = OPTION_COLUMNS.map(|column| cell(row, column).to_string());
        for (i, option) in options.iter().enumerate() {
            if option.is_empty() {
                issues.push(RowIssue::EmptyOption(i + 1));
            }
        }

        let answer = cell(row, CORRECT_ANSWER_COLUMN);
        let mut correct = None;
        if answer.is_empty() {
            issues.push(RowIssue::EmptyCorrectAnswer);
        } else {
            match resolve_correct_index(&options, answer, self.policy) {
                AnswerResolution::NotFound => {
                    issues.push(RowIssue::AnswerNotInOptions(answer.to_string()))
                }
                AnswerResolution::Ambiguous => {
                    issues.push(RowIssue::AmbiguousAnswer(answer.to_string()))
                }
                resolution => correct = resolution.index(),
            }
        }

        if issues.is_empty() {
            Ok(QuestionDraft::new(prompt, options, correct))
        } else {
            Err(issues)
        }
    }
}

impl Default for SpreadsheetQuestionParser {
    fn default() -> Self {
        Self::new()
    }
}

fn cell<'a>(row: &'a HashMap<String, String>, column: &str) -> &'a str {
    row.get(column).map(|v| v.trim()).unwrap_or("")
}

/// 规范化表头：去掉首尾空白，内部连续空白合并为一个空格
fn normalize_header(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_row(row: &SpreadsheetRow) -> HashMap<String, String> {
    row.cells()
        .map(|(column, value)| (normalize_header(column), value.to_string()))
        .collect()
}
