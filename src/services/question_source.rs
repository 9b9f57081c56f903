//! 题目来源
//!
//! 四种来源统一成一个枚举，经 [`ingest`] 转换为 `QuestionDraft` 列表后交给合并器。

use crate::error::{AppResult, SelectionError};
use crate::models::{QuestionDraft, SpreadsheetRow};
use crate::services::bank_selector::{BankSelection, QuestionBankSelector};
use crate::services::spreadsheet_parser::SpreadsheetQuestionParser;

#[derive(Debug, Clone)]
pub enum QuestionSource {
    /// 手工录入（已填写的题目）
    Manual(Vec<QuestionDraft>),
    /// 表格行
    Spreadsheet(Vec<SpreadsheetRow>),
    /// AI 任务成功后交付的题目
    Generated(Vec<QuestionDraft>),
    /// 题库搜索结果 + 多选状态
    Bank(BankSelection),
}

impl QuestionSource {
    pub fn name(&self) -> &'static str {
        match self {
            QuestionSource::Manual(_) => "手工录入",
            QuestionSource::Spreadsheet(_) => "表格导入",
            QuestionSource::Generated(_) => "AI 出题",
            QuestionSource::Bank(_) => "题库选题",
        }
    }
}

/// 把来源转换为待合并的题目
pub fn ingest(
    source: QuestionSource,
    parser: &SpreadsheetQuestionParser,
    selector: &QuestionBankSelector,
) -> AppResult<Vec<QuestionDraft>> {
    match source {
        QuestionSource::Manual(questions) | QuestionSource::Generated(questions) => Ok(questions),
        QuestionSource::Spreadsheet(rows) => Ok(parser.parse(&rows)?),
        QuestionSource::Bank(selection) => {
            if selection.selected_count() == 0 {
                return Err(SelectionError::NothingSelected.into());
            }
            Ok(selector.to_drafts(selection.selected_questions()))
        }
    }
}
