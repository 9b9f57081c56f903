//! 题库选题服务 - 业务能力层
//!
//! 只负责"搜索题库 + 把选中的题转成草稿题"，不关心怎么合并进草稿

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clients::QuestionBankApi;
use crate::error::SelectionError;
use crate::models::{BankFilter, BankQuestion, QuestionDraft};
use crate::services::answer_policy::{resolve_correct_index, AnswerMatchPolicy, AnswerResolution};
use crate::utils::truncate_text;

/// 题库选题服务
pub struct QuestionBankSelector {
    api: Arc<dyn QuestionBankApi>,
    policy: AnswerMatchPolicy,
}

impl QuestionBankSelector {
    pub fn new(api: Arc<dyn QuestionBankApi>) -> Self {
        Self::with_policy(api, AnswerMatchPolicy::Lenient)
    }

    pub fn with_policy(api: Arc<dyn QuestionBankApi>, policy: AnswerMatchPolicy) -> Self {
        Self { api, policy }
    }

    /// 按条件搜索题库，科目必填
    pub async fn search(&self, filter: &BankFilter) -> Result<BankSelection, SelectionError> {
        if filter.subject.trim().is_empty() {
            return Err(SelectionError::MissingSubject);
        }

        debug!(
            "题库搜索 - 科目: {}, 难度: {:?}, 语言: {:?}",
            filter.subject, filter.criticality, filter.language
        );

        let results = self
            .api
            .search_question_bank(filter)
            .await
            .map_err(SelectionError::SearchFailed)?;

        info!("✓ 题库搜索完成，找到 {} 道题", results.len());
        Ok(BankSelection::new(results))
    }

    /// 把选中的题库题转换为草稿题
    pub fn to_drafts<'a>(
        &self,
        selected: impl IntoIterator<Item = &'a BankQuestion>,
    ) -> Vec<QuestionDraft> {
        selected
            .into_iter()
            .map(|bank| {
                let resolution =
                    resolve_correct_index(&bank.options, &bank.correct_answer, self.policy);
                if !matches!(resolution, AnswerResolution::Matched(_)) {
                    warn!(
                        "⚠️ 题库题 {} '{}' 的正确答案 '{}' 不在选项中 ({:?})",
                        bank.id,
                        truncate_text(&bank.question, 30),
                        bank.correct_answer,
                        resolution
                    );
                }
                QuestionDraft::from_option_list(
                    bank.question.clone(),
                    bank.options.clone(),
                    resolution.index(),
                )
            })
            .collect()
    }
}

/// 一次搜索的结果及其多选状态
#[derive(Debug, Clone, Default)]
pub struct BankSelection {
    results: Vec<BankQuestion>,
    selected: BTreeSet<String>,
}

impl BankSelection {
    pub fn new(results: Vec<BankQuestion>) -> Self {
        Self {
            results,
            selected: BTreeSet::new(),
        }
    }

    pub fn results(&self) -> &[BankQuestion] {
        &self.results
    }

    /// 选中；不在结果中的 ID 会被忽略，返回是否生效
    pub fn select(&mut self, id: &str) -> bool {
        if self.results.iter().any(|q| q.id == id) {
            self.selected.insert(id.to_string());
            true
        } else {
            false
        }
    }

    /// 切换选中状态，返回切换后是否选中
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.select(id)
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.results.iter().map(|q| q.id.clone()).collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// 选中的题，按搜索结果顺序
    pub fn selected_questions(&self) -> impl Iterator<Item = &BankQuestion> {
        self.results
            .iter()
            .filter(move |q| self.selected.contains(&q.id))
    }
}
