//! 题目列表合并 - 业务能力层
//!
//! 与来源无关：手工、表格、AI、题库产出的题目都按同一规则并入草稿。

use tracing::debug;

use crate::models::{ExamDraft, QuestionDraft, QuestionId};

/// 题目列表合并器
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionListAssembler;

impl QuestionListAssembler {
    /// 合并题目列表
    ///
    /// - 当前只有一道空白占位题：整体替换为 `incoming`
    /// - 否则：`current` 后追加 `incoming`，保持两边的相对顺序，不去重
    pub fn merge(
        &self,
        current: Vec<QuestionDraft>,
        incoming: Vec<QuestionDraft>,
    ) -> Vec<QuestionDraft> {
        if let [only] = current.as_slice() {
            if only.is_placeholder() {
                debug!("替换空白占位题，新增 {} 道", incoming.len());
                return incoming;
            }
        }

        let mut merged = current;
        merged.extend(incoming);
        merged
    }

    /// 把题目并入草稿，返回并入的数量
    pub fn merge_into(&self, draft: &mut ExamDraft, incoming: Vec<QuestionDraft>) -> usize {
        let count = incoming.len();
        let current = draft.take_questions();
        draft.set_questions(self.merge(current, incoming));
        count
    }

    /// 追加一道新的空白题，返回其 id
    pub fn add_blank(&self, draft: &mut ExamDraft) -> QuestionId {
        let blank = QuestionDraft::placeholder();
        let id = blank.id;
        let mut questions = draft.take_questions();
        questions.push(blank);
        draft.set_questions(questions);
        id
    }

    /// 按 id 删除题目
    pub fn remove(&self, draft: &mut ExamDraft, id: QuestionId) -> Option<QuestionDraft> {
        let mut questions = draft.take_questions();
        let removed = questions
            .iter()
            .position(|q| q.id == id)
            .map(|index| questions.remove(index));
        draft.set_questions(questions);
        removed
    }
}
