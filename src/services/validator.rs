//! 提交前校验 - 业务能力层
//!
//! 按固定顺序检查 9 条规则，遇到第一条不满足的规则就返回。

use crate::error::ValidationError;
use crate::models::{ExamDraft, SubmitMode};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExamDraftValidator;

impl ExamDraftValidator {
    pub fn validate(&self, draft: &ExamDraft, mode: SubmitMode) -> Result<(), ValidationError> {
        let meta = &draft.metadata;

        if is_blank(&meta.subject_name) {
            return Err(ValidationError::MissingSubjectName);
        }
        if is_blank(&meta.teacher_name) {
            return Err(ValidationError::MissingTeacherName);
        }
        if is_blank(&meta.batch) {
            return Err(ValidationError::MissingBatch);
        }
        if !matches!(meta.duration_minutes, Some(minutes) if minutes > 0) {
            return Err(ValidationError::InvalidDuration);
        }
        let start = meta.start_time.ok_or(ValidationError::MissingStartTime)?;
        let end = meta.end_time.ok_or(ValidationError::MissingEndTime)?;
        if end <= start {
            return Err(ValidationError::EndNotAfterStart);
        }
        if draft.complete_questions().next().is_none() {
            return Err(ValidationError::NoCompleteQuestions);
        }
        if mode == SubmitMode::Update && draft.exam_id.as_deref().map_or(true, is_blank) {
            return Err(ValidationError::MissingExamId);
        }

        Ok(())
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
