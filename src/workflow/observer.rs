//! 草稿事件回调
//!
//! 回调按事件发生顺序同步执行，不合并。执行回调时会话不持有任何锁，
//! 回调内部可以再调用同一个 `ExamDraftSession`；由此触发的事件排在当前事件之后。

use tracing::{info, warn};

use crate::error::{SubmissionError, ValidationError};
use crate::models::{ExamDraft, PersistedExam};
use crate::services::{JobSnapshot, JobState};

pub trait DraftObserver: Send + Sync {
    fn on_draft_changed(&self, _draft: &ExamDraft) {}

    fn on_validation_failed(&self, _error: &ValidationError) {}

    fn on_job_state_changed(&self, _snapshot: &JobSnapshot) {}

    fn on_submit_result(&self, _result: &Result<PersistedExam, SubmissionError>) {}
}

/// 只写日志的观察者（无界面运行时使用）
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DraftObserver for TracingObserver {
    fn on_draft_changed(&self, draft: &ExamDraft) {
        info!(
            "📝 草稿已更新: {} 道题，其中 {} 道完整",
            draft.questions().len(),
            draft.complete_questions().count()
        );
    }

    fn on_validation_failed(&self, error: &ValidationError) {
        warn!("⚠️ 校验未通过 (规则 {}): {}", error.rule(), error);
    }

    fn on_job_state_changed(&self, snapshot: &JobSnapshot) {
        match snapshot.state {
            JobState::Polling => info!(
                "🤖 AI 出题{}: 第 {} 次查询",
                snapshot.state, snapshot.attempt_count
            ),
            _ => info!("🤖 AI 出题{}", snapshot.state),
        }
    }

    fn on_submit_result(&self, result: &Result<PersistedExam, SubmissionError>) {
        match result {
            Ok(exam) => info!("✅ 提交成功: {}", exam.id),
            Err(err) => warn!("❌ 提交失败: {}", err),
        }
    }
}
