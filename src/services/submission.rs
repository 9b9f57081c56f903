//! 考试提交 - 业务能力层
//!
//! 把草稿规范化为提交 payload，并保证同一时间只有一次提交在进行。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use crate::clients::{ExamStore, SessionContext};
use crate::error::SubmissionError;
use crate::models::{
    format_wall_clock, ExamDraft, ExamPayload, PersistedExam, QuestionPayload, SubmitMode,
};

/// 考试提交协调器
pub struct ExamSubmissionCoordinator {
    store: Arc<dyn ExamStore>,
    session: Arc<dyn SessionContext>,
    in_flight: AtomicBool,
}

/// 提交中标记：释放时复位
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExamSubmissionCoordinator {
    pub fn new(store: Arc<dyn ExamStore>, session: Arc<dyn SessionContext>) -> Self {
        Self {
            store,
            session,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// 构建提交 payload
    ///
    /// 只包含完整的题目，正确答案以选项文本提交。时间按本地时间原样格式化。
    pub fn build_payload(&self, draft: &ExamDraft, mode: SubmitMode) -> ExamPayload {
        let meta = &draft.metadata;

        let questions = draft
            .complete_questions()
            .filter_map(|q| {
                let answer = q.correct_answer()?;
                Some(QuestionPayload {
                    question: q.prompt.trim().to_string(),
                    options: q.options.iter().map(|o| o.trim().to_string()).collect(),
                    correct_answer: answer.trim().to_string(),
                })
            })
            .collect();

        let mut org_code = self.session.current_organization_code();
        if org_code.trim().is_empty() {
            org_code = meta.organization_code.clone();
        }

        ExamPayload {
            id: match mode {
                SubmitMode::Update => draft.exam_id.clone(),
                SubmitMode::Create => None,
            },
            subject_name: meta.subject_name.trim().to_string(),
            teacher_name: meta.teacher_name.trim().to_string(),
            org_code,
            batch: meta.batch.trim().to_string(),
            start_time: meta.start_time.as_ref().map(format_wall_clock).unwrap_or_default(),
            end_time: meta.end_time.as_ref().map(format_wall_clock).unwrap_or_default(),
            duration: meta.duration_minutes.unwrap_or_default(),
            is_active: meta.is_active,
            questions,
        }
    }

    /// 提交草稿（调用方负责先校验）
    ///
    /// 已有提交进行中时直接返回 `AlreadyInFlight`，不会发出第二个请求
    pub async fn submit(
        &self,
        draft: &ExamDraft,
        mode: SubmitMode,
    ) -> Result<PersistedExam, SubmissionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmissionError::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let payload = self.build_payload(draft, mode);
        info!(
            "📤 提交考试 ({:?}) - 科目: {}, 题目数: {}",
            mode,
            payload.subject_name,
            payload.questions.len()
        );

        match self.store.persist_exam(&payload, mode).await {
            Ok(persisted) => {
                info!("✓ 考试已保存: {}", persisted.id);
                Ok(persisted)
            }
            Err(err) => {
                let err = SubmissionError::from(err);
                error!("❌ 提交失败: {}", err);
                Err(err)
            }
        }
    }
}
