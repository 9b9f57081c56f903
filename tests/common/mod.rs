//! 集成测试共用的协作方内存实现
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use exam_draft_composer::clients::{
    ExamStore, GenerationApi, QuestionBankApi, SessionContext, StaticSession,
};
use exam_draft_composer::error::{ApiError, ApiResult, SubmissionError, ValidationError};
use exam_draft_composer::models::{
    parse_local_datetime, BankFilter, BankQuestion, ExamDraft, ExamPayload, GeneratedQuestion,
    GenerationRequest, PersistedExam, SpreadsheetRow, SubmitMode,
};
use exam_draft_composer::services::{JobSnapshot, JobState};
use exam_draft_composer::workflow::{Collaborators, DraftObserver};
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::Notify;

// ========== AI 出题 ==========

#[derive(Debug, Clone)]
pub enum StatusReply {
    Empty,
    Questions(Vec<GeneratedQuestion>),
    Fail,
}

/// 按脚本回复的出题服务；脚本用完后一直回复空列表
#[derive(Default)]
pub struct FakeGeneration {
    reject_request: bool,
    replies: Mutex<VecDeque<StatusReply>>,
    request_gate: Option<Arc<Notify>>,
    status_gate: Option<Arc<Notify>>,
    pub request_calls: AtomicU32,
    pub status_calls: AtomicU32,
}

impl FakeGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            reject_request: true,
            ..Self::default()
        }
    }

    pub fn with_replies(mut self, replies: impl IntoIterator<Item = StatusReply>) -> Self {
        self.replies = Mutex::new(replies.into_iter().collect());
        self
    }

    /// 出题请求在 gate 被通知之前不返回
    pub fn with_request_gate(mut self, gate: Arc<Notify>) -> Self {
        self.request_gate = Some(gate);
        self
    }

    /// 状态查询在 gate 被通知之前不返回
    pub fn with_status_gate(mut self, gate: Arc<Notify>) -> Self {
        self.status_gate = Some(gate);
        self
    }

    pub fn requests(&self) -> u32 {
        self.request_calls.load(Ordering::SeqCst)
    }

    pub fn status_checks(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

impl GenerationApi for FakeGeneration {
    fn request_question_generation<'a>(
        &'a self,
        _request: &'a GenerationRequest,
    ) -> BoxFuture<'a, ApiResult<String>> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.request_gate.clone();
        let reject = self.reject_request;
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if reject {
                return Err(ApiError::rejected("api/ai/questions/generate", 503, "model busy"));
            }
            Ok("ref-1".to_string())
        }
        .boxed()
    }

    fn check_generation_status<'a>(
        &'a self,
        _reference_key: &'a str,
    ) -> BoxFuture<'a, ApiResult<Vec<GeneratedQuestion>>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StatusReply::Empty);
        let gate = self.status_gate.clone();
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            match reply {
                StatusReply::Empty => Ok(Vec::new()),
                StatusReply::Questions(items) => Ok(items),
                StatusReply::Fail => Err(ApiError::rejected(
                    "api/ai/questions/status/ref-1",
                    500,
                    "internal error",
                )),
            }
        }
        .boxed()
    }
}

pub fn generated(prompt: &str, answer: &str) -> GeneratedQuestion {
    GeneratedQuestion {
        question: prompt.to_string(),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_answer: answer.to_string(),
    }
}

pub fn generation_request(count: u32) -> GenerationRequest {
    GenerationRequest {
        subject: "Math".into(),
        criticality: "medium".into(),
        question_count: count,
        language: "English".into(),
    }
}

// ========== 题库 ==========

#[derive(Default)]
pub struct FakeBank {
    pub results: Vec<BankQuestion>,
}

impl QuestionBankApi for FakeBank {
    fn search_question_bank<'a>(
        &'a self,
        filter: &'a BankFilter,
    ) -> BoxFuture<'a, ApiResult<Vec<BankQuestion>>> {
        let results = self
            .results
            .iter()
            .filter(|q| q.criticality.is_none() || q.criticality == filter.criticality)
            .cloned()
            .collect();
        async move { Ok(results) }.boxed()
    }
}

pub fn bank_question(id: &str, answer: &str) -> BankQuestion {
    BankQuestion {
        id: id.to_string(),
        question: format!("bank question {}", id),
        options: vec!["w".into(), "x".into(), "y".into(), "z".into()],
        correct_answer: answer.to_string(),
        criticality: None,
        language: None,
    }
}

// ========== 考试保存 ==========

#[derive(Default)]
pub struct FakeStore {
    pub payloads: Mutex<Vec<(ExamPayload, SubmitMode)>>,
    reject: bool,
    gate: Option<Arc<Notify>>,
}

impl FakeStore {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> Vec<(ExamPayload, SubmitMode)> {
        self.payloads.lock().unwrap().clone()
    }
}

impl ExamStore for FakeStore {
    fn persist_exam<'a>(
        &'a self,
        payload: &'a ExamPayload,
        mode: SubmitMode,
    ) -> BoxFuture<'a, ApiResult<PersistedExam>> {
        self.payloads.lock().unwrap().push((payload.clone(), mode));
        let gate = self.gate.clone();
        let reject = self.reject;
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if reject {
                return Err(ApiError::rejected("api/exams", 400, "batch not found"));
            }
            Ok(PersistedExam {
                id: payload.id.clone().unwrap_or_else(|| "exam-new".into()),
                subject_name: payload.subject_name.clone(),
                teacher_name: payload.teacher_name.clone(),
                org_code: payload.org_code.clone(),
                batch: payload.batch.clone(),
                start_time: payload.start_time.clone(),
                end_time: payload.end_time.clone(),
                duration: Some(payload.duration),
                is_active: payload.is_active,
                questions: payload.questions.clone(),
            })
        }
        .boxed()
    }
}

// ========== 观察者 ==========

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    DraftChanged { questions: usize },
    ValidationFailed(ValidationError),
    JobState(JobState),
    SubmitOk(String),
    SubmitErr,
}

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn job_states(&self) -> Vec<JobState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::JobState(state) => Some(state),
                _ => None,
            })
            .collect()
    }
}

impl DraftObserver for RecordingObserver {
    fn on_draft_changed(&self, draft: &ExamDraft) {
        self.events.lock().unwrap().push(Event::DraftChanged {
            questions: draft.questions().len(),
        });
    }

    fn on_validation_failed(&self, error: &ValidationError) {
        self.events.lock().unwrap().push(Event::ValidationFailed(*error));
    }

    fn on_job_state_changed(&self, snapshot: &JobSnapshot) {
        self.events.lock().unwrap().push(Event::JobState(snapshot.state));
    }

    fn on_submit_result(&self, result: &Result<PersistedExam, SubmissionError>) {
        let event = match result {
            Ok(exam) => Event::SubmitOk(exam.id.clone()),
            Err(_) => Event::SubmitErr,
        };
        self.events.lock().unwrap().push(event);
    }
}

// ========== 组装 ==========

pub struct Harness {
    pub generation: Arc<FakeGeneration>,
    pub bank: Arc<FakeBank>,
    pub store: Arc<FakeStore>,
    pub session: Arc<dyn SessionContext>,
}

impl Harness {
    pub fn new(generation: FakeGeneration, bank: FakeBank, store: FakeStore) -> Self {
        Self {
            generation: Arc::new(generation),
            bank: Arc::new(bank),
            store: Arc::new(store),
            session: Arc::new(StaticSession::new("ORG-1")),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            generation: self.generation.clone(),
            bank: self.bank.clone(),
            store: self.store.clone(),
            session: self.session.clone(),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(FakeGeneration::new(), FakeBank::default(), FakeStore::default())
    }
}

pub fn sheet_row(prompt: &str, options: [&str; 4], answer: &str) -> SpreadsheetRow {
    SpreadsheetRow::new()
        .with("Question", prompt)
        .with("Option 1", options[0])
        .with("Option 2", options[1])
        .with("Option 3", options[2])
        .with("Option 4", options[3])
        .with("Correct Answer", answer)
}

/// 填写通过校验所需的考试信息
pub fn fill_metadata(draft: &mut exam_draft_composer::models::ExamDraftMetadata) {
    draft.subject_name = "Math".into();
    draft.teacher_name = "Ms. Li".into();
    draft.batch = "2024-A".into();
    draft.duration_minutes = Some(60);
    draft.start_time = parse_local_datetime("2024-06-01T09:00");
    draft.end_time = parse_local_datetime("2024-06-01T10:00");
}
