//! 组卷会话 - 流程层
//!
//! 持有正在编辑的草稿，把四种题目来源、AI 出题任务、校验和提交串成一个流程。
//!
//! 草稿锁只在读写草稿时短暂持有；观察者回调在释放所有锁之后按事件顺序派发，
//! 回调里可以读取草稿、查询任务，也可以取消任务。

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::clients::{ExamStore, GenerationApi, QuestionBankApi, SessionContext};
use crate::config::Config;
use crate::error::{AppResult, GenerationError, SelectionError, SubmissionError};
use crate::models::{
    BankFilter, ExamDraft, ExamDraftMetadata, GenerationRequest, PersistedExam, QuestionDraft,
    QuestionId, SpreadsheetRow, SubmitMode,
};
use crate::services::{
    ingest, AnswerMatchPolicy, BankSelection, ExamDraftValidator, ExamSubmissionCoordinator,
    GenerationJobController, JobObserver, JobSnapshot, PollSettings, QuestionBankSelector,
    QuestionListAssembler, QuestionSource, SpreadsheetQuestionParser,
};
use crate::utils::SerialDispatcher;
use crate::workflow::observer::DraftObserver;

/// 会话依赖的外部协作方
#[derive(Clone)]
pub struct Collaborators {
    pub generation: Arc<dyn GenerationApi>,
    pub bank: Arc<dyn QuestionBankApi>,
    pub store: Arc<dyn ExamStore>,
    pub session: Arc<dyn SessionContext>,
}

struct DraftState {
    draft: ExamDraft,
    mode: SubmitMode,
}

/// 会话事件，在锁内入队、锁外派发
enum SessionEvent {
    DraftChanged(ExamDraft),
    JobStateChanged(JobSnapshot),
}

/// 草稿与观察者，会话和任务回调共用
struct DraftHub {
    state: Mutex<DraftState>,
    observer: Arc<dyn DraftObserver>,
    events: SerialDispatcher<SessionEvent>,
}

impl DraftHub {
    fn lock(&self) -> MutexGuard<'_, DraftState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 在草稿锁内修改并记录快照，释放锁后通知观察者
    fn mutate<T>(&self, f: impl FnOnce(&mut DraftState) -> T) -> T {
        let result = {
            let mut state = self.lock();
            let result = f(&mut state);
            self.events.push(SessionEvent::DraftChanged(state.draft.clone()));
            result
        };
        self.flush();
        result
    }

    fn flush(&self) {
        self.events.drain(|event| match event {
            SessionEvent::DraftChanged(draft) => self.observer.on_draft_changed(&draft),
            SessionEvent::JobStateChanged(snapshot) => {
                self.observer.on_job_state_changed(&snapshot)
            }
        });
    }
}

/// 把任务事件转发给草稿：成功的题目并入草稿
struct SessionJobObserver {
    hub: Arc<DraftHub>,
}

impl JobObserver for SessionJobObserver {
    fn on_state_changed(&self, snapshot: &JobSnapshot) {
        self.hub
            .events
            .push(SessionEvent::JobStateChanged(snapshot.clone()));
        self.hub.flush();
    }

    fn on_questions_ready(&self, questions: Vec<QuestionDraft>) {
        let count = self
            .hub
            .mutate(|state| QuestionListAssembler.merge_into(&mut state.draft, questions));
        info!("✓ AI 题目已并入草稿: {} 道", count);
    }
}

/// 组卷会话
pub struct ExamDraftSession {
    hub: Arc<DraftHub>,
    parser: SpreadsheetQuestionParser,
    selector: QuestionBankSelector,
    validator: ExamDraftValidator,
    coordinator: ExamSubmissionCoordinator,
    generation_api: Arc<dyn GenerationApi>,
    poll_settings: PollSettings,
    generation_policy: AnswerMatchPolicy,
    job: Mutex<Option<Arc<GenerationJobController>>>,
}

impl ExamDraftSession {
    /// 新建考试（Create 模式，只有一道空白题）
    pub fn new(
        collaborators: Collaborators,
        config: &Config,
        observer: Arc<dyn DraftObserver>,
    ) -> Self {
        Self::with_draft(collaborators, config, observer, ExamDraft::new(), SubmitMode::Create)
    }

    /// 编辑已有考试（Update 模式）
    pub fn edit(
        collaborators: Collaborators,
        config: &Config,
        observer: Arc<dyn DraftObserver>,
        exam: PersistedExam,
    ) -> Self {
        info!("✏️ 编辑考试: {}", exam.id);
        let draft = ExamDraft::from_persisted(exam);
        Self::with_draft(collaborators, config, observer, draft, SubmitMode::Update)
    }

    fn with_draft(
        collaborators: Collaborators,
        config: &Config,
        observer: Arc<dyn DraftObserver>,
        draft: ExamDraft,
        mode: SubmitMode,
    ) -> Self {
        Self {
            hub: Arc::new(DraftHub {
                state: Mutex::new(DraftState { draft, mode }),
                observer,
                events: SerialDispatcher::new(),
            }),
            parser: SpreadsheetQuestionParser::with_policy(config.spreadsheet_answer_policy),
            selector: QuestionBankSelector::with_policy(
                collaborators.bank,
                config.bank_answer_policy,
            ),
            validator: ExamDraftValidator,
            coordinator: ExamSubmissionCoordinator::new(
                collaborators.store,
                collaborators.session,
            ),
            generation_api: collaborators.generation,
            poll_settings: PollSettings::from_config(config),
            generation_policy: config.generation_answer_policy,
            job: Mutex::new(None),
        }
    }

    /// 当前草稿的副本
    pub fn draft(&self) -> ExamDraft {
        self.hub.lock().draft.clone()
    }

    pub fn mode(&self) -> SubmitMode {
        self.hub.lock().mode
    }

    /// 修改草稿内容并通知观察者
    fn mutate<T>(&self, f: impl FnOnce(&mut ExamDraft) -> T) -> T {
        self.hub.mutate(|state| f(&mut state.draft))
    }

    // ========== 考试信息 ==========

    pub fn update_metadata(&self, f: impl FnOnce(&mut ExamDraftMetadata)) {
        self.mutate(|draft| f(&mut draft.metadata));
    }

    // ========== 题目列表 ==========

    pub fn add_blank_question(&self) -> QuestionId {
        self.mutate(|draft| QuestionListAssembler.add_blank(draft))
    }

    pub fn remove_question(&self, id: QuestionId) -> bool {
        self.mutate(|draft| QuestionListAssembler.remove(draft, id).is_some())
    }

    /// 编辑单道题；题目不存在时返回 false
    pub fn update_question(&self, id: QuestionId, f: impl FnOnce(&mut QuestionDraft)) -> bool {
        self.mutate(|draft| match draft.question_mut(id) {
            Some(question) => {
                f(question);
                true
            }
            None => false,
        })
    }

    /// 从任意来源导入题目，返回并入的数量
    ///
    /// 转换失败时草稿保持不变
    pub fn ingest(&self, source: QuestionSource) -> AppResult<usize> {
        let name = source.name();
        let questions = ingest(source, &self.parser, &self.selector)?;
        debug!("{}: 准备并入 {} 道题", name, questions.len());
        Ok(self.mutate(|draft| QuestionListAssembler.merge_into(draft, questions)))
    }

    pub fn import_spreadsheet(&self, rows: Vec<SpreadsheetRow>) -> AppResult<usize> {
        self.ingest(QuestionSource::Spreadsheet(rows))
    }

    pub async fn search_bank(&self, filter: &BankFilter) -> Result<BankSelection, SelectionError> {
        self.selector.search(filter).await
    }

    pub fn import_bank_selection(&self, selection: BankSelection) -> AppResult<usize> {
        self.ingest(QuestionSource::Bank(selection))
    }

    // ========== AI 出题 ==========

    /// 启动 AI 出题任务，返回时任务已进入轮询（或失败）
    ///
    /// 已有未结束的任务时返回 `JobAlreadyActive`
    pub async fn start_generation(&self, request: GenerationRequest) -> Result<(), GenerationError> {
        let (controller, previous) = {
            let mut slot = self.job.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(current) = slot.as_ref() {
                if !current.state().is_terminal() {
                    return Err(GenerationError::JobAlreadyActive);
                }
            }
            let observer = Arc::new(SessionJobObserver {
                hub: Arc::clone(&self.hub),
            });
            let controller = Arc::new(GenerationJobController::new(
                Arc::clone(&self.generation_api),
                observer,
                self.poll_settings,
                self.generation_policy,
            ));
            let previous = slot.replace(Arc::clone(&controller));
            (controller, previous)
        };
        // 旧控制器在锁外释放
        drop(previous);

        controller.request(request).await
    }

    pub fn cancel_generation(&self) {
        if let Some(controller) = self.current_job() {
            controller.cancel();
        }
    }

    pub fn job_snapshot(&self) -> Option<JobSnapshot> {
        self.current_job().map(|job| job.snapshot())
    }

    pub fn subscribe_job(&self) -> Option<watch::Receiver<JobSnapshot>> {
        self.current_job().map(|job| job.subscribe())
    }

    fn current_job(&self) -> Option<Arc<GenerationJobController>> {
        self.job.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    // ========== 提交 ==========

    /// 校验并提交草稿
    ///
    /// 成功后草稿被丢弃，会话回到新建状态；失败时草稿保持不变以便重试
    pub async fn submit(&self) -> Result<PersistedExam, SubmissionError> {
        let (draft, mode) = {
            let state = self.hub.lock();
            (state.draft.clone(), state.mode)
        };

        if let Err(err) = self.validator.validate(&draft, mode) {
            self.hub.observer.on_validation_failed(&err);
            return Err(err.into());
        }

        let result = self.coordinator.submit(&draft, mode).await;

        if result.is_ok() {
            self.cancel_generation();
            self.hub.mutate(|state| {
                state.draft = ExamDraft::new();
                state.mode = SubmitMode::Create;
            });
        }
        self.hub.observer.on_submit_result(&result);
        result
    }
}
