//! AI 出题任务 - 业务能力层
//!
//! 一个控制器实例对应一次"请求 → 轮询 → 成功/超时/取消/失败"的完整任务。
//!
//! ## 状态机
//!
//! ```text
//! Idle ──request()──▶ Requested ──ok──▶ Polling ──题目非空──▶ Succeeded
//!                         │                │ ├──达到最大次数──▶ TimedOut
//!                         │                │ └──查询出错────▶ Failed
//!                         └──出错──▶ Failed └──cancel()──────▶ Cancelled
//! ```
//!
//! 定时器由 [`PollTimer`] 持有，释放即停止轮询。所有状态变更都在同一把锁内完成，
//! 轮询任务在拿到响应后先检查状态是否仍为 `Polling`，因此 `cancel()` 返回之后
//! 到达的任何响应都会被丢弃。
//!
//! 状态变更时只在锁内把事件放进 [`SerialDispatcher`]，释放锁之后再通知观察者和
//! watch 订阅者。回调里可以读取快照，也可以调用 `cancel()`。

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::clients::GenerationApi;
use crate::config::Config;
use crate::error::GenerationError;
use crate::models::{GeneratedQuestion, GenerationRequest, QuestionDraft};
use crate::services::answer_policy::{resolve_correct_index, AnswerMatchPolicy};
use crate::utils::{truncate_text, SerialDispatcher};

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Requested,
    Polling,
    Succeeded,
    TimedOut,
    Cancelled,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::TimedOut | JobState::Cancelled | JobState::Failed
        )
    }

    pub fn is_active(self) -> bool {
        matches!(self, JobState::Requested | JobState::Polling)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Idle => "空闲",
            JobState::Requested => "已请求",
            JobState::Polling => "轮询中",
            JobState::Succeeded => "已完成",
            JobState::TimedOut => "已超时",
            JobState::Cancelled => "已取消",
            JobState::Failed => "失败",
        };
        write!(f, "{}", name)
    }
}

/// 任务当前状态的快照
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub state: JobState,
    pub reference_key: Option<String>,
    pub attempt_count: u32,
    /// 进入 Failed / TimedOut 时的错误
    pub error: Option<GenerationError>,
}

/// 轮询参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// 轮询间隔下限；`Duration::ZERO` 会让定时器无法创建
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

impl PollSettings {
    /// 从配置读取；0 值按下限处理（间隔至少 1ms，至少查询 1 次）
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval().max(MIN_POLL_INTERVAL),
            max_attempts: config.max_poll_attempts.max(1),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(30_000),
            max_attempts: 20,
        }
    }
}

/// 任务事件回调
///
/// 按事件发生顺序同步调用，调用时控制器不持有内部锁
pub trait JobObserver: Send + Sync {
    fn on_state_changed(&self, _snapshot: &JobSnapshot) {}

    /// 成功时只调用一次
    fn on_questions_ready(&self, questions: Vec<QuestionDraft>);
}

/// 轮询定时器：持有轮询任务的 AbortHandle，释放即解除
struct PollTimer {
    handle: AbortHandle,
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 在锁内记录、锁外派发的任务事件
enum JobEvent {
    /// 只更新 watch 订阅者（轮询次数变化）
    Progress(JobSnapshot),
    StateChanged(JobSnapshot),
    QuestionsReady(Vec<QuestionDraft>),
}

struct JobShared {
    state: JobState,
    reference_key: Option<String>,
    attempt_count: u32,
    error: Option<GenerationError>,
    timer: Option<PollTimer>,
}

impl JobShared {
    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            state: self.state,
            reference_key: self.reference_key.clone(),
            attempt_count: self.attempt_count,
            error: self.error.clone(),
        }
    }

    /// 解除定时器，可重复调用
    fn disarm(&mut self) {
        if self.timer.take().is_some() {
            debug!("轮询定时器已解除");
        }
    }
}

struct JobCore {
    api: Arc<dyn GenerationApi>,
    observer: Arc<dyn JobObserver>,
    settings: PollSettings,
    policy: AnswerMatchPolicy,
    shared: Mutex<JobShared>,
    state_tx: watch::Sender<JobSnapshot>,
    events: SerialDispatcher<JobEvent>,
}

impl JobCore {
    fn lock(&self) -> MutexGuard<'_, JobShared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 切换状态并记录通知（调用方持有锁，释放后调用 [`JobCore::flush`]）
    fn transition(&self, shared: &mut JobShared, next: JobState) {
        debug!("出题任务状态: {} → {}", shared.state, next);
        shared.state = next;
        if next.is_terminal() {
            shared.disarm();
        }
        self.events.push(JobEvent::StateChanged(shared.snapshot()));
    }

    /// 派发已记录的事件；调用时不能持有 `shared` 锁
    fn flush(&self) {
        self.events.drain(|event| match event {
            JobEvent::Progress(snapshot) => {
                self.state_tx.send_replace(snapshot);
            }
            JobEvent::StateChanged(snapshot) => {
                self.state_tx.send_replace(snapshot.clone());
                self.observer.on_state_changed(&snapshot);
            }
            JobEvent::QuestionsReady(questions) => self.observer.on_questions_ready(questions),
        });
    }

    fn fail(&self, shared: &mut JobShared, next: JobState, err: GenerationError) {
        error!("❌ 出题任务{}: {}", next, err);
        shared.error = Some(err);
        self.transition(shared, next);
    }

    fn to_drafts(&self, items: Vec<GeneratedQuestion>) -> Vec<QuestionDraft> {
        items
            .into_iter()
            .map(|item| {
                let correct =
                    resolve_correct_index(&item.options, &item.correct_answer, self.policy).index();
                if correct.is_none() {
                    warn!(
                        "⚠️ AI 题目 '{}' 的答案 '{}' 不在选项中，保留为未设置",
                        truncate_text(&item.question, 30),
                        item.correct_answer
                    );
                }
                QuestionDraft::from_option_list(item.question, item.options, correct)
            })
            .collect()
    }
}

/// AI 出题任务控制器
///
/// 每个实例只能执行一次任务；终态之后需要新建实例。释放控制器会取消进行中的任务。
pub struct GenerationJobController {
    core: Arc<JobCore>,
}

impl GenerationJobController {
    pub fn new(
        api: Arc<dyn GenerationApi>,
        observer: Arc<dyn JobObserver>,
        settings: PollSettings,
        policy: AnswerMatchPolicy,
    ) -> Self {
        let shared = JobShared {
            state: JobState::Idle,
            reference_key: None,
            attempt_count: 0,
            error: None,
            timer: None,
        };
        let (state_tx, _) = watch::channel(shared.snapshot());

        Self {
            core: Arc::new(JobCore {
                api,
                observer,
                settings,
                policy,
                shared: Mutex::new(shared),
                state_tx,
                events: SerialDispatcher::new(),
            }),
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.core.lock().snapshot()
    }

    pub fn state(&self) -> JobState {
        self.core.lock().state
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.core.state_tx.subscribe()
    }

    /// 发起出题请求；成功后开始按固定间隔轮询
    ///
    /// 请求本身失败时任务进入 Failed 并返回错误
    pub async fn request(&self, request: GenerationRequest) -> Result<(), GenerationError> {
        let accepted = {
            let mut shared = self.core.lock();
            if shared.state != JobState::Idle {
                return Err(GenerationError::AlreadyStarted);
            }
            match invalid_request_reason(&request) {
                Some(reason) => {
                    let err = GenerationError::InvalidRequest(reason);
                    self.core.fail(&mut shared, JobState::Failed, err.clone());
                    Err(err)
                }
                None => {
                    self.core.transition(&mut shared, JobState::Requested);
                    Ok(())
                }
            }
        };
        self.core.flush();
        accepted?;

        info!(
            "🤖 请求 AI 出题 - 科目: {}, 难度: {}, 数量: {}, 语言: {}",
            request.subject, request.criticality, request.question_count, request.language
        );

        let result = self.core.api.request_question_generation(&request).await;

        let outcome = {
            let mut shared = self.core.lock();
            if shared.state != JobState::Requested {
                debug!("出题请求返回时任务已{}，丢弃结果", shared.state);
                return Ok(());
            }

            match result {
                Ok(reference_key) => {
                    info!("✓ 出题任务已受理: {}", reference_key);
                    shared.reference_key = Some(reference_key.clone());
                    shared.attempt_count = 0;
                    shared.timer = Some(self.arm(reference_key));
                    self.core.transition(&mut shared, JobState::Polling);
                    Ok(())
                }
                Err(err) => {
                    let err = GenerationError::RequestRejected(Arc::new(err));
                    self.core.fail(&mut shared, JobState::Failed, err.clone());
                    Err(err)
                }
            }
        };
        self.core.flush();
        outcome
    }

    /// 取消任务：立即解除定时器，之后到达的响应全部丢弃
    pub fn cancel(&self) {
        {
            let mut shared = self.core.lock();
            if shared.state.is_active() {
                info!("🛑 取消出题任务 {:?}", shared.reference_key);
                self.core.transition(&mut shared, JobState::Cancelled);
            } else {
                shared.disarm();
            }
        }
        self.core.flush();
    }

    /// 启动轮询任务（调用方持有锁）
    fn arm(&self, reference_key: String) -> PollTimer {
        let core = Arc::clone(&self.core);
        let task = tokio::spawn(poll_loop(core, reference_key));
        PollTimer {
            handle: task.abort_handle(),
        }
    }
}

impl Drop for GenerationJobController {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn poll_loop(core: Arc<JobCore>, reference_key: String) {
    let period = core.settings.interval.max(MIN_POLL_INTERVAL);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let attempt = {
            let mut shared = core.lock();
            if shared.state != JobState::Polling {
                return;
            }
            shared.attempt_count += 1;
            shared.attempt_count
        };

        debug!(
            "查询出题状态 {} (第 {}/{} 次)",
            reference_key, attempt, core.settings.max_attempts
        );
        let response = core.api.check_generation_status(&reference_key).await;

        let finished = {
            let mut shared = core.lock();
            if shared.state != JobState::Polling {
                debug!("任务已{}，丢弃迟到的状态响应", shared.state);
                return;
            }

            match response {
                Ok(items) if !items.is_empty() => {
                    let drafts = core.to_drafts(items);
                    info!("✓ AI 出题完成: {} 道题 (第 {} 次查询)", drafts.len(), attempt);
                    shared.disarm();
                    // 题目先于 Succeeded 送达
                    core.events.push(JobEvent::QuestionsReady(drafts));
                    core.transition(&mut shared, JobState::Succeeded);
                    true
                }
                Ok(_) if attempt >= core.settings.max_attempts => {
                    core.fail(
                        &mut shared,
                        JobState::TimedOut,
                        GenerationError::TimedOut { attempts: attempt },
                    );
                    true
                }
                Ok(_) => {
                    core.events.push(JobEvent::Progress(shared.snapshot()));
                    false
                }
                Err(err) => {
                    core.fail(
                        &mut shared,
                        JobState::Failed,
                        GenerationError::StatusCheckFailed(Arc::new(err)),
                    );
                    true
                }
            }
        };
        core.flush();
        if finished {
            return;
        }
    }
}

fn invalid_request_reason(request: &GenerationRequest) -> Option<String> {
    if request.subject.trim().is_empty() {
        Some("科目不能为空".to_string())
    } else if request.question_count == 0 {
        Some("题目数量必须大于 0".to_string())
    } else {
        None
    }
}
