//! # Exam Draft Composer
//!
//! 考试组卷核心：从多种来源收集选择题，组装成考试草稿，校验后提交到后端
//!
//! ## 架构设计
//!
//! ### ① 协作方层（Clients）
//! - `clients/` - 外部协作方 trait 与 HTTP 实现
//! - `GenerationApi` / `QuestionBankApi` / `ExamStore` / `SessionContext`
//! - `HttpBackend` - 基于 reqwest 的后端客户端
//!
//! ### ② 业务能力层（Services）
//! - `SpreadsheetQuestionParser` - 表格行 → 题目（全部成功或全部失败）
//! - `QuestionBankSelector` - 题库搜索与多选
//! - `GenerationJobController` - AI 出题任务状态机（请求 → 轮询 → 终态）
//! - `QuestionListAssembler` - 与来源无关的题目合并
//! - `ExamDraftValidator` - 提交前 9 条规则校验
//! - `ExamSubmissionCoordinator` - payload 规范化与单次提交
//!
//! ### ③ 流程层（Workflow）
//! - `ExamDraftSession` - 持有草稿，串联各能力并同步回调 `DraftObserver`
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator::App` - 读取组卷计划 TOML，无界面地跑完一次组卷
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ExamStore, GenerationApi, HttpBackend, QuestionBankApi, SessionContext};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{ExamDraft, ExamDraftMetadata, QuestionDraft, SubmitMode};
pub use orchestrator::App;
pub use services::{AnswerMatchPolicy, GenerationJobController, JobState};
pub use workflow::{Collaborators, DraftObserver, ExamDraftSession};
