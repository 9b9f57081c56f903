//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 无界面运行时的"指挥中心"：读取组卷计划，驱动组卷会话，输出统计。
//!
//! ## 层次关系
//!
//! ```text
//! plan_runner (处理一份 ExamPlan)
//!     ↓
//! workflow::ExamDraftSession (草稿 + 事件回调)
//!     ↓
//! services (能力层：解析 / 选题 / 出题任务 / 合并 / 校验 / 提交)
//!     ↓
//! clients (协作方：HTTP 后端)
//! ```

pub mod plan_runner;

// 重新导出主要类型
pub use plan_runner::{App, PlanStats};
