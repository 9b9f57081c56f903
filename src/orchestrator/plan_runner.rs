//! 组卷计划执行器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建 HTTP 后端和会话上下文
//! 2. **加载计划**：读取组卷计划 TOML
//! 3. **逐个导入来源**：手工题、表格、题库、AI 出题；单个来源失败只记录并跳过
//! 4. **提交**：等待 AI 任务结束后校验并提交
//! 5. **统计**：输出本次运行的汇总

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::clients::{HttpBackend, StaticSession};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::loaders::PlanBankSelection;
use crate::models::{load_exam_plan, load_spreadsheet_rows, ExamPlan, GenerationRequest};
use crate::services::{JobState, QuestionSource};
use crate::utils::logging::{log_startup, print_final_stats};
use crate::workflow::{Collaborators, ExamDraftSession, TracingObserver};

/// 一次运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// 成功导入的来源数
    pub imported: usize,
    /// 失败跳过的来源数
    pub skipped: usize,
    /// 提交时的完整题目数
    pub complete_questions: usize,
    /// 保存后的考试 ID
    pub exam_id: Option<String>,
}

/// 应用主结构
pub struct App {
    config: Config,
    collaborators: Collaborators,
}

impl App {
    /// 初始化应用：所有协作方都由同一个 HTTP 后端提供
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let backend = Arc::new(HttpBackend::new(&config)?);
        let collaborators = Collaborators {
            generation: backend.clone(),
            bank: backend.clone(),
            store: backend,
            session: Arc::new(StaticSession::new(config.org_code.clone())),
        };

        Ok(Self::with_collaborators(config, collaborators))
    }

    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<PlanStats> {
        info!("\n📁 正在加载组卷计划: {}", self.config.plan_file);
        let plan = load_exam_plan(Path::new(&self.config.plan_file)).await?;
        let stats = self.run_plan(plan).await;

        print_final_stats(
            stats.imported,
            stats.skipped,
            stats.complete_questions,
            stats.exam_id.as_deref(),
        );
        Ok(stats)
    }

    /// 按计划组卷并提交
    pub async fn run_plan(&self, plan: ExamPlan) -> PlanStats {
        let session = ExamDraftSession::new(
            self.collaborators.clone(),
            &self.config,
            Arc::new(TracingObserver),
        );
        let mut stats = PlanStats::default();

        let metadata = plan.metadata.clone();
        session.update_metadata(|m| *m = metadata);

        if !plan.questions.is_empty() {
            let manual = plan.questions.iter().map(|q| q.to_draft()).collect();
            record(&mut stats, "手工录入", session.ingest(QuestionSource::Manual(manual)));
        }

        if let Some(path) = plan.spreadsheet_path() {
            match load_spreadsheet_rows(&path).await {
                Ok(rows) => record(&mut stats, "表格导入", session.import_spreadsheet(rows)),
                Err(e) => {
                    warn!("⚠️ 表格导入跳过: {:#}", e);
                    stats.skipped += 1;
                }
            }
        }

        if let Some(bank) = &plan.bank {
            let result = import_bank(&session, bank).await;
            record(&mut stats, "题库选题", result);
        }

        if let Some(request) = plan.generation.clone() {
            if run_generation(&session, request).await {
                stats.imported += 1;
            } else {
                stats.skipped += 1;
            }
        }

        stats.complete_questions = session.draft().complete_questions().count();
        match session.submit().await {
            Ok(exam) => stats.exam_id = Some(exam.id),
            Err(e) => error!("❌ 考试未保存: {}", e),
        }

        stats
    }
}

fn record(stats: &mut PlanStats, source: &str, result: AppResult<usize>) {
    match result {
        Ok(count) => {
            info!("✓ {}: 并入 {} 道题", source, count);
            stats.imported += 1;
        }
        Err(e) => {
            warn!("⚠️ {}跳过: {}", source, e);
            stats.skipped += 1;
        }
    }
}

async fn import_bank(session: &ExamDraftSession, plan: &PlanBankSelection) -> AppResult<usize> {
    let mut selection = session.search_bank(&plan.filter).await?;

    if plan.select_all {
        selection.select_all();
    } else {
        for id in &plan.select {
            if !selection.select(id) {
                warn!("⚠️ 题库结果中没有题目 {}", id);
            }
        }
    }

    session.import_bank_selection(selection)
}

/// 启动 AI 出题并等待任务结束，返回是否成功
async fn run_generation(session: &ExamDraftSession, request: GenerationRequest) -> bool {
    if let Err(e) = session.start_generation(request).await {
        warn!("⚠️ AI 出题跳过: {}", e);
        return false;
    }

    let Some(mut rx) = session.subscribe_job() else {
        return false;
    };
    let state = match rx.wait_for(|s| s.state.is_terminal()).await {
        Ok(snapshot) => snapshot.state,
        Err(_) => JobState::Cancelled,
    };

    if state == JobState::Succeeded {
        true
    } else {
        warn!("⚠️ AI 出题未完成: {}", state);
        false
    }
}
