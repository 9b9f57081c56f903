use crate::models::bank::BankFilter;
use crate::models::exam::ExamDraftMetadata;
use crate::models::generation::GenerationRequest;
use crate::models::question::QuestionDraft;
use crate::models::spreadsheet::SpreadsheetRow;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 试卷计划：一次无界面运行要组装并提交的考试
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExamPlan {
    pub metadata: ExamDraftMetadata,
    /// 手工录入的题目
    pub questions: Vec<PlanQuestion>,
    /// 表格导出的 JSON 文件（对象数组），相对路径按计划文件所在目录解析
    pub spreadsheet: Option<PathBuf>,
    pub bank: Option<PlanBankSelection>,
    pub generation: Option<GenerationRequest>,
    #[serde(skip)]
    pub file_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// 0..=3
    pub correct_option: Option<usize>,
}

impl PlanQuestion {
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft::from_option_list(self.prompt.clone(), self.options.clone(), self.correct_option)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanBankSelection {
    #[serde(flatten)]
    pub filter: BankFilter,
    /// 要选择的题库题目 ID
    pub select: Vec<String>,
    pub select_all: bool,
}

impl ExamPlan {
    /// 表格文件的实际路径
    pub fn spreadsheet_path(&self) -> Option<PathBuf> {
        let path = self.spreadsheet.as_ref()?;
        if path.is_absolute() {
            return Some(path.clone());
        }
        let base = self
            .file_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new("."));
        Some(base.join(path))
    }
}

/// 从 TOML 文件加载试卷计划
pub async fn load_exam_plan(toml_file_path: &Path) -> Result<ExamPlan> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let mut plan: ExamPlan = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    plan.file_path = Some(toml_file_path.to_path_buf());

    Ok(plan)
}

/// 加载表格导出的 JSON（对象数组）
pub async fn load_spreadsheet_rows(json_file_path: &Path) -> Result<Vec<SpreadsheetRow>> {
    let content = fs::read_to_string(json_file_path)
        .await
        .with_context(|| format!("无法读取表格文件: {}", json_file_path.display()))?;

    let value: JsonValue = serde_json::from_str(&content)
        .with_context(|| format!("无法解析表格文件: {}", json_file_path.display()))?;

    let entries = value
        .as_array()
        .with_context(|| format!("表格文件必须是对象数组: {}", json_file_path.display()))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            SpreadsheetRow::from_json(entry)
                .with_context(|| format!("表格文件第 {} 项不是对象", i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_parses_all_sections() {
        let plan: ExamPlan = toml::from_str(
            r#"
            spreadsheet = "rows.json"

            [metadata]
            subject_name = "Math"
            teacher_name = "R. Lee"
            batch = "B1"
            start_time = "2025-03-01T09:00"
            end_time = "2025-03-01T10:00"
            duration_minutes = 60

            [[questions]]
            prompt = "2+2?"
            options = ["3", "4", "5", "6"]
            correct_option = 1

            [bank]
            subject = "Math"
            criticality = "high"
            select = ["q1", "q2"]

            [generation]
            subject = "Math"
            criticality = "medium"
            questionCount = 5
            language = "English"
            "#,
        )
        .unwrap();

        assert_eq!(plan.metadata.duration_minutes, Some(60));
        assert!(plan.metadata.start_time.is_some());
        assert!(plan.questions[0].to_draft().is_complete());
        let bank = plan.bank.unwrap();
        assert_eq!(bank.filter.criticality.as_deref(), Some("high"));
        assert_eq!(bank.select, vec!["q1", "q2"]);
        assert_eq!(plan.generation.unwrap().question_count, 5);
        assert_eq!(plan.spreadsheet, Some(PathBuf::from("rows.json")));
    }

    #[test]
    fn spreadsheet_path_is_relative_to_plan() {
        let plan = ExamPlan {
            spreadsheet: Some(PathBuf::from("rows.json")),
            file_path: Some(PathBuf::from("/plans/exam.toml")),
            ..Default::default()
        };
        assert_eq!(plan.spreadsheet_path(), Some(PathBuf::from("/plans/rows.json")));
    }

    #[tokio::test]
    async fn loads_rows_from_json_file() {
        let path = std::env::temp_dir().join(format!("rows-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"[{"Question":"2+2?","Option 1":"3","Option 2":4,"Option 3":"5","Option 4":"6","Correct Answer":4}]"#,
        )
        .unwrap();

        let rows = load_spreadsheet_rows(&path).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].cells().any(|(k, v)| k == "Correct Answer" && v == "4"));

        std::fs::remove_file(&path).unwrap();
    }
}
