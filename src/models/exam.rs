use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::payload::PersistedExam;
use crate::models::question::QuestionDraft;
use crate::services::answer_policy::{resolve_correct_index, AnswerMatchPolicy, AnswerResolution};

/// 提交方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    Create,
    Update,
}

/// 考试基本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamDraftMetadata {
    pub subject_name: String,
    pub teacher_name: String,
    pub organization_code: String,
    pub batch: String,
    #[serde(deserialize_with = "deserialize_local_datetime")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(deserialize_with = "deserialize_local_datetime")]
    pub end_time: Option<NaiveDateTime>,
    pub duration_minutes: Option<u32>,
    pub is_active: bool,
}

impl Default for ExamDraftMetadata {
    fn default() -> Self {
        Self {
            subject_name: String::new(),
            teacher_name: String::new(),
            organization_code: String::new(),
            batch: String::new(),
            start_time: None,
            end_time: None,
            duration_minutes: None,
            is_active: true,
        }
    }
}

/// 正在编辑的考试草稿
///
/// 题目顺序即题号顺序。题目列表只通过 `QuestionListAssembler` 修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamDraft {
    /// 编辑已有考试时的考试 ID
    pub exam_id: Option<String>,
    pub metadata: ExamDraftMetadata,
    questions: Vec<QuestionDraft>,
}

impl ExamDraft {
    /// 新草稿：只有一道空白占位题
    pub fn new() -> Self {
        Self {
            exam_id: None,
            metadata: ExamDraftMetadata::default(),
            questions: vec![QuestionDraft::placeholder()],
        }
    }

    /// 从已保存的考试恢复草稿
    ///
    /// 正确选项按答案文本在选项中的位置重新计算，找不到时保持未设置。
    pub fn from_persisted(exam: PersistedExam) -> Self {
        let questions = exam
            .questions
            .into_iter()
            .map(|q| {
                let correct = match resolve_correct_index(
                    &q.options,
                    &q.correct_answer,
                    AnswerMatchPolicy::Lenient,
                ) {
                    AnswerResolution::Matched(i) => Some(i),
                    _ => None,
                };
                QuestionDraft::from_option_list(q.question, q.options, correct)
            })
            .collect();

        Self {
            exam_id: Some(exam.id),
            metadata: ExamDraftMetadata {
                subject_name: exam.subject_name,
                teacher_name: exam.teacher_name,
                organization_code: exam.org_code,
                batch: exam.batch,
                start_time: parse_local_datetime(&exam.start_time),
                end_time: parse_local_datetime(&exam.end_time),
                duration_minutes: exam.duration,
                is_active: exam.is_active,
            },
            questions,
        }
    }

    pub fn questions(&self) -> &[QuestionDraft] {
        &self.questions
    }

    /// 只包含完整题目的迭代器（提交时使用）
    pub fn complete_questions(&self) -> impl Iterator<Item = &QuestionDraft> {
        self.questions.iter().filter(|q| q.is_complete())
    }

    pub fn question_mut(&mut self, id: crate::models::QuestionId) -> Option<&mut QuestionDraft> {
        self.questions.iter_mut().find(|q| q.id == id)
    }

    pub(crate) fn take_questions(&mut self) -> Vec<QuestionDraft> {
        std::mem::take(&mut self.questions)
    }

    pub(crate) fn set_questions(&mut self, questions: Vec<QuestionDraft>) {
        self.questions = questions;
    }
}

impl Default for ExamDraft {
    fn default() -> Self {
        Self::new()
    }
}

const LOCAL_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// 解析 `datetime-local` 风格的本地时间（不做时区换算）
///
/// 接受 `YYYY-MM-DDTHH:mm`、`YYYY-MM-DDTHH:mm:ss`，可带小数秒和结尾的 `Z`。
pub fn parse_local_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let text = text.strip_suffix('Z').unwrap_or(text);
    if text.is_empty() {
        return None;
    }
    LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// 输出为固定格式 `YYYY-MM-DDTHH:mm:ss.000`
pub fn format_wall_clock(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%dT%H:%M:%S.000").to_string()
}

fn deserialize_local_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => parse_local_datetime(&text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("无法解析时间: {}", text))),
    }
}
