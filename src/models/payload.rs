use serde::{Deserialize, Serialize};

/// 提交给后端的题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    pub question: String,
    pub options: Vec<String>,
    /// 正确答案以选项文本提交，而不是下标
    pub correct_answer: String,
}

/// 提交给后端的考试数据（创建和更新共用，更新时带 `id`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub subject_name: String,
    pub teacher_name: String,
    pub org_code: String,
    pub batch: String,
    /// `YYYY-MM-DDTHH:mm:ss.000`
    pub start_time: String,
    pub end_time: String,
    pub duration: u32,
    pub is_active: bool,
    pub questions: Vec<QuestionPayload>,
}

/// 后端保存后的考试
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedExam {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub subject_name: String,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub org_code: String,
    #[serde(default)]
    pub batch: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub questions: Vec<PersistedQuestion>,
}

pub type PersistedQuestion = QuestionPayload;
