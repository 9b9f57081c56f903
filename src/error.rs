use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 协作方接口调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 表格导入错误（可能包含多行）
    #[error("表格导入错误: {}", ParseErrors(.0))]
    Parse(Vec<ParseError>),
    /// 提交前校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// AI 出题任务错误
    #[error("AI出题错误: {0}")]
    Generation(#[from] GenerationError),
    /// 题库选题错误
    #[error("题库选题错误: {0}")]
    Selection(#[from] SelectionError),
    /// 提交错误
    #[error("提交错误: {0}")]
    Submission(#[from] SubmissionError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

impl From<Vec<ParseError>> for AppError {
    fn from(errors: Vec<ParseError>) -> Self {
        AppError::Parse(errors)
    }
}

/// 协作方接口（HTTP 后端）错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败（未拿到响应）
    #[error("请求失败 ({endpoint}): {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务端拒绝（非 2xx）
    #[error("服务端拒绝 ({endpoint}): status={status}, message={message}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 响应 JSON 解析失败
    #[error("响应解析失败 ({endpoint}): {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn rejected(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// 是否为网络层失败（请求根本没有到达服务端或没有响应）
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Request { .. })
    }
}

/// 单行数据的问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIssue {
    EmptyPrompt,
    /// 选项序号从 1 开始，与表头 `Option N` 对应
    EmptyOption(usize),
    EmptyCorrectAnswer,
    AnswerNotInOptions(String),
    AmbiguousAnswer(String),
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssue::EmptyPrompt => write!(f, "题干为空"),
            RowIssue::EmptyOption(n) => write!(f, "选项 {} 为空", n),
            RowIssue::EmptyCorrectAnswer => write!(f, "正确答案为空"),
            RowIssue::AnswerNotInOptions(answer) => {
                write!(f, "正确答案 '{}' 与任何选项都不一致", answer)
            }
            RowIssue::AmbiguousAnswer(answer) => {
                write!(f, "正确答案 '{}' 同时匹配多个选项", answer)
            }
        }
    }
}

/// 表格解析错误（结构性错误）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("表格没有任何数据行")]
    EmptySheet,
    #[error("缺少必需的列: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("第 {row} 行: {issue}")]
    Row { row: usize, issue: RowIssue },
}

struct ParseErrors<'a>(&'a [ParseError]);

impl fmt::Display for ParseErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// 提交前校验错误，按规则顺序一次只报告一个
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("科目名称不能为空")]
    MissingSubjectName,
    #[error("教师姓名不能为空")]
    MissingTeacherName,
    #[error("班级不能为空")]
    MissingBatch,
    #[error("考试时长必须大于 0 分钟")]
    InvalidDuration,
    #[error("开始时间未设置")]
    MissingStartTime,
    #[error("结束时间未设置")]
    MissingEndTime,
    #[error("结束时间必须晚于开始时间")]
    EndNotAfterStart,
    #[error("至少需要一道完整的题目")]
    NoCompleteQuestions,
    #[error("编辑考试时缺少考试 ID")]
    MissingExamId,
}

impl ValidationError {
    /// 对应的校验规则序号（1..=9）
    pub fn rule(self) -> u8 {
        match self {
            ValidationError::MissingSubjectName => 1,
            ValidationError::MissingTeacherName => 2,
            ValidationError::MissingBatch => 3,
            ValidationError::InvalidDuration => 4,
            ValidationError::MissingStartTime => 5,
            ValidationError::MissingEndTime => 6,
            ValidationError::EndNotAfterStart => 7,
            ValidationError::NoCompleteQuestions => 8,
            ValidationError::MissingExamId => 9,
        }
    }
}

/// AI 出题任务错误
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("出题请求参数无效: {0}")]
    InvalidRequest(String),
    #[error("出题请求被拒绝: {0}")]
    RequestRejected(#[source] Arc<ApiError>),
    #[error("查询出题状态失败: {0}")]
    StatusCheckFailed(#[source] Arc<ApiError>),
    #[error("出题超时: 已轮询 {attempts} 次仍无结果")]
    TimedOut { attempts: u32 },
    #[error("任务已经启动过，请创建新的任务")]
    AlreadyStarted,
    #[error("已有进行中的出题任务")]
    JobAlreadyActive,
}

/// 题库选题错误（调用方层面的校验）
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("搜索题库必须指定科目")]
    MissingSubject,
    #[error("没有选择任何题目")]
    NothingSelected,
    #[error("题库搜索失败: {0}")]
    SearchFailed(#[source] ApiError),
}

/// 提交错误
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("已有提交正在进行中")]
    AlreadyInFlight,
    #[error("网络错误: {0}")]
    Network(#[source] ApiError),
    #[error("服务端拒绝了提交: {0}")]
    Rejected(#[source] ApiError),
    #[error("草稿未通过校验: {0}")]
    Invalid(#[from] ValidationError),
}

impl From<ApiError> for SubmissionError {
    fn from(err: ApiError) -> Self {
        if err.is_network() {
            SubmissionError::Network(err)
        } else {
            SubmissionError::Rejected(err)
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("配置文件 TOML 解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    #[error("配置项 {field} 无效: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 协作方接口结果类型
pub type ApiResult<T> = Result<T, ApiError>;
