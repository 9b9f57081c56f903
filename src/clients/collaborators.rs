//! 外部协作方接口
//!
//! 组卷核心只依赖这些 trait，具体的 HTTP 实现见 [`super::HttpBackend`]，
//! 测试中使用内存实现替换。

use futures::future::BoxFuture;

use crate::error::ApiResult;
use crate::models::{
    BankFilter, BankQuestion, ExamPayload, GeneratedQuestion, GenerationRequest, PersistedExam,
    SubmitMode,
};

/// AI 出题服务
pub trait GenerationApi: Send + Sync {
    /// 提交出题请求，返回任务的 reference key
    fn request_question_generation<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, ApiResult<String>>;

    /// 查询出题状态；空列表表示仍在生成
    fn check_generation_status<'a>(
        &'a self,
        reference_key: &'a str,
    ) -> BoxFuture<'a, ApiResult<Vec<GeneratedQuestion>>>;
}

/// 题库搜索
pub trait QuestionBankApi: Send + Sync {
    fn search_question_bank<'a>(
        &'a self,
        filter: &'a BankFilter,
    ) -> BoxFuture<'a, ApiResult<Vec<BankQuestion>>>;
}

/// 考试保存（创建和更新共用一个接口，以 payload 中是否有 id 区分）
pub trait ExamStore: Send + Sync {
    fn persist_exam<'a>(
        &'a self,
        payload: &'a ExamPayload,
        mode: SubmitMode,
    ) -> BoxFuture<'a, ApiResult<PersistedExam>>;
}

/// 当前登录会话
pub trait SessionContext: Send + Sync {
    fn current_organization_code(&self) -> String;
}

/// 固定机构代码的会话（来自配置）
#[derive(Debug, Clone)]
pub struct StaticSession {
    org_code: String,
}

impl StaticSession {
    pub fn new(org_code: impl Into<String>) -> Self {
        Self {
            org_code: org_code.into(),
        }
    }
}

impl SessionContext for StaticSession {
    fn current_organization_code(&self) -> String {
        self.org_code.clone()
    }
}
