/// 考试后端 API 客户端
///
/// 封装所有与后端 HTTP 接口相关的调用逻辑，实现全部协作方 trait
use crate::clients::collaborators::{ExamStore, GenerationApi, QuestionBankApi};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    BankFilter, BankQuestion, ExamPayload, GeneratedQuestion, GenerationRequest, PersistedExam,
    SubmitMode,
};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// 后端 HTTP 客户端
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationTicket {
    #[serde(alias = "reference_key", alias = "refKey")]
    reference_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerationStatus {
    #[serde(default)]
    questions: Option<Vec<GeneratedQuestion>>,
}

impl HttpBackend {
    /// 创建新的后端客户端
    pub fn new(config: &Config) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| ApiError::Request {
                endpoint: config.backend_base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.backend_base_url.trim_end_matches('/').to_string(),
            token: config.auth_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// 发送请求并返回响应体；非 2xx 转成 `ApiError::Rejected`
    async fn send(&self, endpoint: &str, builder: RequestBuilder) -> ApiResult<String> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ApiError::Request {
            endpoint: endpoint.to_string(),
            source,
        })?;

        debug!("{} 响应 status={} 长度={}", endpoint, status, body.len());

        if !status.is_success() {
            let message = extract_error_message(&body);
            warn!("{} 请求被拒绝 (status {}): {}", endpoint, status, message);
            return Err(ApiError::rejected(endpoint, status.as_u16(), message));
        }

        Ok(body)
    }

    /// 发送请求并解析 JSON
    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        let body = self.send(endpoint, builder).await?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// 解析出题状态响应体
///
/// 空响应体（如 204）、`null` 和 `questions: null` 都表示仍在生成，返回空列表
fn parse_status_body(body: &str) -> Result<Vec<GeneratedQuestion>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let status: Option<GenerationStatus> = serde_json::from_str(body)?;
    Ok(status.and_then(|s| s.questions).unwrap_or_default())
}



impl GenerationApi for HttpBackend {
    fn request_question_generation<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> BoxFuture<'a, ApiResult<String>> {
        async move {
            let endpoint = self.url("api/ai/questions/generate");
            let ticket: GenerationTicket = self
                .send_json(&endpoint, self.client.post(&endpoint).json(request))
                .await?;
            Ok(ticket.reference_key)
        }
        .boxed()
    }

    fn check_generation_status<'a>(
        &'a self,
        reference_key: &'a str,
    ) -> BoxFuture<'a, ApiResult<Vec<GeneratedQuestion>>> {
        async move {
            let endpoint = self.url(&format!("api/ai/questions/status/{}", reference_key));
            let body = self.send(&endpoint, self.client.get(&endpoint)).await?;
            parse_status_body(&body).map_err(|source| ApiError::Decode { endpoint, source })
        }
        .boxed()
    }
}

impl QuestionBankApi for HttpBackend {
    fn search_question_bank<'a>(
        &'a self,
        filter: &'a BankFilter,
    ) -> BoxFuture<'a, ApiResult<Vec<BankQuestion>>> {
        async move {
            let endpoint = self.url("api/question-bank/search");
            let mut query = vec![("subject", filter.subject.as_str())];
            if let Some(criticality) = filter.criticality.as_deref() {
                query.push(("criticality", criticality));
            }
            if let Some(language) = filter.language.as_deref() {
                query.push(("language", language));
            }
            self.send_json(&endpoint, self.client.get(&endpoint).query(&query))
                .await
        }
        .boxed()
    }
}

impl ExamStore for HttpBackend {
    fn persist_exam<'a>(
        &'a self,
        payload: &'a ExamPayload,
        mode: SubmitMode,
    ) -> BoxFuture<'a, ApiResult<PersistedExam>> {
        async move {
            let endpoint = self.url("api/exams");
            debug!("保存考试 ({:?}) 题目数: {}", mode, payload.questions.len());
            self.send_json(&endpoint, self.client.post(&endpoint).json(payload))
                .await
        }
        .boxed()
    }
}

/// 从错误响应体中提取可读的错误信息
fn extract_error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["message", "error", "detail"]
                .iter()
                .find_map(|key| v.get(key).and_then(Value::as_str))
        })
        .map(ToString::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(
            extract_error_message(r#"{"message":"duration must be positive"}"#),
            "duration must be positive"
        );
        assert_eq!(extract_error_message(" upstream down "), "upstream down");
    }

    #[test]
    fn status_body_with_null_questions_is_still_working() {
        assert!(parse_status_body(r#"{"questions":null}"#).unwrap().is_empty());
        assert!(parse_status_body("null").unwrap().is_empty());
    }

    #[test]
    fn empty_status_body_is_still_working() {
        assert!(parse_status_body("").unwrap().is_empty());
        assert!(parse_status_body(" \n").unwrap().is_empty());
    }

    #[test]
    fn status_body_with_questions_is_decoded() {
        let items = parse_status_body(
            r#"{"questions":[{"question":"1+1?","options":["1","2","3","4"],"correctAnswer":"2"}]}"#,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].correct_answer, "2");
        assert!(parse_status_body("<html>").is_err());
    }

    #[test]
    fn url_joins_without_double_slash() {
        let config = Config {
            backend_base_url: "http://exam.local/".into(),
            ..Config::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.url("/api/exams"), "http://exam.local/api/exams");
    }
}
