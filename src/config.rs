use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::services::answer_policy::AnswerMatchPolicy;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 后端配置 ---
    pub backend_base_url: String,
    pub auth_token: Option<String>,
    /// 当前会话的机构代码（提交时写入 orgCode）
    pub org_code: String,
    /// 单次 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    // --- AI 出题轮询 ---
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    // --- 正确答案匹配策略 ---
    pub spreadsheet_answer_policy: AnswerMatchPolicy,
    pub bank_answer_policy: AnswerMatchPolicy,
    pub generation_answer_policy: AnswerMatchPolicy,
    // --- 运行 ---
    /// 试卷计划 TOML 文件
    pub plan_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_base_url: "http://localhost:8080".to_string(),
            auth_token: None,
            org_code: String::new(),
            request_timeout_secs: 30,
            poll_interval_ms: 30_000,
            max_poll_attempts: 20,
            spreadsheet_answer_policy: AnswerMatchPolicy::Strict,
            bank_answer_policy: AnswerMatchPolicy::Lenient,
            generation_answer_policy: AnswerMatchPolicy::Lenient,
            plan_file: "exam_plan.toml".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载，未设置的字段使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        let config = Self {
            backend_base_url: std::env::var("EXAM_BACKEND_URL").unwrap_or(default.backend_base_url),
            auth_token: std::env::var("EXAM_AUTH_TOKEN").ok().or(default.auth_token),
            org_code: std::env::var("EXAM_ORG_CODE").unwrap_or(default.org_code),
            request_timeout_secs: env_or("HTTP_TIMEOUT_SECS", default.request_timeout_secs)?,
            poll_interval_ms: env_or("AI_POLL_INTERVAL_MS", default.poll_interval_ms)?,
            max_poll_attempts: env_or("AI_MAX_POLL_ATTEMPTS", default.max_poll_attempts)?,
            spreadsheet_answer_policy: env_or("SPREADSHEET_ANSWER_POLICY", default.spreadsheet_answer_policy)?,
            bank_answer_policy: env_or("BANK_ANSWER_POLICY", default.bank_answer_policy)?,
            generation_answer_policy: env_or("GENERATION_ANSWER_POLICY", default.generation_answer_policy)?,
            plan_file: std::env::var("EXAM_PLAN_FILE").unwrap_or(default.plan_file),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载，文件中缺省的字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 检查轮询参数：间隔与最大次数都必须大于 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                reason: "轮询间隔必须大于 0".to_string(),
            });
        }
        if self.max_poll_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_poll_attempts",
                reason: "最大轮询次数必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_or<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_polling_contract() {
        let config = Config::default();
        assert_eq!(config.max_poll_attempts, 20);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.spreadsheet_answer_policy, AnswerMatchPolicy::Strict);
        assert_eq!(config.bank_answer_policy, AnswerMatchPolicy::Lenient);
    }

    #[test]
    fn toml_overrides_only_given_fields() {
        let config: Config = toml::from_str(
            r#"
            backend_base_url = "https://exam.example.org"
            max_poll_attempts = 5
            bank_answer_policy = "strict"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend_base_url, "https://exam.example.org");
        assert_eq!(config.max_poll_attempts, 5);
        assert_eq!(config.bank_answer_policy, AnswerMatchPolicy::Strict);
        assert_eq!(config.poll_interval_ms, 30_000);
    }

    #[test]
    fn zero_polling_values_are_rejected() {
        assert!(Config::default().validate().is_ok());

        let config = Config {
            poll_interval_ms: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "poll_interval_ms", .. })
        ));

        let config = Config {
            max_poll_attempts: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "max_poll_attempts", .. })
        ));
    }

    #[test]
    fn zero_interval_in_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("exam-config-{}.toml", std::process::id()));
        std::fs::write(&path, "poll_interval_ms = 0\n").unwrap();
        let result = Config::from_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn unparsable_env_value_is_reported() {
        // 本测试专用的变量名
        std::env::set_var("EXAM_TEST_POLL_ATTEMPTS", "abc");
        let result = env_or("EXAM_TEST_POLL_ATTEMPTS", 20u32);
        std::env::remove_var("EXAM_TEST_POLL_ATTEMPTS");

        match result {
            Err(ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            }) => {
                assert_eq!(var_name, "EXAM_TEST_POLL_ATTEMPTS");
                assert_eq!(value, "abc");
                assert_eq!(expected_type, "u32");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(env_or("EXAM_TEST_UNSET_VAR", 7u32).unwrap(), 7);
    }
}
