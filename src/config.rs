use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::services::scoring::ScoringPolicy;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 考试服务 API 根地址
    pub api_base_url: String,
    /// HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// access token 有效期（天）
    pub access_token_ttl_days: i64,
    /// refresh token 有效期（天）
    pub refresh_token_ttl_days: i64,
    /// 判分策略（server = 服务端权威 / local = 本地重算）
    pub scoring_policy: ScoringPolicy,
    /// 默认国家区号（不带 + 号）
    pub default_country_code: String,
    /// 头像文件大小上限（字节）
    pub profile_image_max_bytes: u64,
    /// 接口未下发总时长时的兜底值（秒）
    pub fallback_total_time_secs: u32,
    /// 题目加载失败后退回须知页前的停留时长（毫秒）
    pub redirect_delay_millis: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://nexlearn.noviindusdemosites.in".to_string(),
            request_timeout_secs: 30,
            access_token_ttl_days: 1,
            refresh_token_ttl_days: 7,
            scoring_policy: ScoringPolicy::ServerAuthoritative,
            default_country_code: "91".to_string(),
            profile_image_max_bytes: 5 * 1024 * 1024,
            fallback_total_time_secs: 5400,
            redirect_delay_millis: 2000,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("MCQ_API_BASE_URL").unwrap_or(default.api_base_url),
            request_timeout_secs: std::env::var("MCQ_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            access_token_ttl_days: std::env::var("MCQ_ACCESS_TOKEN_TTL_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.access_token_ttl_days),
            refresh_token_ttl_days: std::env::var("MCQ_REFRESH_TOKEN_TTL_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.refresh_token_ttl_days),
            scoring_policy: std::env::var("MCQ_SCORING_POLICY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.scoring_policy),
            default_country_code: std::env::var("MCQ_DEFAULT_COUNTRY_CODE").unwrap_or(default.default_country_code),
            profile_image_max_bytes: std::env::var("MCQ_PROFILE_IMAGE_MAX_BYTES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.profile_image_max_bytes),
            fallback_total_time_secs: std::env::var("MCQ_FALLBACK_TOTAL_TIME_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.fallback_total_time_secs),
            redirect_delay_millis: std::env::var("MCQ_REDIRECT_DELAY_MILLIS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.redirect_delay_millis),
            verbose_logging: std::env::var("MCQ_VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 配置文件加载，缺失的字段回退到默认值
    pub async fn from_toml_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;

        let file: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;

        let default = Self::default();
        let scoring_policy = match file.scoring_policy {
            Some(raw) => raw
                .parse::<ScoringPolicy>()
                .map_err(|e| anyhow::anyhow!("配置文件判分策略不合法 ({}): {}", path.display(), e))?,
            None => default.scoring_policy,
        };

        Ok(Self {
            api_base_url: file.api_base_url.unwrap_or(default.api_base_url),
            request_timeout_secs: file.request_timeout_secs.unwrap_or(default.request_timeout_secs),
            access_token_ttl_days: file.access_token_ttl_days.unwrap_or(default.access_token_ttl_days),
            refresh_token_ttl_days: file.refresh_token_ttl_days.unwrap_or(default.refresh_token_ttl_days),
            scoring_policy,
            default_country_code: file.default_country_code.unwrap_or(default.default_country_code),
            profile_image_max_bytes: file.profile_image_max_bytes.unwrap_or(default.profile_image_max_bytes),
            fallback_total_time_secs: file.fallback_total_time_secs.unwrap_or(default.fallback_total_time_secs),
            redirect_delay_millis: file.redirect_delay_millis.unwrap_or(default.redirect_delay_millis),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
        })
    }
}

/// TOML 配置文件结构（全部可选）
#[derive(Debug, Deserialize)]
struct ConfigFile {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    access_token_ttl_days: Option<i64>,
    refresh_token_ttl_days: Option<i64>,
    scoring_policy: Option<String>,
    default_country_code: Option<String>,
    profile_image_max_bytes: Option<u64>,
    fallback_total_time_secs: Option<u32>,
    redirect_delay_millis: Option<u64>,
    verbose_logging: Option<bool>,
}
