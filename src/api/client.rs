//! HTTP 客户端封装
//!
//! 所有请求经由这里发出，统一做三件事：
//! 1. 从 token 罐取 access token 注入 `Authorization: Bearer` 头
//! 2. 收到 401 时清空两个 token 并返回 SessionExpired（硬信号，不可恢复）
//! 3. 把 reqwest / 服务端错误归一化成人类可读的错误消息

use std::sync::Arc;
use std::time::Duration;

use reqwest::{multipart, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError};
use crate::store::TokenJar;

/// 考试服务 HTTP 客户端
pub struct ApiClient {
    base_url: String,
    http: Client,
    jar: Arc<TokenJar>,
}

impl ApiClient {
    pub fn new(config: &Config, jar: Arc<TokenJar>) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::other(format!("HTTP 客户端初始化失败: {}", e)))?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http,
            jar,
        })
    }

    /// GET 请求，JSON 响应
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let request = self.http.get(self.endpoint(path));
        self.execute(request, path).await
    }

    /// POST multipart 表单，JSON 响应
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> AppResult<T> {
        let request = self.http.post(self.endpoint(path)).multipart(form);
        self.execute(request, path).await
    }

    /// 空体 POST，JSON 响应
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let request = self.http.post(self.endpoint(path));
        self.execute(request, path).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        mut request: RequestBuilder,
        path: &str,
    ) -> AppResult<T> {
        if let Some(token) = self.jar.access_token().await {
            request = request.bearer_auth(token);
        }

        debug!("请求 {}", path);

        let response = request.send().await.map_err(|e| {
            warn!("网络请求失败 ({}): {}", path, e);
            AppError::from(e)
        })?;

        let status = response.status();

        // 401 是硬信号：清掉两个 token，强制重新认证
        if status == StatusCode::UNAUTHORIZED {
            warn!("收到 401，清空凭证 ({})", path);
            self.jar.clear().await;
            return Err(AppError::Auth(AuthError::SessionExpired));
        }

        let body: Value = response.json().await.map_err(AppError::from)?;

        if !status.is_success() {
            let message = extract_message(&body);
            return Err(AppError::bad_response(path, Some(status.as_u16()), message));
        }

        serde_json::from_value(body).map_err(AppError::from)
    }
}

/// 从服务端响应体中提取人类可读的错误消息
fn extract_message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}
