//! 认证接口
//!
//! 封装 /auth/* 四个端点；与原服务约定一致，全部走 multipart 表单

use std::sync::Arc;

use reqwest::multipart;
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{ProfileDraft, UserProfile};

use super::client::ApiClient;

/// 发送验证码响应
#[derive(Debug, Deserialize)]
pub struct SendOtpResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// 校验验证码响应
///
/// `login` 为真表示老用户，直接携带 token；为假表示新用户，需建档
#[derive(Debug, Deserialize)]
pub struct VerifyOtpResponse {
    pub success: bool,
    #[serde(default)]
    pub login: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 建档响应
#[derive(Debug, Deserialize)]
pub struct CreateProfileResponse {
    pub success: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 登出响应
#[derive(Debug, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// 认证 API
#[derive(Clone)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// 发送验证码
    ///
    /// # 参数
    /// - `mobile`: E.164 格式手机号（带 + 前缀）
    pub async fn send_otp(&self, mobile: &str) -> AppResult<SendOtpResponse> {
        let form = multipart::Form::new().text("mobile", mobile.to_string());
        self.client.post_form("/auth/send-otp", form).await
    }

    /// 校验验证码
    pub async fn verify_otp(&self, mobile: &str, otp: &str) -> AppResult<VerifyOtpResponse> {
        let form = multipart::Form::new()
            .text("mobile", mobile.to_string())
            .text("otp", otp.to_string());
        self.client.post_form("/auth/verify-otp", form).await
    }

    /// 新用户建档（含头像上传）
    pub async fn create_profile(
        &self,
        mobile: &str,
        draft: &ProfileDraft,
    ) -> AppResult<CreateProfileResponse> {
        let mut form = multipart::Form::new()
            .text("mobile", mobile.to_string())
            .text("name", draft.name.clone())
            .text("email", draft.email.clone())
            .text("qualification", draft.qualification.clone());

        if let Some(image) = &draft.profile_image {
            let part =
                multipart::Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
            form = form.part("profile_image", part);
        }

        self.client.post_form("/auth/create-profile", form).await
    }

    /// 登出（携带 Bearer 头）
    pub async fn logout(&self) -> AppResult<LogoutResponse> {
        self.client.post_empty("/auth/logout").await
    }
}
