//! 登录流程控制器
//!
//! 线性三步推进：手机号 → 验证码 → [建档] → 已认证。
//! 建档一步只有服务端报告"新用户"时才会进入。
//!
//! 步骤是封闭枚举 + 显式迁移表，表外迁移一律拒绝；
//! 本地校验先行，校验失败绝不触网。

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::api::AuthApi;
use crate::error::{AppError, AppResult, AuthError, FieldError, ValidationError};
use crate::models::{ProfileDraft, UserProfile};
use crate::store::SessionStore;

/// 登录流程步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    MobileEntry,
    OtpEntry,
    ProfileCreation,
    Authenticated,
}

impl AuthStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStep::MobileEntry => "MobileEntry",
            AuthStep::OtpEntry => "OtpEntry",
            AuthStep::ProfileCreation => "ProfileCreation",
            AuthStep::Authenticated => "Authenticated",
        }
    }

    /// 迁移表：只有表内的迁移是合法的
    pub fn can_transition(self, next: AuthStep) -> bool {
        use AuthStep::*;
        matches!(
            (self, next),
            (MobileEntry, OtpEntry)
                | (OtpEntry, ProfileCreation)
                | (OtpEntry, Authenticated)
                | (ProfileCreation, Authenticated)
        )
    }
}

/// 登录流程控制器
pub struct AuthFlow {
    api: AuthApi,
    store: Arc<SessionStore>,
    step: AuthStep,
    /// 已通过校验并发送过验证码的手机号（E.164）
    mobile: Option<String>,
    /// 头像文件大小上限（字节）
    image_max_bytes: u64,
}

impl AuthFlow {
    pub fn new(api: AuthApi, store: Arc<SessionStore>, image_max_bytes: u64) -> Self {
        Self {
            api,
            store,
            step: AuthStep::MobileEntry,
            mobile: None,
            image_max_bytes,
        }
    }

    pub fn step(&self) -> AuthStep {
        self.step
    }

    /// 请求发送验证码
    ///
    /// 从 MobileEntry 进入 OtpEntry；在 OtpEntry 上重复调用即"重发"，
    /// 步骤不变
    pub async fn request_otp(&mut self, country_code: &str, local_number: &str) -> AppResult<()> {
        if !matches!(self.step, AuthStep::MobileEntry | AuthStep::OtpEntry) {
            return Err(self.transition_error(AuthStep::OtpEntry));
        }

        validate_mobile(country_code, local_number)?;
        let mobile = normalize_mobile(country_code, local_number);

        let response = self.api.send_otp(&mobile).await?;
        if !response.success {
            return Err(AppError::rejected(
                response
                    .message
                    .unwrap_or_else(|| "验证码发送失败".to_string()),
            ));
        }

        info!("✓ 验证码已发送至 {}", mobile);
        self.mobile = Some(mobile);
        if self.step == AuthStep::MobileEntry {
            self.advance(AuthStep::OtpEntry)?;
        }
        Ok(())
    }

    /// 校验验证码
    ///
    /// 老用户直达 Authenticated；新用户进入 ProfileCreation。
    /// 返回进入的步骤
    pub async fn verify_otp(&mut self, code: &str) -> AppResult<AuthStep> {
        if self.step != AuthStep::OtpEntry {
            return Err(self.transition_error(AuthStep::Authenticated));
        }

        validate_otp(code)?;

        let mobile = self
            .mobile
            .clone()
            .ok_or_else(|| AppError::other("手机号缺失，请重新开始登录"))?;

        let response = self.api.verify_otp(&mobile, code).await?;
        if !response.success {
            return Err(AppError::rejected(
                response.message.unwrap_or_else(|| "验证码错误".to_string()),
            ));
        }

        if response.login {
            let access_token = response.access_token.ok_or_else(|| {
                AppError::bad_response(
                    "/auth/verify-otp",
                    None,
                    Some("响应缺少 access_token".to_string()),
                )
            })?;
            self.store
                .set_credentials(
                    UserProfile::with_mobile(&mobile),
                    access_token,
                    response.refresh_token,
                )
                .await;
            self.advance(AuthStep::Authenticated)?;
            info!("✓ 登录成功");
        } else {
            self.advance(AuthStep::ProfileCreation)?;
            info!("新用户，进入建档");
        }

        Ok(self.step)
    }

    /// 新用户建档
    pub async fn create_profile(&mut self, draft: &ProfileDraft) -> AppResult<()> {
        if self.step != AuthStep::ProfileCreation {
            return Err(self.transition_error(AuthStep::Authenticated));
        }

        validate_profile(draft, self.image_max_bytes)?;

        let mobile = self
            .mobile
            .clone()
            .ok_or_else(|| AppError::other("手机号缺失，请重新开始登录"))?;

        let response = self.api.create_profile(&mobile, draft).await?;
        if !response.success {
            return Err(AppError::rejected(
                response.message.unwrap_or_else(|| "建档失败".to_string()),
            ));
        }

        let access_token = response.access_token.ok_or_else(|| {
            AppError::bad_response(
                "/auth/create-profile",
                None,
                Some("响应缺少 access_token".to_string()),
            )
        })?;
        let user = response
            .user
            .unwrap_or_else(|| UserProfile::with_mobile(&mobile));

        self.store
            .set_credentials(user, access_token, response.refresh_token)
            .await;
        self.advance(AuthStep::Authenticated)?;
        info!("✓ 档案创建成功");
        Ok(())
    }

    /// 退出登录
    ///
    /// 远端调用失败不阻断本地清理
    pub async fn logout(&mut self) -> AppResult<()> {
        if let Err(e) = self.api.logout().await {
            warn!("登出接口调用失败: {}", e);
        }
        self.store.clear_auth().await;
        self.step = AuthStep::MobileEntry;
        self.mobile = None;
        Ok(())
    }

    fn advance(&mut self, next: AuthStep) -> AppResult<()> {
        if !self.step.can_transition(next) {
            return Err(self.transition_error(next));
        }
        self.step = next;
        Ok(())
    }

    fn transition_error(&self, to: AuthStep) -> AppError {
        AppError::Auth(AuthError::InvalidTransition {
            from: self.step.as_str(),
            to: to.as_str(),
        })
    }
}

// ========== 本地校验（不触网） ==========

fn otp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{4,6}$").unwrap())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap())
}

fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 手机号规范化为 E.164（+<区号><本地号>）
pub fn normalize_mobile(country_code: &str, local_number: &str) -> String {
    format!(
        "+{}{}",
        digits_only(country_code),
        digits_only(local_number)
    )
}

/// 校验手机号：去掉区号后本地号码至少 10 位数字
pub fn validate_mobile(country_code: &str, local_number: &str) -> AppResult<()> {
    let mut fields = Vec::new();

    if digits_only(country_code).is_empty() {
        fields.push(FieldError::new("country_code", "国家区号不能为空"));
    }

    let digits = digits_only(local_number);
    if digits.is_empty() {
        fields.push(FieldError::new("mobile", "手机号不能为空"));
    } else if digits.len() < 10 {
        fields.push(FieldError::new("mobile", "手机号格式不正确"));
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(ValidationError { fields }))
    }
}

/// 校验验证码：4-6 位数字
pub fn validate_otp(code: &str) -> AppResult<()> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::invalid_field("otp", "验证码不能为空"));
    }
    if !otp_regex().is_match(code) {
        return Err(AppError::invalid_field("otp", "验证码格式不正确"));
    }
    Ok(())
}

/// 校验建档表单
///
/// 所有字段错误一次性收集，不在第一个错误处止步
pub fn validate_profile(draft: &ProfileDraft, image_max_bytes: u64) -> AppResult<()> {
    let mut fields = Vec::new();

    if draft.name.trim().is_empty() {
        fields.push(FieldError::new("name", "姓名不能为空"));
    }

    if draft.email.trim().is_empty() {
        fields.push(FieldError::new("email", "邮箱不能为空"));
    } else if !email_regex().is_match(draft.email.trim()) {
        fields.push(FieldError::new("email", "邮箱格式不正确"));
    }

    if draft.qualification.trim().is_empty() {
        fields.push(FieldError::new("qualification", "学历不能为空"));
    }

    match &draft.profile_image {
        None => fields.push(FieldError::new("profile_image", "请上传头像")),
        Some(image) if image.size() > image_max_bytes => {
            fields.push(FieldError::new(
                "profile_image",
                format!("头像不能超过 {}MB", image_max_bytes / (1024 * 1024)),
            ));
        }
        Some(_) => {}
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(ValidationError { fields }))
    }
}
