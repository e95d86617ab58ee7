use serde::{Deserialize, Serialize};

/// 用户档案
///
/// 仅凭 token 恢复会话时除手机号外的字段可能为空
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserProfile {
    #[serde(default)]
    pub mobile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
}

impl UserProfile {
    /// 仅含手机号的最小档案（老用户 OTP 登录成功后）
    pub fn with_mobile(mobile: impl Into<String>) -> Self {
        Self {
            mobile: mobile.into(),
            ..Default::default()
        }
    }
}

/// 待提交的新用户档案
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub name: String,
    pub email: String,
    pub qualification: String,
    pub profile_image: Option<ProfileImage>,
}

/// 头像文件内容
#[derive(Debug, Clone)]
pub struct ProfileImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ProfileImage {
    /// 文件大小（字节）
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
