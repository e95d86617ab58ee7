//! 状态层（Session Store）
//!
//! ## 职责
//!
//! 会话期内的全部客户端状态，分两个分区：
//!
//! - **认证分区**：用户档案 + token 罐（[`TokenJar`]），`is_authenticated`
//!   为派生值，仅当罐内持有未过期的 access token 时为真
//! - **考试分区**：[`crate::workflow::ExamSession`] 状态机本体，
//!   由编排层持有在 `Mutex` 之后
//!
//! 另持有全局忙碌信号（[`BusySignal`]）：引用计数 + watch 订阅，
//! 取代自由浮动的模块级计数器。
//!
//! 所有变更都发生在单个事件处理上下文中，分区之间互不交叉写入。

pub mod busy;
pub mod token_jar;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::models::UserProfile;

pub use busy::{BusyGuard, BusySignal};
pub use token_jar::TokenJar;

/// 认证分区状态
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub user: Option<UserProfile>,
}

/// 会话存储
pub struct SessionStore {
    auth: Mutex<AuthState>,
    jar: Arc<TokenJar>,
    busy: Arc<BusySignal>,
}

impl SessionStore {
    pub fn new(config: &Config) -> Self {
        Self {
            auth: Mutex::new(AuthState::default()),
            jar: Arc::new(TokenJar::new(
                config.access_token_ttl_days,
                config.refresh_token_ttl_days,
            )),
            busy: Arc::new(BusySignal::new()),
        }
    }

    /// 登录成功：写入用户档案并持久化两个 token
    pub async fn set_credentials(
        &self,
        user: UserProfile,
        access_token: String,
        refresh_token: Option<String>,
    ) {
        self.jar.set_tokens(access_token, refresh_token).await;
        let mut auth = self.auth.lock().await;
        auth.user = Some(user);
    }

    /// 退出登录 / 会话过期：清空认证分区
    pub async fn clear_auth(&self) {
        self.jar.clear().await;
        let mut auth = self.auth.lock().await;
        auth.user = None;
    }

    /// 是否已认证（派生值：罐内持有未过期 access token）
    pub async fn is_authenticated(&self) -> bool {
        self.jar.access_token().await.is_some()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.auth.lock().await.user.clone()
    }

    /// token 罐的共享引用（HTTP 客户端注入 Bearer 头时使用）
    pub fn token_jar(&self) -> Arc<TokenJar> {
        Arc::clone(&self.jar)
    }

    pub fn busy(&self) -> Arc<BusySignal> {
        Arc::clone(&self.busy)
    }
}
