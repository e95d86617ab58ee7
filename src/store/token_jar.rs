//! token 罐
//!
//! cookie 存储的进程内等价物：只保存 access / refresh 两个短期凭证，
//! 各自带过期时间，读取时检查过期。考试进度不在此持久化。

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

/// 带过期时间的单个凭证
#[derive(Debug, Clone)]
struct StoredToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn new(value: String, ttl_days: i64) -> Self {
        Self {
            value,
            expires_at: Utc::now() + Duration::days(ttl_days),
        }
    }

    fn live(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

#[derive(Debug, Default)]
struct TokenPair {
    access: Option<StoredToken>,
    refresh: Option<StoredToken>,
}

/// token 罐
#[derive(Debug)]
pub struct TokenJar {
    pair: Mutex<TokenPair>,
    access_ttl_days: i64,
    refresh_ttl_days: i64,
}

impl TokenJar {
    pub fn new(access_ttl_days: i64, refresh_ttl_days: i64) -> Self {
        Self {
            pair: Mutex::new(TokenPair::default()),
            access_ttl_days,
            refresh_ttl_days,
        }
    }

    /// 写入两个 token，各自按配置的有效期计算过期时间
    pub async fn set_tokens(&self, access_token: String, refresh_token: Option<String>) {
        let mut pair = self.pair.lock().await;
        pair.access = Some(StoredToken::new(access_token, self.access_ttl_days));
        pair.refresh = refresh_token.map(|t| StoredToken::new(t, self.refresh_ttl_days));
    }

    /// 读取未过期的 access token；已过期的顺手清掉
    pub async fn access_token(&self) -> Option<String> {
        let mut pair = self.pair.lock().await;
        match &pair.access {
            Some(token) if token.live() => Some(token.value.clone()),
            Some(_) => {
                pair.access = None;
                None
            }
            None => None,
        }
    }

    pub async fn refresh_token(&self) -> Option<String> {
        let mut pair = self.pair.lock().await;
        match &pair.refresh {
            Some(token) if token.live() => Some(token.value.clone()),
            Some(_) => {
                pair.refresh = None;
                None
            }
            None => None,
        }
    }

    /// 清空两个 token（退出登录或收到 401 时调用）
    pub async fn clear(&self) {
        let mut pair = self.pair.lock().await;
        pair.access = None;
        pair.refresh = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_live_tokens_readable() {
        let jar = TokenJar::new(1, 7);
        jar.set_tokens("acc".into(), Some("ref".into())).await;

        assert_eq!(jar.access_token().await.as_deref(), Some("acc"));
        assert_eq!(jar.refresh_token().await.as_deref(), Some("ref"));
    }

    #[tokio::test]
    async fn test_expired_token_treated_as_absent() {
        // 负的有效期让 token 一写入即过期
        let jar = TokenJar::new(-1, -1);
        jar.set_tokens("acc".into(), Some("ref".into())).await;

        assert!(jar.access_token().await.is_none());
        assert!(jar.refresh_token().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_both_tokens() {
        let jar = TokenJar::new(1, 7);
        jar.set_tokens("acc".into(), Some("ref".into())).await;
        jar.clear().await;

        assert!(jar.access_token().await.is_none());
        assert!(jar.refresh_token().await.is_none());
    }
}
