//! 接口层（API Layer）
//!
//! 负责与考试服务的全部 HTTP 交互：
//! - `client` - reqwest 封装，统一注入 Bearer 头、归一化错误、处理 401
//! - `auth` - 发送/校验验证码、建档、登出
//! - `exam` - 拉取题目列表、提交答卷

pub mod auth;
pub mod client;
pub mod exam;

pub use auth::AuthApi;
pub use client::ApiClient;
pub use exam::ExamApi;
