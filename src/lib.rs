//! # MCQ Exam Client
//!
//! 面向远端考试服务的 MCQ 客户端：手机号 + 验证码登录，
//! 拉取限时选择题，本地维护作答/标记状态，提交答卷并渲染成绩。
//! 题目内容、验证码签发与（默认部署下的）判分都在服务端，
//! 客户端只是状态持有者和渲染器。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据模型层（Models）
//! - `models/` - serde 定义的领域类型与报文结构
//! - `Question` / `Answer` / `SubmitEntry` / `ExamResult` / `UserProfile`
//!
//! ### ② 接口层（Api）
//! - `api/` - 与考试服务的全部 HTTP 交互
//! - `ApiClient` - 注入 Bearer 头、归一化错误、401 即清凭证
//! - `AuthApi` / `ExamApi` - 端点封装
//!
//! ### ③ 状态层（Store）
//! - `store/` - 会话存储（认证分区 + token 罐 + 忙碌信号）
//! - 考试分区即 `ExamSession` 状态机本体
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 考试会话状态机、倒计时驱动、登录流程控制器
//! - `ExamSession` - Loading → Active → Submitting → Submitted
//! - `TimerDriver` - 秒级心跳，可确定性停止
//! - `AuthFlow` - 手机号 → 验证码 → [建档]，显式迁移表
//!
//! ### ⑤ 能力层（Services）
//! - `services/` - 判分、答题卡派生数据、考前须知解析
//!
//! ### ⑥ 编排层（App）
//! - `app.rs` - 终端里的完整页面流程

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Answer, ExamPaper, ExamResult, Question, SubmitEntry};
pub use services::{ExamBriefing, ScoringPolicy, ScoringService};
pub use store::SessionStore;
pub use workflow::{AuthFlow, AuthStep, ExamEvent, ExamSession, SessionPhase, TimerDriver};
