//! 流程层（Workflow Layer）
//!
//! ## 职责
//!
//! 本层定义两个核心流程，是整个客户端的"心脏"：
//!
//! ### `exam_session` - 考试会话状态机
//! - 阶段推进（Loading → Active → Submitting → Submitted）
//! - 作答 / 标记 / 导航的全部簿记
//! - 倒计时递减与到点自动交卷（恰好触发一次）
//! - 提交守卫：手动交卷与自动交卷竞争时只产生一次网络提交
//! - 会话版本（epoch）：重置后迟到的响应一律丢弃
//!
//! ### `auth_flow` - 登录流程控制器
//! - 三步推进（手机号 → 验证码 → [建档]）+ 显式迁移表
//! - 本地校验先行，校验失败绝不触网
//!
//! ### `timer` - 倒计时驱动
//! - 纯调度原语，每秒驱动一次状态机 tick，自身不持有考试状态
//!
//! ## 设计原则
//!
//! 1. **单一写者**：状态机的每次变更都由一个离散事件触发，跑完即返回
//! 2. **派生不缓存**：答题统计、磁贴着色一律现算（见 `services::navigator`）
//! 3. **向下依赖**：workflow → api / store → models

pub mod auth_flow;
pub mod exam_session;
pub mod timer;

pub use auth_flow::{AuthFlow, AuthStep};
pub use exam_session::{ExamSession, SessionPhase, SubmissionTicket, TickOutcome};
pub use timer::{ExamEvent, TimerDriver};
