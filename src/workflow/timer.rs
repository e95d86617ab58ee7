//! 倒计时驱动
//!
//! 单一的秒级时钟：会话进入 Active 时启动，交卷或离开时停止。
//! 驱动自身不持有任何考试状态，只负责每秒调用一次状态机的 tick()
//! 并把结果转成事件发出去。
//!
//! 停止保证：stop() 之后不再有 tick 落到状态机上——停止标志在
//! 会话锁内复查，正在途中的那一次 tick 也会被拦下。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::workflow::exam_session::{ExamSession, TickOutcome};

/// 考试过程中的异步事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamEvent {
    /// 剩余时间更新（秒）
    Tick(u32),
    /// 倒计时归零，需要自动交卷
    TimeExpired,
}

/// 倒计时驱动
pub struct TimerDriver {
    handle: Option<JoinHandle<()>>,
    stopped: Arc<AtomicBool>,
}

impl TimerDriver {
    /// 启动秒级心跳
    pub fn start(
        session: Arc<Mutex<ExamSession>>,
        events: UnboundedSender<ExamEvent>,
    ) -> Self {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval 的第一次 tick 立即完成，跳过它
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let outcome = {
                    let mut session = session.lock().await;
                    // 锁内复查停止标志，保证 stop() 之后不再有 tick 生效
                    if flag.load(Ordering::SeqCst) {
                        break;
                    }
                    session.tick()
                };

                match outcome {
                    TickOutcome::Running(remaining) => {
                        if events.send(ExamEvent::Tick(remaining)).is_err() {
                            break;
                        }
                    }
                    TickOutcome::Expired => {
                        let _ = events.send(ExamEvent::TimeExpired);
                    }
                    TickOutcome::Idle => {}
                }
            }
        });

        Self {
            handle: Some(handle),
            stopped,
        }
    }

    /// 停止计时，之后不再产生任何 tick
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, QuestionOption};
    use tokio::sync::mpsc;

    fn one_question() -> Vec<Question> {
        vec![Question {
            id: "q1".to_string(),
            prompt: "测试题".to_string(),
            options: vec![QuestionOption {
                id: "o1".to_string(),
                option: "甲".to_string(),
            }],
            comprehension: None,
            image: None,
            correct_answer: None,
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_drive_session_countdown() {
        let session = Arc::new(Mutex::new(ExamSession::new()));
        session
            .lock()
            .await
            .load_questions(one_question(), 3)
            .expect("载入题目应成功");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut driver = TimerDriver::start(Arc::clone(&session), tx);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(rx.recv().await, Some(ExamEvent::Tick(2)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(rx.recv().await, Some(ExamEvent::Tick(1)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(rx.recv().await, Some(ExamEvent::TimeExpired));

        driver.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_ticks() {
        let session = Arc::new(Mutex::new(ExamSession::new()));
        session
            .lock()
            .await
            .load_questions(one_question(), 600)
            .expect("载入题目应成功");

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut driver = TimerDriver::start(Arc::clone(&session), tx);
        driver.stop();

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;

        assert_eq!(session.lock().await.remaining_seconds(), 600);
    }
}
