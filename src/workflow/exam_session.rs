//! 考试会话状态机
//!
//! 持有题目列表、当前位置、作答表与标记表，负责：
//! 导航、选择答案、标记待查、倒计时、交卷守卫。
//!
//! 阶段推进：Loading → Active → Submitting → Submitted
//! - Active 在导航与作答之间可重入
//! - Submitting 是瞬态守卫，保证网络提交只发生一次
//! - Submitted 是终态，只有 reset()（重考/离开）能离开它

use std::collections::{HashMap, HashSet};

use crate::error::{AppError, AppResult, ExamError};
use crate::models::{Answer, ExamResult, Question, SubmitEntry};

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Active,
    Submitting,
    Submitted,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Loading => "Loading",
            SessionPhase::Active => "Active",
            SessionPhase::Submitting => "Submitting",
            SessionPhase::Submitted => "Submitted",
        }
    }
}

/// 一次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 倒计时仍在进行，携带剩余秒数
    Running(u32),
    /// 刚好归零，需要自动交卷（对同一会话只会出现一次）
    Expired,
    /// 无事可做（非 Active 阶段，或已经归零过）
    Idle,
}

/// 交卷凭据
///
/// `begin_submit` 的第一个调用者拿到它；epoch 用于在响应返回时
/// 识别会话是否已被重置
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub epoch: u64,
    pub entries: Vec<SubmitEntry>,
}

/// 考试会话状态机
#[derive(Debug)]
pub struct ExamSession {
    phase: SessionPhase,
    questions: Vec<Question>,
    current_index: usize,
    answers: HashMap<String, Answer>,
    review_marks: HashMap<String, bool>,
    remaining_seconds: u32,
    /// 到点自动交卷的闩锁：触发过一次后不再触发
    expiry_fired: bool,
    /// 会话版本，每次 reset 自增
    epoch: u64,
    result: Option<ExamResult>,
}

impl ExamSession {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Loading,
            questions: Vec::new(),
            current_index: 0,
            answers: HashMap::new(),
            review_marks: HashMap::new(),
            remaining_seconds: 0,
            expiry_fired: false,
            epoch: 0,
            result: None,
        }
    }

    // ========== 只读访问 ==========

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn answers(&self) -> &HashMap<String, Answer> {
        &self.answers
    }

    pub fn review_marks(&self) -> &HashMap<String, bool> {
        &self.review_marks
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    // ========== 生命周期 ==========

    /// 载入题目并进入 Active
    ///
    /// 空列表或不合法的列表（题目 ID 重复、题目没有选项、
    /// `correct_answer` 越界）一律报 NoQuestions，调用方须退回须知页
    pub fn load_questions(
        &mut self,
        questions: Vec<Question>,
        total_time_seconds: u32,
    ) -> AppResult<()> {
        if questions.is_empty() {
            return Err(AppError::no_questions("题目列表为空"));
        }

        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id.as_str()) {
                return Err(AppError::no_questions(format!("题目 ID 重复: {}", q.id)));
            }
            if q.options.is_empty() {
                return Err(AppError::no_questions(format!("题目 {} 没有选项", q.id)));
            }
            if let Some(index) = q.correct_answer {
                if index >= q.options.len() {
                    return Err(AppError::no_questions(format!(
                        "题目 {} 的正确答案下标越界",
                        q.id
                    )));
                }
            }
        }

        self.questions = questions;
        self.answers.clear();
        self.review_marks.clear();
        self.current_index = 0;
        self.remaining_seconds = total_time_seconds;
        self.expiry_fired = false;
        self.result = None;
        self.phase = SessionPhase::Active;
        Ok(())
    }

    /// 重置会话（重考或显式离开）
    ///
    /// 版本自增，使所有在途提交的响应失效
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.phase = SessionPhase::Loading;
        self.questions.clear();
        self.answers.clear();
        self.review_marks.clear();
        self.current_index = 0;
        self.remaining_seconds = 0;
        self.expiry_fired = false;
        self.result = None;
    }

    // ========== 作答与标记 ==========

    /// 选择答案，后写覆盖先写，不留历史
    pub fn select_answer(&mut self, question_id: &str, option_index: usize) -> AppResult<()> {
        self.ensure_active("select_answer")?;

        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| {
                AppError::Exam(ExamError::UnknownQuestion {
                    id: question_id.to_string(),
                })
            })?;

        let option_id = question.option_id(option_index).ok_or_else(|| {
            AppError::Exam(ExamError::InvalidOption {
                index: option_index,
                max: question.option_count(),
            })
        })?;

        self.answers.insert(
            question_id.to_string(),
            Answer {
                answer_index: option_index,
                option_id: option_id.to_string(),
            },
        );
        Ok(())
    }

    /// 切换"标记待查"，与是否作答无关
    pub fn toggle_review_mark(&mut self, question_id: &str) -> AppResult<()> {
        self.ensure_active("toggle_review_mark")?;

        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(AppError::Exam(ExamError::UnknownQuestion {
                id: question_id.to_string(),
            }));
        }

        let mark = self
            .review_marks
            .entry(question_id.to_string())
            .or_insert(false);
        *mark = !*mark;
        Ok(())
    }

    // ========== 导航（越界静默夹取） ==========

    pub fn go_to(&mut self, index: usize) {
        if self.questions.is_empty() {
            return;
        }
        self.current_index = index.min(self.questions.len() - 1);
    }

    /// 末题处为空操作
    pub fn next(&mut self) {
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        }
    }

    /// 首题处为空操作
    pub fn previous(&mut self) {
        self.current_index = self.current_index.saturating_sub(1);
    }

    // ========== 倒计时 ==========

    /// 秒级心跳：递减剩余时间，到 0 为止
    ///
    /// 恰好归零的那一次返回 Expired，之后的 tick 一律 Idle——
    /// 已交卷的会话不会被迟到的 tick 复活
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::Active {
            return TickOutcome::Idle;
        }

        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }

        if self.remaining_seconds == 0 {
            if self.expiry_fired {
                TickOutcome::Idle
            } else {
                self.expiry_fired = true;
                TickOutcome::Expired
            }
        } else {
            TickOutcome::Running(self.remaining_seconds)
        }
    }

    // ========== 交卷 ==========

    /// 尝试进入 Submitting
    ///
    /// 第一个调用者拿到交卷凭据；并发 / 重复调用（手动交卷与
    /// 到点自动交卷竞争）观察到守卫后得到 None，不再产生第二次提交
    pub fn begin_submit(&mut self) -> Option<SubmissionTicket> {
        if self.phase != SessionPhase::Active {
            return None;
        }
        self.phase = SessionPhase::Submitting;
        Some(SubmissionTicket {
            epoch: self.epoch,
            entries: self.submission_payload(),
        })
    }

    /// 按原始顺序构造提交载荷，每题一条，未作答发 null
    pub fn submission_payload(&self) -> Vec<SubmitEntry> {
        self.questions
            .iter()
            .map(|q| SubmitEntry {
                question_id: q.id.clone(),
                selected_option_id: self.answers.get(&q.id).map(|a| a.option_id.clone()),
            })
            .collect()
    }

    /// 提交成功：Submitting → Submitted，记录成绩
    pub fn complete_submit(&mut self, epoch: u64, result: ExamResult) -> AppResult<()> {
        if epoch != self.epoch {
            return Err(AppError::Exam(ExamError::StaleSession));
        }
        if self.phase != SessionPhase::Submitting {
            return Err(AppError::Exam(ExamError::InvalidState {
                operation: "complete_submit",
                state: self.phase.as_str(),
            }));
        }
        self.result = Some(result);
        self.phase = SessionPhase::Submitted;
        Ok(())
    }

    /// 提交失败：Submitting → Active，答案原样保留，等待手动重试
    pub fn fail_submit(&mut self, epoch: u64) -> AppResult<()> {
        if epoch != self.epoch {
            return Err(AppError::Exam(ExamError::StaleSession));
        }
        if self.phase == SessionPhase::Submitting {
            self.phase = SessionPhase::Active;
        }
        Ok(())
    }

    fn ensure_active(&self, operation: &'static str) -> AppResult<()> {
        if self.phase != SessionPhase::Active {
            return Err(AppError::Exam(ExamError::InvalidState {
                operation,
                state: self.phase.as_str(),
            }));
        }
        Ok(())
    }
}

impl Default for ExamSession {
    fn default() -> Self {
        Self::new()
    }
}
