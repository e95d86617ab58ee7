//! 判分服务 - 业务能力层
//!
//! 两种判分策略统一在一个接口后面，按部署配置二选一：
//!
//! - **服务端权威**（默认）：逐字采信 /answers/submit 响应，本地不判分。
//!   负分、部分给分等规则都在服务端，本地无从得知
//! - **本地重算**：按 `correct_answer` 下标相等与否重算，百分比保留两位小数。
//!   服务端的计数被整个忽略，只保留记录元数据
//!
//! 两种策略可能得出不同的结果，绝不混用（选择记录见 DESIGN.md）

use std::collections::HashMap;
use std::str::FromStr;

use crate::api::exam::SubmitResponse;
use crate::models::{Answer, ExamResult, Question};

/// 判分策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringPolicy {
    /// 服务端权威：采信提交响应
    #[default]
    ServerAuthoritative,
    /// 本地重算：按 correct_answer 下标相等判定
    LocalRecompute,
}

impl FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" | "remote" => Ok(ScoringPolicy::ServerAuthoritative),
            "local" => Ok(ScoringPolicy::LocalRecompute),
            other => Err(format!("未知的判分策略: {}", other)),
        }
    }
}

/// 判分服务
pub struct ScoringService {
    policy: ScoringPolicy,
}

impl ScoringService {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    /// 由提交响应和本地状态得出最终成绩
    ///
    /// 本地重算模式下只从响应中保留 exam_history_id / submitted_at
    /// 两项元数据，计数一律本地算
    pub fn resolve(
        &self,
        questions: &[Question],
        answers: &HashMap<String, Answer>,
        response: SubmitResponse,
    ) -> ExamResult {
        match self.policy {
            ScoringPolicy::ServerAuthoritative => response.into_result(),
            ScoringPolicy::LocalRecompute => {
                let mut result = grade_locally(questions, answers);
                result.exam_history_id = response.exam_history_id;
                result.submitted_at = response.submitted_at;
                result
            }
        }
    }
}

/// 本地重算
///
/// 未作答 ⇒ unanswered；下标不等（或题目根本没带 correct_answer）⇒ incorrect；
/// 相等 ⇒ correct。分数为正确率百分比，保留两位小数
pub fn grade_locally(questions: &[Question], answers: &HashMap<String, Answer>) -> ExamResult {
    let mut correct = 0u32;
    let mut incorrect = 0u32;
    let mut unanswered = 0u32;

    for question in questions {
        match answers.get(&question.id) {
            None => unanswered += 1,
            Some(answer) => match question.correct_answer {
                Some(expected) if answer.answer_index == expected => correct += 1,
                _ => incorrect += 1,
            },
        }
    }

    let total = questions.len() as u32;
    let percentage = if total == 0 {
        0.0
    } else {
        round2(correct as f64 / total as f64 * 100.0)
    };

    ExamResult {
        total,
        correct,
        incorrect,
        unanswered,
        score: percentage,
        exam_history_id: None,
        submitted_at: None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
