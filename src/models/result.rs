use serde::{Deserialize, Serialize};

/// 考试成绩摘要
///
/// 不变式: correct + incorrect + unanswered == total
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamResult {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub unanswered: u32,
    /// 服务端判分时为服务端给出的分数；本地判分时为正确率百分比（保留两位小数）
    pub score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_history_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
}
