use serde::{Deserialize, Serialize};

/// 已选答案（按题目 ID 键控存放）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// 选项在题目选项列表中的下标
    pub answer_index: usize,
    /// 对应的选项 ID，提交载荷需要
    pub option_id: String,
}

/// 提交载荷中的单条目
///
/// 未作答的题目 `selected_option_id` 序列化为 null，条目本身绝不省略
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitEntry {
    pub question_id: String,
    pub selected_option_id: Option<String>,
}
