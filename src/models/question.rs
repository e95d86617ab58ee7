use serde::{Deserialize, Serialize};

/// 单个选项
///
/// 选项文本与其不透明 ID 成对出现，天然保证两者等长对齐
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub option: String,
}

/// 考试题目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question_id")]
    pub id: String,

    #[serde(rename = "question")]
    pub prompt: String,

    pub options: Vec<QuestionOption>,

    /// 阅读理解材料（多题可共享同一段）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comprehension: Option<String>,

    /// 题目配图地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// 正确选项下标，仅本地判分部署由服务端下发；缺失即意味着判分在服务端
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<usize>,
}

impl Question {
    /// 按下标取选项 ID
    pub fn option_id(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(|o| o.id.as_str())
    }

    /// 选项数量
    pub fn option_count(&self) -> usize {
        self.options.len()
    }
}

/// 一套完整的试卷（/question/list 的有效载荷）
#[derive(Debug, Clone)]
pub struct ExamPaper {
    pub test_name: String,
    /// HTML 形式的考前须知
    pub instruction: String,
    /// 总时长（秒）
    pub total_time: u32,
    pub questions_count: usize,
    pub total_marks: u32,
    pub questions: Vec<Question>,
}
