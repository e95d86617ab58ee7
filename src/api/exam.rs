//! 考试接口
//!
//! 拉取题目列表与提交答卷

use std::sync::Arc;

use reqwest::multipart;
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};
use crate::models::{ExamPaper, ExamResult, Question, SubmitEntry};

use super::client::ApiClient;

/// /question/list 响应
#[derive(Debug, Deserialize)]
pub struct QuestionListResponse {
    pub success: bool,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub test_name: Option<String>,
    #[serde(default)]
    pub total_time: Option<u32>,
    #[serde(default)]
    pub questions_count: Option<usize>,
    #[serde(default)]
    pub total_marks: Option<u32>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub message: Option<String>,
}

impl QuestionListResponse {
    /// 转成试卷模型，缺失字段按兜底值补齐
    pub fn into_paper(self, fallback_total_time: u32) -> ExamPaper {
        let questions_count = self.questions_count.unwrap_or(self.questions.len());
        ExamPaper {
            test_name: self
                .test_name
                .unwrap_or_else(|| "Ancient Indian History MCQ".to_string()),
            instruction: self.instruction.unwrap_or_default(),
            total_time: self.total_time.unwrap_or(fallback_total_time),
            questions_count,
            total_marks: self.total_marks.unwrap_or(0),
            questions: self.questions,
        }
    }
}

/// /answers/submit 响应
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub wrong: u32,
    #[serde(default)]
    pub not_attended: u32,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "deserialize_history_id")]
    pub exam_history_id: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmitResponse {
    /// 服务端权威成绩：逐字采信响应中的各项计数
    pub fn into_result(self) -> ExamResult {
        ExamResult {
            total: self.correct + self.wrong + self.not_attended,
            correct: self.correct,
            incorrect: self.wrong,
            unanswered: self.not_attended,
            score: self.score,
            exam_history_id: self.exam_history_id,
            submitted_at: self.submitted_at,
        }
    }
}

/// 考试 API
#[derive(Clone)]
pub struct ExamApi {
    client: Arc<ApiClient>,
}

impl ExamApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// 拉取题目列表（同一响应兼做考前须知数据源）
    pub async fn fetch_questions(&self) -> AppResult<QuestionListResponse> {
        let response: QuestionListResponse = self.client.get_json("/question/list").await?;
        if !response.success {
            return Err(AppError::bad_response(
                "/question/list",
                None,
                response.message.clone(),
            ));
        }
        Ok(response)
    }

    /// 提交答卷
    ///
    /// `answers` 字段是 JSON 编码的条目数组，放在 multipart 表单里
    pub async fn submit_answers(&self, entries: &[SubmitEntry]) -> AppResult<SubmitResponse> {
        let payload = serde_json::to_string(entries)?;
        let form = multipart::Form::new().text("answers", payload);
        self.client.post_form("/answers/submit", form).await
    }
}

// 考试记录 ID 在不同部署下有时是字符串有时是整数，统一收成字符串
fn deserialize_history_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer exam history id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
