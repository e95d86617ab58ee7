//! 考前须知解析 - 业务能力层
//!
//! 服务端的 instruction 字段是一段 HTML。规则列表的提取顺序：
//! 1. 含 `<li>` 时逐条捕获
//! 2. 否则按换行切分
//! 每行剥掉全部标签并去空白；一条都提不出来（或拉取整体失败）
//! 时退回固定的十条默认规则。

use std::sync::OnceLock;

use regex::Regex;

use crate::api::exam::QuestionListResponse;

/// 默认规则列表（提取失败时的兜底文案，沿用服务端的英文原文）
pub const DEFAULT_RULES: [&str; 10] = [
    "You have 101 minutes to complete the test.",
    "Test consists of 100 multiple-choice questions.",
    "You are allowed 2 retake attempts if you do not pass on the first try.",
    "Each incorrect answer will incur a negative mark of -1/4.",
    "Ensure you are in a quiet environment and have a stable internet connection.",
    "Keep an eye on the timer, and try to answer all questions within the given time.",
    "Do not use any external resources such as dictionaries, websites, or assistance.",
    "Complete the test honestly to accurately assess your proficiency level.",
    "Check answers before submitting.",
    "Your test results will be displayed immediately after submission, indicating whether you have passed or need to retake the test.",
];

const FALLBACK_TITLE: &str = "Ancient Indian History MCQ";

fn li_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<li>(.*?)</li>").unwrap())
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

/// 剥掉 HTML 标签并解码常见实体
pub fn strip_tags(html: &str) -> String {
    let text = tag_regex().replace_all(html, "");
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// 从 HTML 说明中提取规则列表
pub fn parse_rules(instruction: &str) -> Vec<String> {
    let rules: Vec<String> = if instruction.contains("<li>") {
        li_regex()
            .captures_iter(instruction)
            .map(|cap| strip_tags(&cap[1]).trim().to_string())
            .filter(|rule| !rule.is_empty())
            .collect()
    } else {
        instruction
            .split('\n')
            .map(|line| strip_tags(line).trim().to_string())
            .filter(|rule| !rule.is_empty())
            .collect()
    };

    if rules.is_empty() {
        DEFAULT_RULES.iter().map(|r| r.to_string()).collect()
    } else {
        rules
    }
}

/// 考前须知页的数据模型
#[derive(Debug, Clone)]
pub struct ExamBriefing {
    pub title: String,
    pub duration_minutes: u32,
    pub total_questions: usize,
    pub total_marks: u32,
    pub total_time: u32,
    pub rules: Vec<String>,
}

impl ExamBriefing {
    /// 由 /question/list 响应派生
    pub fn from_response(response: &QuestionListResponse, fallback_total_time: u32) -> Self {
        let total_time = response.total_time.unwrap_or(fallback_total_time);
        Self {
            title: response
                .test_name
                .clone()
                .unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            duration_minutes: total_time.div_ceil(60),
            total_questions: response
                .questions_count
                .unwrap_or(response.questions.len()),
            total_marks: response.total_marks.unwrap_or(100),
            total_time,
            rules: parse_rules(response.instruction.as_deref().unwrap_or("")),
        }
    }

    /// 拉取失败时的整页兜底
    pub fn fallback() -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            duration_minutes: 90,
            total_questions: 100,
            total_marks: 100,
            total_time: 5400,
            rules: DEFAULT_RULES.iter().map(|r| r.to_string()).collect(),
        }
    }
}
