//! 导航面板派生数据 - 业务能力层
//!
//! 答题统计与题号磁贴着色都是对权威状态（作答表 / 标记表）的纯派生，
//! 每次需要时现算，绝不另存一份，避免与源数据漂移。

use std::collections::HashMap;

use crate::models::{Answer, Question};

/// 题号磁贴的视觉分类
///
/// 优先级是硬约定：Answered > Marked > NotAttended > Unvisited。
/// 一道既作答又被标记、又早已访问过的题，永远显示为 Answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// 已作答（无论是否标记）
    Answered,
    /// 仅标记待查（未作答）
    Marked,
    /// 访问过但未作答（下标小于当前位置）
    NotAttended,
    /// 尚未到达
    Unvisited,
}

/// 答题统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnswerSummary {
    pub answered: usize,
    pub unanswered: usize,
    pub marked: usize,
    pub answered_and_marked: usize,
}

/// 单题磁贴分类
pub fn classify_tile(
    index: usize,
    question_id: &str,
    current_index: usize,
    answers: &HashMap<String, Answer>,
    review_marks: &HashMap<String, bool>,
) -> TileState {
    if answers.contains_key(question_id) {
        TileState::Answered
    } else if review_marks.get(question_id).copied().unwrap_or(false) {
        TileState::Marked
    } else if index < current_index {
        TileState::NotAttended
    } else {
        TileState::Unvisited
    }
}

/// 整卷磁贴分类，按题目原始顺序
pub fn tile_states(
    questions: &[Question],
    current_index: usize,
    answers: &HashMap<String, Answer>,
    review_marks: &HashMap<String, bool>,
) -> Vec<TileState> {
    questions
        .iter()
        .enumerate()
        .map(|(index, q)| classify_tile(index, &q.id, current_index, answers, review_marks))
        .collect()
}

/// 答题统计
pub fn summarize(
    questions: &[Question],
    answers: &HashMap<String, Answer>,
    review_marks: &HashMap<String, bool>,
) -> AnswerSummary {
    let answered = answers.len();
    let marked = review_marks.values().filter(|m| **m).count();
    let answered_and_marked = questions
        .iter()
        .filter(|q| {
            answers.contains_key(&q.id) && review_marks.get(&q.id).copied().unwrap_or(false)
        })
        .count();

    AnswerSummary {
        answered,
        unanswered: questions.len().saturating_sub(answered),
        marked,
        answered_and_marked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionOption;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: format!("q{}", i + 1),
                prompt: format!("题目 {}", i + 1),
                options: vec![QuestionOption {
                    id: format!("o{}", i + 1),
                    option: "甲".to_string(),
                }],
                comprehension: None,
                image: None,
                correct_answer: None,
            })
            .collect()
    }

    fn answered(id: &str) -> (String, Answer) {
        (
            id.to_string(),
            Answer {
                answer_index: 0,
                option_id: "o1".to_string(),
            },
        )
    }

    #[test]
    fn test_answered_beats_marked_and_visited() {
        // 第 0 题既作答又标记，当前已走到第 5 题：仍显示 Answered
        let qs = questions(6);
        let answers: HashMap<_, _> = [answered("q1")].into_iter().collect();
        let marks: HashMap<_, _> = [("q1".to_string(), true)].into_iter().collect();

        assert_eq!(
            classify_tile(0, "q1", 5, &answers, &marks),
            TileState::Answered
        );
        assert_eq!(tile_states(&qs, 5, &answers, &marks)[0], TileState::Answered);
    }

    #[test]
    fn test_marked_beats_visited() {
        let answers = HashMap::new();
        let marks: HashMap<_, _> = [("q1".to_string(), true)].into_iter().collect();

        assert_eq!(
            classify_tile(0, "q1", 3, &answers, &marks),
            TileState::Marked
        );
    }

    #[test]
    fn test_visited_unanswered_and_unvisited() {
        let answers = HashMap::new();
        let marks = HashMap::new();

        assert_eq!(
            classify_tile(1, "q2", 3, &answers, &marks),
            TileState::NotAttended
        );
        assert_eq!(
            classify_tile(4, "q5", 3, &answers, &marks),
            TileState::Unvisited
        );
    }

    #[test]
    fn test_summary_counts() {
        let qs = questions(4);
        let answers: HashMap<_, _> = [answered("q1"), answered("q2")].into_iter().collect();
        let marks: HashMap<_, _> = [
            ("q2".to_string(), true),
            ("q3".to_string(), true),
            // 标记过又取消的不计入
            ("q4".to_string(), false),
        ]
        .into_iter()
        .collect();

        let summary = summarize(&qs, &answers, &marks);

        assert_eq!(summary.answered, 2);
        assert_eq!(summary.unanswered, 2);
        assert_eq!(summary.marked, 2);
        assert_eq!(summary.answered_and_marked, 1);
    }
}
