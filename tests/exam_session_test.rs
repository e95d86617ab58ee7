//! 考试会话状态机的行为测试（纯本地，不触网）

use mcq_exam_client::error::{AppError, ExamError};
use mcq_exam_client::models::{ExamResult, Question, QuestionOption, SubmitEntry};
use mcq_exam_client::workflow::{ExamSession, SessionPhase, TickOutcome};

/// 构造 n 道题，题目 ID 为 q1..qn，每题四个选项 o<n>-1..o<n>-4
fn make_questions(n: usize) -> Vec<Question> {
    (1..=n)
        .map(|i| Question {
            id: format!("q{}", i),
            prompt: format!("第 {} 题", i),
            options: (1..=4)
                .map(|j| QuestionOption {
                    id: format!("o{}-{}", i, j),
                    option: format!("选项 {}", j),
                })
                .collect(),
            comprehension: None,
            image: None,
            correct_answer: None,
        })
        .collect()
}

fn active_session(n: usize, total_time: u32) -> ExamSession {
    let mut session = ExamSession::new();
    session
        .load_questions(make_questions(n), total_time)
        .expect("载入题目应成功");
    session
}

fn dummy_result() -> ExamResult {
    ExamResult {
        total: 3,
        correct: 1,
        incorrect: 1,
        unanswered: 1,
        score: 33.33,
        exam_history_id: None,
        submitted_at: None,
    }
}

#[test]
fn test_load_empty_list_is_rejected() {
    let mut session = ExamSession::new();
    let result = session.load_questions(Vec::new(), 600);

    assert!(matches!(
        result,
        Err(AppError::Exam(ExamError::NoQuestions { .. }))
    ));
    assert_eq!(session.phase(), SessionPhase::Loading);
}

#[test]
fn test_load_duplicate_ids_is_rejected() {
    let mut questions = make_questions(2);
    questions[1].id = "q1".to_string();

    let mut session = ExamSession::new();
    let result = session.load_questions(questions, 600);

    assert!(matches!(
        result,
        Err(AppError::Exam(ExamError::NoQuestions { .. }))
    ));
}

#[test]
fn test_last_write_wins() {
    let mut session = active_session(3, 600);

    session.select_answer("q1", 0).expect("作答应成功");
    session.select_answer("q1", 2).expect("作答应成功");
    session.select_answer("q1", 1).expect("作答应成功");

    let answer = session.answers().get("q1").expect("应有记录");
    assert_eq!(answer.answer_index, 1);
    assert_eq!(answer.option_id, "o1-2");
}

#[test]
fn test_select_answer_validates_inputs() {
    let mut session = active_session(2, 600);

    assert!(matches!(
        session.select_answer("missing", 0),
        Err(AppError::Exam(ExamError::UnknownQuestion { .. }))
    ));
    assert!(matches!(
        session.select_answer("q1", 4),
        Err(AppError::Exam(ExamError::InvalidOption { .. }))
    ));
}

#[test]
fn test_review_mark_is_independent_of_answer() {
    let mut session = active_session(2, 600);

    session.toggle_review_mark("q1").expect("标记应成功");
    assert_eq!(session.review_marks().get("q1"), Some(&true));

    // 作答不影响标记，标记也可以在作答后取消
    session.select_answer("q1", 0).expect("作答应成功");
    assert_eq!(session.review_marks().get("q1"), Some(&true));

    session.toggle_review_mark("q1").expect("标记应成功");
    assert_eq!(session.review_marks().get("q1"), Some(&false));
}

#[test]
fn test_navigation_clamps_at_bounds() {
    let mut session = active_session(3, 600);

    session.previous();
    assert_eq!(session.current_index(), 0, "首题处 previous 应为空操作");

    session.go_to(99);
    assert_eq!(session.current_index(), 2, "越界跳转应夹取到末题");

    session.next();
    assert_eq!(session.current_index(), 2, "末题处 next 应为空操作");

    session.go_to(1);
    assert_eq!(session.current_index(), 1);
}

#[test]
fn test_tick_counts_down_and_floors_at_zero() {
    let mut session = active_session(1, 5);

    for expected in (1..=4).rev() {
        assert_eq!(session.tick(), TickOutcome::Running(expected));
    }
    assert_eq!(session.tick(), TickOutcome::Expired);
    assert_eq!(session.remaining_seconds(), 0);

    // 归零后继续 tick 不会变成负数，也不会再触发
    for _ in 0..3 {
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert_eq!(session.remaining_seconds(), 0);
    }
}

#[test]
fn test_expiry_fires_exactly_once() {
    let mut session = active_session(1, 1);

    assert_eq!(session.tick(), TickOutcome::Expired);
    assert_eq!(session.tick(), TickOutcome::Idle);
    assert_eq!(session.tick(), TickOutcome::Idle);
}

#[test]
fn test_submit_guard_allows_single_submission() {
    let mut session = active_session(2, 600);

    let first = session.begin_submit();
    assert!(first.is_some(), "第一个调用者应拿到交卷凭据");
    assert_eq!(session.phase(), SessionPhase::Submitting);

    // 与自动交卷竞争的第二次调用观察到守卫，不产生第二次提交
    assert!(session.begin_submit().is_none());
}

#[test]
fn test_submission_payload_order_and_nulls() {
    let mut session = active_session(3, 600);
    session.select_answer("q2", 1).expect("作答应成功");

    let payload = session.submission_payload();

    assert_eq!(
        payload,
        vec![
            SubmitEntry {
                question_id: "q1".to_string(),
                selected_option_id: None,
            },
            SubmitEntry {
                question_id: "q2".to_string(),
                selected_option_id: Some("o2-2".to_string()),
            },
            SubmitEntry {
                question_id: "q3".to_string(),
                selected_option_id: None,
            },
        ]
    );

    // 未作答的条目序列化成 null，而不是被省略
    let json = serde_json::to_string(&payload).expect("序列化应成功");
    assert!(json.contains(r#"{"question_id":"q1","selected_option_id":null}"#));
}

#[test]
fn test_complete_submit_reaches_terminal_state() {
    let mut session = active_session(3, 600);
    let ticket = session.begin_submit().expect("应拿到凭据");

    session
        .complete_submit(ticket.epoch, dummy_result())
        .expect("交卷应成功");

    assert_eq!(session.phase(), SessionPhase::Submitted);
    assert!(session.result().is_some());

    // 终态下 tick 不再有效果
    assert_eq!(session.tick(), TickOutcome::Idle);
}

#[test]
fn test_failed_submission_returns_to_active_and_keeps_answers() {
    let mut session = active_session(2, 600);
    session.select_answer("q1", 3).expect("作答应成功");

    let ticket = session.begin_submit().expect("应拿到凭据");
    session.fail_submit(ticket.epoch).expect("回滚应成功");

    assert_eq!(session.phase(), SessionPhase::Active);
    assert_eq!(
        session.answers().get("q1").map(|a| a.answer_index),
        Some(3),
        "提交失败不得清空答案"
    );

    // 回到 Active 后可以重试
    assert!(session.begin_submit().is_some());
}

#[test]
fn test_reset_invalidates_in_flight_submission() {
    let mut session = active_session(2, 600);
    let ticket = session.begin_submit().expect("应拿到凭据");

    // 用户在提交途中离开考试
    session.reset();

    let late = session.complete_submit(ticket.epoch, dummy_result());
    assert!(
        matches!(late, Err(AppError::Exam(ExamError::StaleSession))),
        "迟到的响应不得复活已重置的会话"
    );
    assert_eq!(session.phase(), SessionPhase::Loading);
    assert!(session.result().is_none());
}

#[test]
fn test_operations_rejected_outside_active() {
    let mut session = ExamSession::new();

    assert!(matches!(
        session.select_answer("q1", 0),
        Err(AppError::Exam(ExamError::InvalidState { .. }))
    ));
    assert_eq!(session.tick(), TickOutcome::Idle);
    assert!(session.begin_submit().is_none());
}

#[test]
fn test_reload_after_reset_starts_fresh() {
    let mut session = active_session(2, 600);
    session.select_answer("q1", 0).expect("作答应成功");
    session.toggle_review_mark("q2").expect("标记应成功");
    let old_epoch = session.epoch();

    session.reset();
    session
        .load_questions(make_questions(2), 300)
        .expect("重新载入应成功");

    assert!(session.answers().is_empty());
    assert!(session.review_marks().is_empty());
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.remaining_seconds(), 300);
    assert!(session.epoch() > old_epoch);
}
