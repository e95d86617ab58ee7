//! 对真实考试服务的联调测试
//!
//! 默认忽略，需要手动运行：cargo test -- --ignored
//! 前置条件：MCQ_API_BASE_URL 指向可用环境，且已有有效的 access token

use std::sync::Arc;

use mcq_exam_client::api::{ApiClient, AuthApi, ExamApi};
use mcq_exam_client::config::Config;
use mcq_exam_client::models::UserProfile;
use mcq_exam_client::services::instructions::ExamBriefing;
use mcq_exam_client::store::SessionStore;
use mcq_exam_client::utils::logging;

fn make_store(config: &Config) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(config))
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_send_otp_against_live_service() {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();
    let store = make_store(&config);
    let client = Arc::new(ApiClient::new(&config, store.token_jar()).expect("客户端初始化失败"));
    let auth_api = AuthApi::new(client);

    // 注意：请根据实际情况替换手机号
    let response = auth_api
        .send_otp("+919876543210")
        .await
        .expect("发送验证码失败");

    println!("send-otp 响应: success={}", response.success);
    assert!(response.success, "发送验证码应成功");
}

#[tokio::test]
#[ignore]
async fn test_fetch_questions_against_live_service() {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();
    let store = make_store(&config);

    // 注意：请先在环境变量中提供有效 token
    let access_token = std::env::var("MCQ_ACCESS_TOKEN").expect("缺少 MCQ_ACCESS_TOKEN");
    store
        .set_credentials(UserProfile::with_mobile("+910000000000"), access_token, None)
        .await;

    let client = Arc::new(ApiClient::new(&config, store.token_jar()).expect("客户端初始化失败"));
    let exam_api = ExamApi::new(client);

    let response = exam_api.fetch_questions().await.expect("拉取题目失败");

    let briefing = ExamBriefing::from_response(&response, config.fallback_total_time_secs);
    println!(
        "试卷: {} | {} 题 | 总时长 {} 秒 | {} 条须知",
        briefing.title,
        briefing.total_questions,
        briefing.total_time,
        briefing.rules.len()
    );

    assert!(!response.questions.is_empty(), "题目列表不应为空");
    for question in &response.questions {
        assert!(!question.options.is_empty(), "每道题都应有选项");
    }
}
