//! HTTP 客户端错误归一化测试
//!
//! 用一次性的本地 TCP 监听器回放固定响应，验证：
//! 401 清凭证、失败响应提取服务端消息、连不上归一化为网络错误

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use mcq_exam_client::api::{ApiClient, ExamApi};
use mcq_exam_client::config::Config;
use mcq_exam_client::error::{ApiError, AppError};
use mcq_exam_client::models::UserProfile;
use mcq_exam_client::store::SessionStore;

/// 起一个只应答一次的 HTTP 服务，返回其根地址
async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("绑定本地端口应成功");
    let addr = listener.local_addr().expect("应能取得本地地址");

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            // 读到请求头结束即可，不关心具体内容
            let mut buf = vec![0u8; 8192];
            let mut read = 0usize;
            loop {
                match socket.read(&mut buf[read..]).await {
                    Ok(0) => break,
                    Ok(n) => {
                        read += n;
                        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}", addr)
}

fn make_store_and_api(base_url: String) -> (Arc<SessionStore>, ExamApi) {
    let config = Config {
        api_base_url: base_url,
        request_timeout_secs: 5,
        ..Config::default()
    };
    let store = Arc::new(SessionStore::new(&config));
    let client = Arc::new(ApiClient::new(&config, store.token_jar()).expect("客户端初始化应成功"));
    (store, ExamApi::new(client))
}

#[tokio::test]
async fn test_401_clears_tokens_and_deauthenticates() {
    let base = serve_once("401 Unauthorized", "{}").await;
    let (store, exam_api) = make_store_and_api(base);

    store
        .set_credentials(
            UserProfile::with_mobile("+919876543210"),
            "access".to_string(),
            Some("refresh".to_string()),
        )
        .await;
    assert!(store.is_authenticated().await);

    let result = exam_api.fetch_questions().await;

    assert!(
        matches!(result, Err(ref e) if e.is_session_expired()),
        "401 应归一化为会话过期"
    );
    assert!(
        !store.is_authenticated().await,
        "401 之后两个 token 都应被清空"
    );
    assert!(store.token_jar().access_token().await.is_none());
    assert!(store.token_jar().refresh_token().await.is_none());
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let base = serve_once(
        "400 Bad Request",
        r#"{"success": false, "message": "Mobile number not registered"}"#,
    )
    .await;
    let (_store, exam_api) = make_store_and_api(base);

    let result = exam_api.fetch_questions().await;

    match result {
        Err(AppError::Api(ApiError::BadResponse { message, status, .. })) => {
            assert_eq!(message.as_deref(), Some("Mobile number not registered"));
            assert_eq!(status, Some(400));
        }
        other => panic!("应为 BadResponse，实际是 {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_success_false_body_is_rejected() {
    let base = serve_once(
        "200 OK",
        r#"{"success": false, "message": "No active test"}"#,
    )
    .await;
    let (_store, exam_api) = make_store_and_api(base);

    let result = exam_api.fetch_questions().await;

    match result {
        Err(AppError::Api(ApiError::BadResponse { message, .. })) => {
            assert_eq!(message.as_deref(), Some("No active test"));
        }
        other => panic!("应为 BadResponse，实际是 {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    // 保留地址段，连接必然失败
    let (_store, exam_api) = make_store_and_api("http://127.0.0.1:1".to_string());

    let result = exam_api.fetch_questions().await;

    assert!(
        matches!(result, Err(AppError::Api(ApiError::Network { .. }))),
        "连不上应归一化为网络错误"
    );
}

#[tokio::test]
async fn test_question_list_parses_into_paper() {
    let base = serve_once(
        "200 OK",
        r#"{
            "success": true,
            "instruction": "<ul><li>Rule A</li><li>Rule B</li></ul>",
            "test_name": "History Mock Test",
            "total_time": 5400,
            "questions_count": 1,
            "total_marks": 100,
            "questions": [
                {
                    "question_id": "q1",
                    "question": "孔雀王朝的建立者是谁？",
                    "options": [
                        {"id": "o1", "option": "旃陀罗笈多"},
                        {"id": "o2", "option": "阿育王"}
                    ]
                }
            ]
        }"#,
    )
    .await;
    let (_store, exam_api) = make_store_and_api(base);

    let response = exam_api.fetch_questions().await.expect("拉取应成功");
    let paper = response.into_paper(3600);

    assert_eq!(paper.test_name, "History Mock Test");
    assert_eq!(paper.total_time, 5400);
    assert_eq!(paper.questions.len(), 1);
    assert_eq!(paper.questions[0].id, "q1");
    assert_eq!(paper.questions[0].options.len(), 2);
    assert!(paper.questions[0].correct_answer.is_none());
}
