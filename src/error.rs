use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 本地校验错误（不触网）
    Validation(ValidationError),
    /// 认证相关错误
    Auth(AuthError),
    /// API 调用错误
    Api(ApiError),
    /// 考试会话错误
    Exam(ExamError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "校验错误: {}", e),
            AppError::Auth(e) => write!(f, "认证错误: {}", e),
            AppError::Api(e) => write!(f, "API错误: {}", e),
            AppError::Exam(e) => write!(f, "考试错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Validation(e) => Some(e),
            AppError::Auth(e) => Some(e),
            AppError::Api(e) => Some(e),
            AppError::Exam(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 单个字段的校验错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// 字段名（与表单字段一一对应）
    pub field: &'static str,
    /// 展示给用户的错误信息
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// 校验错误
///
/// 一次性收集所有字段错误，逐条展示在对应字段旁
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .fields
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationError {}

/// 认证相关错误
#[derive(Debug)]
pub enum AuthError {
    /// 远端拒绝（如验证码错误），携带服务端消息
    Rejected { message: String },
    /// 任意接口返回 401，会话已过期，必须重新登录
    SessionExpired,
    /// 登录流程状态机的非法迁移
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Rejected { message } => write!(f, "{}", message),
            AuthError::SessionExpired => write!(f, "会话已过期，请重新登录"),
            AuthError::InvalidTransition { from, to } => {
                write!(f, "登录流程不允许从 {} 进入 {}", from, to)
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API 调用错误
#[derive(Debug)]
pub enum ApiError {
    /// 网络请求失败（无响应）
    Network {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务端返回失败响应
    BadResponse {
        endpoint: String,
        status: Option<u16>,
        message: Option<String>,
    },
    /// JSON 解析失败
    JsonParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network { endpoint, source } => {
                write!(f, "网络异常，请检查网络连接 ({}): {}", endpoint, source)
            }
            ApiError::BadResponse {
                endpoint,
                status,
                message,
            } => {
                let msg = message.as_deref().unwrap_or("服务端返回失败");
                match status {
                    Some(code) => write!(f, "{} ({}, HTTP {})", msg, endpoint, code),
                    None => write!(f, "{} ({})", msg, endpoint),
                }
            }
            ApiError::JsonParseFailed { source } => write!(f, "JSON解析失败: {}", source),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network { source, .. } | ApiError::JsonParseFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            ApiError::BadResponse { .. } => None,
        }
    }
}

/// 考试会话错误
#[derive(Debug)]
pub enum ExamError {
    /// 题目列表为空或不合法（加载失败，须退回考前须知页）
    NoQuestions { reason: String },
    /// 答卷提交失败（会话保持 Active，可手动重试）
    SubmissionFailed { message: String },
    /// 当前会话阶段不允许该操作
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    /// 题目 ID 不在当前题目列表中
    UnknownQuestion { id: String },
    /// 选项下标超出范围
    InvalidOption { index: usize, max: usize },
    /// 会话已被重置，迟到的响应按会话版本丢弃
    StaleSession,
}

impl fmt::Display for ExamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamError::NoQuestions { reason } => write!(f, "题目列表不可用: {}", reason),
            ExamError::SubmissionFailed { message } => write!(f, "答卷提交失败: {}", message),
            ExamError::InvalidState { operation, state } => {
                write!(f, "当前阶段 {} 不允许操作 {}", state, operation)
            }
            ExamError::UnknownQuestion { id } => write!(f, "题目不存在: {}", id),
            ExamError::InvalidOption { index, max } => {
                write!(f, "选项下标 {} 超出范围 [0, {})", index, max)
            }
            ExamError::StaleSession => write!(f, "会话已重置，结果被丢弃"),
        }
    }
}

impl std::error::Error for ExamError {}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err.url().map(|u| u.to_string()).unwrap_or_default();
        AppError::Api(ApiError::Network {
            endpoint,
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建单字段校验错误
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation(ValidationError {
            fields: vec![FieldError::new(field, message)],
        })
    }

    /// 创建远端拒绝错误
    pub fn rejected(message: impl Into<String>) -> Self {
        AppError::Auth(AuthError::Rejected {
            message: message.into(),
        })
    }

    /// 创建服务端失败响应错误
    pub fn bad_response(
        endpoint: impl Into<String>,
        status: Option<u16>,
        message: Option<String>,
    ) -> Self {
        AppError::Api(ApiError::BadResponse {
            endpoint: endpoint.into(),
            status,
            message,
        })
    }

    /// 创建题目列表不可用错误
    pub fn no_questions(reason: impl Into<String>) -> Self {
        AppError::Exam(ExamError::NoQuestions {
            reason: reason.into(),
        })
    }

    /// 创建其他错误
    pub fn other(message: impl Into<String>) -> Self {
        AppError::Other(message.into())
    }

    /// 是否为会话过期（401），需要强制重新登录
    pub fn is_session_expired(&self) -> bool {
        matches!(self, AppError::Auth(AuthError::SessionExpired))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
