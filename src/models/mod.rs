pub mod answer;
pub mod question;
pub mod result;
pub mod user;

pub use answer::{Answer, SubmitEntry};
pub use question::{ExamPaper, Question, QuestionOption};
pub use result::ExamResult;
pub use user::{ProfileDraft, ProfileImage, UserProfile};
