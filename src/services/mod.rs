pub mod instructions;
pub mod navigator;
pub mod scoring;

pub use instructions::ExamBriefing;
pub use navigator::{AnswerSummary, TileState};
pub use scoring::{ScoringPolicy, ScoringService};
