use serde::Serialize;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub current_index: usize,
    pub total_questions: usize,
    pub score: i32,
    pub remaining: usize,
    pub is_terminated: bool,
}
