use crate::model::ids::SpecialtyId;

/// Why the session reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every planned question was answered, or the queue ran out. This
    /// includes a queue that was empty at start, which resolves as a failed
    /// zero-score run.
    Completed,
    /// The lives counter hit zero before the queue did.
    LivesExhausted,
}

/// Terminal result of a session, produced exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResult {
    pub final_score: i32,
    pub passed: bool,
    pub specialty_id: SpecialtyId,
    pub outcome: SessionOutcome,
}

impl SessionResult {
    /// Builds a result by comparing the final score against the threshold.
    ///
    /// A run that ends by exhausting lives always fails, whatever the score.
    #[must_use]
    pub fn from_score(
        final_score: i32,
        passing_score: i32,
        specialty_id: SpecialtyId,
        outcome: SessionOutcome,
    ) -> Self {
        let passed = match outcome {
            SessionOutcome::Completed => final_score >= passing_score,
            SessionOutcome::LivesExhausted => false,
        };
        Self {
            final_score,
            passed,
            specialty_id,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_at_threshold() {
        let result = SessionResult::from_score(
            600,
            600,
            SpecialtyId::new(4),
            SessionOutcome::Completed,
        );
        assert!(result.passed);
    }

    #[test]
    fn fails_below_threshold() {
        let result = SessionResult::from_score(
            599,
            600,
            SpecialtyId::new(4),
            SessionOutcome::Completed,
        );
        assert!(!result.passed);
    }

    #[test]
    fn lives_exhaustion_fails_even_above_threshold() {
        let result = SessionResult::from_score(
            1000,
            600,
            SpecialtyId::new(4),
            SessionOutcome::LivesExhausted,
        );
        assert!(!result.passed);
    }
}
