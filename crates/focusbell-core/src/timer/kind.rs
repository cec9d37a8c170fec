use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Work,
    Break,
    LongBreak,
}

impl SessionKind {
    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Work => "Work",
            SessionKind::Break => "Break",
            SessionKind::LongBreak => "Long Break",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, SessionKind::Work)
    }

    /// Kind entered after a work session completes.
    ///
    /// `completed_work` already includes the session that just finished.
    /// A frequency of 0 is treated as 1.
    pub fn after_work(completed_work: u32, long_break_frequency: u32) -> SessionKind {
        if completed_work % long_break_frequency.max(1) == 0 {
            SessionKind::LongBreak
        } else {
            SessionKind::Break
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_fourth_completion_is_a_long_break() {
        let kinds: Vec<_> = (1..=8).map(|n| SessionKind::after_work(n, 4)).collect();
        assert_eq!(
            kinds,
            vec![
                SessionKind::Break,
                SessionKind::Break,
                SessionKind::Break,
                SessionKind::LongBreak,
                SessionKind::Break,
                SessionKind::Break,
                SessionKind::Break,
                SessionKind::LongBreak,
            ]
        );
    }

    #[test]
    fn frequency_one_always_long_break() {
        for n in 1..5 {
            assert_eq!(SessionKind::after_work(n, 1), SessionKind::LongBreak);
        }
    }

    #[test]
    fn frequency_zero_does_not_panic() {
        assert_eq!(SessionKind::after_work(3, 0), SessionKind::LongBreak);
    }
}
