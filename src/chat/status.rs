#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Online,
    Thinking,
    Analyzing,
    Error,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Thinking => "Bella is thinking...",
            Self::Analyzing => "Bella is analyzing the image...",
            Self::Error => "Error communicating with Bella",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Idle,
    Busy,
    Error,
}

impl StatusKind {
    /// Classifies a free-form status line the same way the indicator styles it.
    pub fn classify(label: &str) -> Self {
        let lowered = label.to_lowercase();
        if lowered.contains("thinking") || lowered.contains("analyzing") {
            Self::Busy
        } else if lowered.contains("error") {
            Self::Error
        } else {
            Self::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Status, StatusKind};

    #[test]
    fn labels_classify_to_their_kind() {
        let kind = |status: Status| StatusKind::classify(status.label());
        assert_eq!(kind(Status::Online), StatusKind::Idle);
        assert_eq!(kind(Status::Thinking), StatusKind::Busy);
        assert_eq!(kind(Status::Analyzing), StatusKind::Busy);
        assert_eq!(kind(Status::Error), StatusKind::Error);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(StatusKind::classify("BELLA IS THINKING"), StatusKind::Busy);
        assert_eq!(StatusKind::classify("Network ERROR"), StatusKind::Error);
        assert_eq!(StatusKind::classify("Away"), StatusKind::Idle);
    }

    #[test]
    fn busy_wins_over_error_when_both_appear() {
        assert_eq!(
            StatusKind::classify("Bella is thinking about the last error"),
            StatusKind::Busy
        );
    }
}
