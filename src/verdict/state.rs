use crate::classifier::ClassificationResult;

/// Presentation state owned by the verdict controller
///
/// `loading` is an overlay: while it is set, whatever result or error was
/// visible before stays in place underneath.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerdictState {
    pub loading: bool,
    pub result: Option<ClassificationResult>,
    pub error: Option<String>,
}

/// Which of the controller's states the flags describe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Requesting,
    Succeeded,
    Failed,
}

impl VerdictState {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Requesting
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.result.is_some() {
            Phase::Succeeded
        } else {
            Phase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Label;

    fn result() -> ClassificationResult {
        ClassificationResult {
            status: "ok".into(),
            label: Label::FreshClean,
            confidence: "97%".into(),
            verdict: "Squeaky Clean".into(),
        }
    }

    #[test]
    fn phase_follows_flags() {
        let mut state = VerdictState::default();
        assert_eq!(state.phase(), Phase::Idle);

        state.result = Some(result());
        assert_eq!(state.phase(), Phase::Succeeded);

        state.error = Some("nope".into());
        assert_eq!(state.phase(), Phase::Failed);

        // loading wins over anything rendered underneath
        state.loading = true;
        assert_eq!(state.phase(), Phase::Requesting);
    }
}
