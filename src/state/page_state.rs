/// Page state definitions for tracking crawl progress
///
/// ```text
/// Queued ──> Fetching ──> Analyzed | Failed | Discarded
///    └─────> Skipped
/// ```
use crate::AuditError;
use serde::Serialize;
use std::fmt;

/// Represents the current state of a URL within one crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    // ===== Active States =====
    /// Claimed from the frontier, waiting for a fetch slot
    Queued,

    /// Request in flight
    Fetching,

    // ===== Terminal States =====
    /// Fetched and handed to the analyzer; the page result may still carry
    /// an analysis error
    Analyzed,

    /// Fetch failed (timeout, network error or non-2xx status)
    Failed,

    /// Fetched but not HTML while only HTML pages are wanted
    Discarded,

    /// Rejected before fetching (depth, robots.txt, options)
    Skipped,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Fetching)
    }

    /// Returns true if the URL consumed one of the job's `maxUrls` slots
    pub fn consumed_slot(&self) -> bool {
        matches!(
            self,
            Self::Fetching | Self::Analyzed | Self::Failed | Self::Discarded
        )
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Fetching)
                | (Self::Queued, Self::Skipped)
                | (Self::Fetching, Self::Analyzed)
                | (Self::Fetching, Self::Failed)
                | (Self::Fetching, Self::Discarded)
        )
    }

    /// Moves to `next`, rejecting transitions the state machine forbids
    pub fn transition(self, next: PageState) -> Result<PageState, AuditError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AuditError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Short lowercase label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Analyzed => "analyzed",
            Self::Failed => "failed",
            Self::Discarded => "discarded",
            Self::Skipped => "skipped",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> [Self; 6] {
        [
            Self::Queued,
            Self::Fetching,
            Self::Analyzed,
            Self::Failed,
            Self::Discarded,
            Self::Skipped,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!PageState::Queued.is_terminal());
        assert!(!PageState::Fetching.is_terminal());

        assert!(PageState::Analyzed.is_terminal());
        assert!(PageState::Failed.is_terminal());
        assert!(PageState::Discarded.is_terminal());
        assert!(PageState::Skipped.is_terminal());
    }

    #[test]
    fn test_consumed_slot() {
        assert!(!PageState::Queued.consumed_slot());
        assert!(!PageState::Skipped.consumed_slot());
        assert!(PageState::Fetching.consumed_slot());
        assert!(PageState::Analyzed.consumed_slot());
        assert!(PageState::Failed.consumed_slot());
        assert!(PageState::Discarded.consumed_slot());
    }

    #[test]
    fn test_valid_transitions() {
        assert_eq!(
            PageState::Queued.transition(PageState::Fetching).unwrap(),
            PageState::Fetching
        );
        assert_eq!(
            PageState::Fetching.transition(PageState::Analyzed).unwrap(),
            PageState::Analyzed
        );
        assert!(PageState::Fetching.can_transition_to(PageState::Failed));
        assert!(PageState::Fetching.can_transition_to(PageState::Discarded));
        assert!(PageState::Queued.can_transition_to(PageState::Skipped));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in PageState::all_states().into_iter().filter(|s| s.is_terminal()) {
            for to in PageState::all_states() {
                assert!(
                    !from.can_transition_to(to),
                    "{} -> {} should be rejected",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = PageState::Queued
            .transition(PageState::Analyzed)
            .unwrap_err();
        assert!(matches!(
            err,
            AuditError::InvalidTransition {
                from: PageState::Queued,
                to: PageState::Analyzed
            }
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(PageState::Queued.to_string(), "queued");
        assert_eq!(PageState::Discarded.to_string(), "discarded");
    }
}
