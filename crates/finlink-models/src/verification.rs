//! Verification checks, scoring, and the profile badge.

use serde::{Deserialize, Serialize};

/// Status of a single verification check. Set by admins or the
/// verification provider, only ever displayed by this code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    NotStarted,
    Pending,
    Verified,
    Declined,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::NotStarted => "not_started",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Declined => "declined",
        }
    }

    /// Whether this check counts toward the score.
    pub fn is_achieved(&self) -> bool {
        matches!(self, VerificationStatus::Verified)
    }
}

/// The four checks a worker profile goes through.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VerificationChecks {
    #[serde(default)]
    pub identity: VerificationStatus,
    #[serde(default)]
    pub qualifications: VerificationStatus,
    #[serde(default)]
    pub employment_history: VerificationStatus,
    #[serde(default)]
    pub references: VerificationStatus,
}

impl VerificationChecks {
    fn achieved(&self) -> u32 {
        [
            self.identity,
            self.qualifications,
            self.employment_history,
            self.references,
        ]
        .iter()
        .filter(|s| s.is_achieved())
        .count() as u32
    }
}

/// Verification score as a whole percentage, rounded to nearest.
pub fn score_percent(checks: &VerificationChecks) -> u8 {
    let achieved = checks.achieved();
    ((achieved * 100 + 2) / 4) as u8
}

/// Overall admin approval of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Declined,
}

/// Badge shown next to the verification score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationBadge {
    AwaitingReview,
    Verified,
    Declined,
}

impl VerificationBadge {
    /// Three-way switch on the approval status. The score never enters
    /// into it: a declined profile shows the decline hint at 100%.
    pub fn from_approval(approval: ApprovalStatus) -> Self {
        match approval {
            ApprovalStatus::Pending => VerificationBadge::AwaitingReview,
            ApprovalStatus::Approved => VerificationBadge::Verified,
            ApprovalStatus::Declined => VerificationBadge::Declined,
        }
    }

    /// Hint line rendered under the badge.
    pub fn hint(&self) -> &'static str {
        match self {
            VerificationBadge::AwaitingReview => "Your profile is awaiting admin review",
            VerificationBadge::Verified => "Your profile is verified",
            VerificationBadge::Declined => "Your verification was declined",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checks(n: usize) -> VerificationChecks {
        let v = |i| {
            if i < n {
                VerificationStatus::Verified
            } else {
                VerificationStatus::NotStarted
            }
        };
        VerificationChecks {
            identity: v(0),
            qualifications: v(1),
            employment_history: v(2),
            references: v(3),
        }
    }

    #[test]
    fn test_score_all_achieved_is_100() {
        assert_eq!(score_percent(&checks(4)), 100);
    }

    #[test]
    fn test_score_none_achieved_is_0() {
        assert_eq!(score_percent(&checks(0)), 0);
    }

    #[test]
    fn test_score_partial_rounds_to_whole() {
        assert_eq!(score_percent(&checks(1)), 25);
        assert_eq!(score_percent(&checks(2)), 50);
        assert_eq!(score_percent(&checks(3)), 75);
    }

    #[test]
    fn test_pending_and_declined_do_not_score() {
        let c = VerificationChecks {
            identity: VerificationStatus::Pending,
            qualifications: VerificationStatus::Declined,
            employment_history: VerificationStatus::NotStarted,
            references: VerificationStatus::Verified,
        };
        assert_eq!(score_percent(&c), 25);
    }

    #[test]
    fn test_badge_pending_awaits_review_even_at_full_score() {
        // Profile at 100% with approval still pending shows the review hint.
        assert_eq!(score_percent(&checks(4)), 100);
        let badge = VerificationBadge::from_approval(ApprovalStatus::Pending);
        assert_eq!(badge, VerificationBadge::AwaitingReview);
        assert_eq!(badge.hint(), "Your profile is awaiting admin review");
    }

    #[test]
    fn test_badge_declined_regardless_of_score() {
        let badge = VerificationBadge::from_approval(ApprovalStatus::Declined);
        assert_eq!(badge, VerificationBadge::Declined);
        assert_eq!(badge.hint(), "Your verification was declined");
    }
}
