//! Action catalogue and the daily counter categories it maps onto.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const ACTION_STEPS: &str = "steps";
pub const ACTION_BOOK_COMPLETION: &str = "book_completion";
pub const ACTION_COURSE_COMPLETION_BASIC: &str = "course_completion_basic";
pub const ACTION_COURSE_COMPLETION_INTERMEDIATE: &str = "course_completion_intermediate";
pub const ACTION_COURSE_COMPLETION_ADVANCED: &str = "course_completion_advanced";
pub const ACTION_PARTNER_SUBSCRIPTION: &str = "partner_subscription";
pub const ACTION_REFERRAL_BONUS: &str = "referral_bonus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    Basic,
    Intermediate,
    Advanced,
}

/// A user action that may be rewarded.
///
/// Known ids get their own variant so that the category table below stays an
/// exhaustive match; anything else is carried verbatim in `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Steps,
    BookCompletion,
    CourseCompletion(CourseLevel),
    PartnerSubscription,
    ReferralBonus,
    Custom(String),
}

impl ActionKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            ACTION_STEPS => ActionKind::Steps,
            ACTION_BOOK_COMPLETION => ActionKind::BookCompletion,
            ACTION_COURSE_COMPLETION_BASIC => ActionKind::CourseCompletion(CourseLevel::Basic),
            ACTION_COURSE_COMPLETION_INTERMEDIATE => {
                ActionKind::CourseCompletion(CourseLevel::Intermediate)
            }
            ACTION_COURSE_COMPLETION_ADVANCED => {
                ActionKind::CourseCompletion(CourseLevel::Advanced)
            }
            ACTION_PARTNER_SUBSCRIPTION => ActionKind::PartnerSubscription,
            ACTION_REFERRAL_BONUS => ActionKind::ReferralBonus,
            other => ActionKind::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Steps => ACTION_STEPS,
            ActionKind::BookCompletion => ACTION_BOOK_COMPLETION,
            ActionKind::CourseCompletion(CourseLevel::Basic) => ACTION_COURSE_COMPLETION_BASIC,
            ActionKind::CourseCompletion(CourseLevel::Intermediate) => {
                ACTION_COURSE_COMPLETION_INTERMEDIATE
            }
            ActionKind::CourseCompletion(CourseLevel::Advanced) => {
                ACTION_COURSE_COMPLETION_ADVANCED
            }
            ActionKind::PartnerSubscription => ACTION_PARTNER_SUBSCRIPTION,
            ActionKind::ReferralBonus => ACTION_REFERRAL_BONUS,
            ActionKind::Custom(raw) => raw.as_str(),
        }
    }

    /// Daily counter bucket for this action. `None` means the action is not
    /// tracked: it reads as zero accumulated and increments nothing.
    pub fn category(&self) -> Option<CounterCategory> {
        match self {
            ActionKind::Steps => Some(CounterCategory::Steps),
            ActionKind::BookCompletion => Some(CounterCategory::Books),
            ActionKind::CourseCompletion(_) => Some(CounterCategory::Courses),
            ActionKind::PartnerSubscription | ActionKind::ReferralBonus => {
                Some(CounterCategory::Subscriptions)
            }
            ActionKind::Custom(_) => None,
        }
    }
}

impl From<&str> for ActionKind {
    fn from(raw: &str) -> Self {
        ActionKind::parse(raw)
    }
}

impl From<String> for ActionKind {
    fn from(raw: String) -> Self {
        ActionKind::parse(raw.as_str())
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-day reward buckets stored on a `DailyCounter` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterCategory {
    Steps,
    Books,
    Courses,
    Subscriptions,
}

impl CounterCategory {
    pub const ALL: [CounterCategory; 4] = [
        CounterCategory::Steps,
        CounterCategory::Books,
        CounterCategory::Courses,
        CounterCategory::Subscriptions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CounterCategory::Steps => "steps",
            CounterCategory::Books => "books",
            CounterCategory::Courses => "courses",
            CounterCategory::Subscriptions => "subs",
        }
    }
}

impl fmt::Display for CounterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
