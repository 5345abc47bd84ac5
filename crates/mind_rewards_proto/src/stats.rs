use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Headroom left today in the capped categories. `None` means no cap is
/// configured for that category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemainingCaps {
    pub steps: Option<Decimal>,
    pub subs: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub steps_mind: u64,
    pub books_mind: u64,
    pub courses_mind: u64,
    pub subs_mind: u64,
    pub remaining_caps: RemainingCaps,
}
