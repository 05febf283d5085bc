//! Due-date urgency for obligations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Obligations due within this many days are flagged as due soon.
pub const DUE_SOON_DAYS: i64 = 7;
/// Obligations due within this many days are flagged as upcoming.
pub const UPCOMING_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Overdue,
    DueSoon,
    Upcoming,
    Scheduled,
}

/// Label and urgency band for an obligation's due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDisplay {
    pub label: String,
    pub urgency: Urgency,
}

impl DueDisplay {
    /// `None` when the obligation has no due date.
    pub fn for_due_date(due: Option<NaiveDate>, today: NaiveDate) -> Option<Self> {
        let due = due?;
        let days = (due - today).num_days();
        let (label, urgency) = if days < 0 {
            (format!("Overdue by {}d", -days), Urgency::Overdue)
        } else if days <= DUE_SOON_DAYS {
            let unit = if days == 1 { "day" } else { "days" };
            (format!("Due in {days} {unit}"), Urgency::DueSoon)
        } else if days <= UPCOMING_DAYS {
            (format!("Due in {days} days"), Urgency::Upcoming)
        } else {
            (due.format("%b %-d, %Y").to_string(), Urgency::Scheduled)
        };
        Some(Self { label, urgency })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn bands() {
        let today = d(2025, 6, 10);
        let show = |due| DueDisplay::for_due_date(Some(due), today).unwrap();

        assert_eq!(show(d(2025, 6, 7)), DueDisplay { label: "Overdue by 3d".into(), urgency: Urgency::Overdue });
        assert_eq!(show(d(2025, 6, 10)).label, "Due in 0 days");
        assert_eq!(show(d(2025, 6, 11)).label, "Due in 1 day");
        assert_eq!(show(d(2025, 6, 17)).urgency, Urgency::DueSoon);
        assert_eq!(show(d(2025, 6, 18)), DueDisplay { label: "Due in 8 days".into(), urgency: Urgency::Upcoming });
        assert_eq!(show(d(2025, 7, 10)).urgency, Urgency::Upcoming);
        assert_eq!(show(d(2025, 9, 3)), DueDisplay { label: "Sep 3, 2025".into(), urgency: Urgency::Scheduled });
    }

    #[test]
    fn undated_has_no_display() {
        assert!(DueDisplay::for_due_date(None, d(2025, 1, 1)).is_none());
    }
}
