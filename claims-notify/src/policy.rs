//! Reminder policy: which deadline tracks of a report are due in the current scan.
//!
//! Pure decision code, no I/O. Calendar days are taken in a single fixed
//! reference offset so that today/tomorrow windows and the de-duplication day
//! start always agree.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use claims_core::types::{DamageReport, NotificationType, ReportStatus};

/// Calendar-day boundaries around an instant, expressed in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub today_start: DateTime<Utc>,
    pub tomorrow_start: DateTime<Utc>,
    pub day_after_start: DateTime<Utc>,
}

impl DayWindow {
    pub fn containing(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local_date = now.with_timezone(&offset).date_naive();
        let local_midnight = local_date.and_time(NaiveTime::MIN);
        let today_start =
            (local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc();

        Self {
            today_start,
            tomorrow_start: today_start + Duration::days(1),
            day_after_start: today_start + Duration::days(2),
        }
    }

    pub fn classify(&self, deadline: DateTime<Utc>) -> Option<DueOn> {
        if deadline >= self.today_start && deadline < self.tomorrow_start {
            Some(DueOn::Today)
        } else if deadline >= self.tomorrow_start && deadline < self.day_after_start {
            Some(DueOn::Tomorrow)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueOn {
    Today,
    Tomorrow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub kind: NotificationType,
    pub due: DueOn,
    pub deadline: DateTime<Utc>,
}

impl DueReminder {
    pub fn is_today(&self) -> bool {
        self.due == DueOn::Today
    }
}

/// Evaluates the airbnb-submission and proof tracks independently; a report
/// may be due on both. Overdue deadlines yield nothing.
pub fn due_reminders(report: &DamageReport, window: &DayWindow) -> Vec<DueReminder> {
    let mut due = Vec::with_capacity(2);

    if !report.submitted_to_airbnb {
        if let Some(on) = window.classify(report.airbnb_deadline) {
            due.push(DueReminder {
                kind: NotificationType::DeadlineReminder,
                due: on,
                deadline: report.airbnb_deadline,
            });
        }
    }

    if report.status == ReportStatus::ProofRequired {
        if let Some(on) = window.classify(report.proof_deadline) {
            due.push(DueReminder {
                kind: NotificationType::ProofDeadlineReminder,
                due: on,
                deadline: report.proof_deadline,
            });
        }
    }

    due
}
