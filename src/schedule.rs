//! Recurring-export schedule model.
//!
//! The queue/scheduler that actually fires jobs is an external collaborator;
//! this module only defines the persisted shape of a recurring export (what
//! to export, where to, how often) and the next-fire computation, so
//! embedders can store schedules and enqueue a [`crate::types::JobSpec`]
//! when one comes due.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Destination, SourceId};

/// How often a scheduled export recurs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFrequency {
    /// Every day
    Daily,
    /// Every seven days
    Weekly,
    /// Every calendar month
    Monthly,
}

impl fmt::Display for ExportFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFrequency::Daily => write!(f, "daily"),
            ExportFrequency::Weekly => write!(f, "weekly"),
            ExportFrequency::Monthly => write!(f, "monthly"),
        }
    }
}

/// A persisted recurring-export schedule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportSchedule {
    /// Unique name identifying this schedule in the external queue
    pub name: String,

    /// What to export when the schedule fires
    pub source_id: SourceId,

    /// Where each fired export goes
    pub destination: Destination,

    /// How often the export recurs
    pub frequency: ExportFrequency,
}

impl ExportSchedule {
    /// Compute the next fire time strictly after `after`.
    ///
    /// Monthly schedules follow the calendar (Jan 31 + 1 month = Feb 28/29);
    /// daily and weekly are fixed intervals.
    pub fn next_run_after(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        match self.frequency {
            ExportFrequency::Daily => after + chrono::Duration::days(1),
            ExportFrequency::Weekly => after + chrono::Duration::weeks(1),
            ExportFrequency::Monthly => after
                .checked_add_months(Months::new(1))
                .unwrap_or(after + chrono::Duration::days(30)),
        }
    }
}
