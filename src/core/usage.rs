//! Client-side daily message budget

use chrono::NaiveDate;

pub const DEFAULT_DAILY_LIMIT: u32 = 30;

/// Number of user-initiated exchanges on one calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyUsage {
    day: NaiveDate,
    count: u32,
    limit: u32,
}

impl DailyUsage {
    pub fn new(limit: u32, today: NaiveDate) -> Self {
        Self {
            day: today,
            count: 0,
            limit,
        }
    }

    /// Count for `today`; a previous day's count no longer applies
    pub fn count_on(&self, today: NaiveDate) -> u32 {
        if today == self.day {
            self.count
        } else {
            0
        }
    }

    pub fn is_exhausted(&self, today: NaiveDate) -> bool {
        self.count_on(today) >= self.limit
    }

    /// Count one exchange and return the new total for `today`
    pub fn record(&mut self, today: NaiveDate) -> u32 {
        if today != self.day {
            self.day = today;
            self.count = 0;
        }
        self.count += 1;
        self.count
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}
