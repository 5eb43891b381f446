// Stay record filtering for the front-desk lists
use chrono::NaiveDate;

use crate::api::{StayRecord, StayStatus};

#[derive(Debug, Clone, Default)]
pub struct StayFilter {
    // Inclusive date range; a stay matches when any of its days falls inside
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub statuses: Option<Vec<StayStatus>>,
    pub room_number: Option<String>,
    // Case-insensitive substring of the guest name
    pub guest_name_contains: Option<String>,
}

impl StayFilter {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &StayRecord) -> bool {
        // Records with inverted dates are kept visible so staff can fix them
        let in_range = match record.period() {
            Ok(period) => period.overlaps(self.from, self.to),
            Err(_) => true,
        };
        if !in_range {
            return false;
        }

        if !self
            .statuses
            .as_ref()
            .map_or(true, |statuses| statuses.contains(&record.status))
        {
            return false;
        }

        if !self
            .room_number
            .as_ref()
            .map_or(true, |room| record.room_number.eq_ignore_ascii_case(room.trim()))
        {
            return false;
        }

        self.guest_name_contains.as_ref().map_or(true, |needle| {
            record
                .guest_name
                .to_lowercase()
                .contains(&needle.trim().to_lowercase())
        })
    }

    pub fn apply<'a>(&self, records: &'a [StayRecord]) -> Vec<&'a StayRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

// Stays checking out on the given day, used for the departures list
pub fn departures_on(records: &[StayRecord], day: NaiveDate) -> Vec<&StayRecord> {
    records
        .iter()
        .filter(|r| r.check_out_date == day && r.status == StayStatus::CheckedIn)
        .collect()
}
