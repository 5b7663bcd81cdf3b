use chrono::{Duration, NaiveDateTime, Utc};

/// Wire format for every timestamp the API emits.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Wall clock for the deployment's local zone; stored timestamps carry no offset.
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    offset_hours: i32,
}

impl LocalClock {
    /// Returns `None` when the offset is outside +/-23 hours.
    pub fn from_hours(offset_hours: i32) -> Option<Self> {
        (-23..=23)
            .contains(&offset_hours)
            .then_some(Self { offset_hours })
    }

    pub fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + Duration::hours(i64::from(self.offset_hours))
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        Self { offset_hours: 8 }
    }
}
