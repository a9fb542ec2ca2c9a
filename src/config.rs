use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::calendar;
use crate::error::ConfigError;

/// Time settings resolved once per run: the user's offset and the local day
/// all evaluation happens against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub offset: FixedOffset,
    pub today: NaiveDate,
}

impl Settings {
    pub fn resolve(
        utc_offset_minutes: i32,
        today_override: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::OffsetOutOfRange(utc_offset_minutes))?;
        let today = today_override.unwrap_or_else(|| calendar::local_today(now, offset));
        Ok(Self { offset, today })
    }
}
