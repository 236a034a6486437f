use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::course::normalize_optional;
use crate::model::ids::WebinarId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WebinarError {
    #[error("webinar title cannot be empty")]
    EmptyTitle,

    #[error("webinar date and times are required")]
    MissingSchedule,

    #[error("webinar must end after it starts")]
    InvalidTimeRange,
}

/// A live session scheduled on a single day, times in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Webinar {
    pub id: WebinarId,
    pub title: String,
    pub description: Option<String>,
    pub host: Option<String>,
    pub scheduled_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Webinar {
    #[must_use]
    pub fn starts_at(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.start_time)
    }

    #[must_use]
    pub fn ends_at(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.end_time)
    }

    /// True while the webinar is running: same day, start <= now <= end.
    #[must_use]
    pub fn can_join_at(&self, now: DateTime<Utc>) -> bool {
        let now = now.naive_utc();
        now >= self.starts_at() && now <= self.ends_at()
    }

    /// Time left until the start, or `None` once it has started.
    #[must_use]
    pub fn countdown_at(&self, now: DateTime<Utc>) -> Option<Countdown> {
        let remaining = self.starts_at() - now.naive_utc();
        let secs = u64::try_from(remaining.num_seconds()).ok().filter(|s| *s > 0)?;
        Some(Countdown {
            hours: secs / 3600,
            minutes: (secs % 3600) / 60,
            seconds: secs % 60,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

/// A webinar the user signed up for, evaluated against a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledWebinar {
    #[serde(flatten)]
    pub webinar: Webinar,
    pub enrolled_at: DateTime<Utc>,
    pub can_join_now: bool,
    pub countdown: Option<Countdown>,
}

impl EnrolledWebinar {
    #[must_use]
    pub fn at(webinar: Webinar, enrolled_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let can_join_now = webinar.can_join_at(now);
        let countdown = webinar.countdown_at(now);
        Self {
            webinar,
            enrolled_at,
            can_join_now,
            countdown,
        }
    }
}

/// Unvalidated webinar input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebinarDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub host: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// Webinar input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWebinar {
    pub title: String,
    pub description: Option<String>,
    pub host: Option<String>,
    pub scheduled_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl WebinarDraft {
    /// # Errors
    ///
    /// Returns `WebinarError` for a blank title, a missing schedule, or an end
    /// time that is not after the start time.
    pub fn validate(self) -> Result<NewWebinar, WebinarError> {
        let title = self.title.unwrap_or_default().trim().to_owned();
        if title.is_empty() {
            return Err(WebinarError::EmptyTitle);
        }
        let (Some(scheduled_date), Some(start_time), Some(end_time)) =
            (self.scheduled_date, self.start_time, self.end_time)
        else {
            return Err(WebinarError::MissingSchedule);
        };
        if end_time <= start_time {
            return Err(WebinarError::InvalidTimeRange);
        }
        Ok(NewWebinar {
            title,
            description: normalize_optional(self.description),
            host: normalize_optional(self.host),
            scheduled_date,
            start_time,
            end_time,
        })
    }
}
