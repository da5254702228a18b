//! Agenda projection: the meetings of one calendar day.

use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::format::{duration_minutes, format_time_range, is_same_day};
use crate::models::Meeting;

/// One line of the agenda list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgendaItem {
    pub title: String,
    pub link: Option<String>,
    pub time_range: String,
    pub duration_minutes: i64,
}

impl AgendaItem {
    fn from_meeting<Tz: TimeZone>(meeting: &Meeting, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            title: meeting.title.clone(),
            link: meeting.join_link.clone(),
            time_range: format_time_range(&meeting.start, &meeting.end, tz),
            duration_minutes: duration_minutes(&meeting.start, &meeting.end),
        }
    }
}

/// Agenda for `date` in the machine's local time zone.
pub fn agenda_for(meetings: &[Meeting], date: NaiveDate) -> Vec<AgendaItem> {
    agenda_for_in(meetings, date, &Local)
}

/// Agenda for `date`, comparing start dates by year/month/day in `tz`.
/// Input order is preserved.
pub fn agenda_for_in<Tz: TimeZone>(
    meetings: &[Meeting],
    date: NaiveDate,
    tz: &Tz,
) -> Vec<AgendaItem>
where
    Tz::Offset: std::fmt::Display,
{
    meetings
        .iter()
        .filter(|m| is_same_day(&m.start.with_timezone(tz), date))
        .map(|m| AgendaItem::from_meeting(m, tz))
        .collect()
}
