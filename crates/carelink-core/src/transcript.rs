//! Calendar-day grouping of a transcript for display.
//!
//! Labels are relative to the viewer's local date: "Today", "Yesterday", the
//! weekday name within the last week, otherwise `MM/DD/YYYY`.

use chrono::{FixedOffset, NaiveDate};

use carelink_proto::{Message, UserId};

/// Messages sent on one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup<'a> {
    /// Local calendar date.
    pub date: NaiveDate,
    /// Header label.
    pub label: String,
    /// Messages of that day, in transcript order.
    pub messages: Vec<&'a Message>,
}

/// Group `messages` by local calendar day.
///
/// Groups appear in the order their first message appears; messages keep
/// their transcript order within a group.
pub fn group_by_day<'a>(
    messages: &'a [Message],
    today: NaiveDate,
    offset: FixedOffset,
) -> Vec<DayGroup<'a>> {
    let mut groups: Vec<DayGroup<'a>> = Vec::new();
    for msg in messages {
        let date = msg.created_at.with_timezone(&offset).date_naive();
        match groups.iter_mut().find(|group| group.date == date) {
            Some(group) => group.messages.push(msg),
            None => {
                groups.push(DayGroup { date, label: day_label(date, today), messages: vec![msg] });
            },
        }
    }
    groups
}

/// Header label for `date` as seen on `today`.
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    match (today - date).num_days() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        ..=-1 | 2..=6 => date.format("%A").to_string(),
        _ => date.format("%m/%d/%Y").to_string(),
    }
}

/// `HH:MM` timestamp shown next to a message.
pub fn time_label(message: &Message, offset: FixedOffset) -> String {
    message.created_at.with_timezone(&offset).format("%H:%M").to_string()
}

/// Whether a message is rendered on the viewer's side.
pub fn is_own(message: &Message, viewer: &UserId) -> bool {
    message.is_from(viewer)
}
