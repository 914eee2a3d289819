use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Duration the provider reports for items that have no real duration yet
/// (premieres, broken uploads). Always filtered out.
pub const ZERO_DURATION_SENTINEL: &str = "P0D";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveBroadcast {
    #[default]
    None,
    Live,
    Upcoming,
}

impl LiveBroadcast {
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("live") => Self::Live,
            Some("upcoming") => Self::Upcoming,
            _ => Self::None,
        }
    }
}

/// Pass-through video shape consumed and produced by the core. The core
/// filters and scores these; it never owns their persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub channel_title: String,
    pub channel_id: String,
    pub channel_thumbnail: Option<String>,
    pub subscriber_count: u64,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    /// Raw ISO-8601 duration as reported, e.g. "PT3M21S".
    pub duration: String,
    /// "H:MM:SS" / "MM:SS" rendering of `duration`.
    pub formatted_duration: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub live_broadcast: LiveBroadcast,
    pub is_live_content: bool,
    /// Row ID when the record was loaded back from the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_id: Option<i64>,
}

impl VideoRecord {
    pub fn duration_seconds(&self) -> u64 {
        formatted_duration_seconds(&self.formatted_duration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub channel_title: String,
    pub thumbnail: Option<String>,
    pub subscriber_count: u64,
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_id: Option<i64>,
}

/// Formats an ISO-8601 duration ("PT1H2M3S") as "1:02:03" / "02:03".
/// Anything unparseable (including the "P0D" sentinel) renders as "00:00".
pub fn format_duration(iso: &str) -> String {
    let (h, m, s) = iso_duration_parts(iso);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Total seconds of an ISO-8601 duration.
pub fn iso_duration_seconds(iso: &str) -> u64 {
    let (h, m, s) = iso_duration_parts(iso);
    h * 3600 + m * 60 + s
}

fn iso_duration_parts(iso: &str) -> (u64, u64, u64) {
    let Some(rest) = iso.strip_prefix("PT") else {
        return (0, 0, 0);
    };
    let (mut h, mut m, mut s) = (0u64, 0u64, 0u64);
    let mut number = String::new();
    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let value = number.parse::<u64>().unwrap_or(0);
        number.clear();
        match c {
            'H' => h = value,
            'M' => m = value,
            'S' => s = value,
            _ => return (0, 0, 0),
        }
    }
    (h, m, s)
}

/// Seconds represented by a "H:MM:SS" / "MM:SS" formatted duration.
pub fn formatted_duration_seconds(formatted: &str) -> u64 {
    let parts: Vec<u64> = formatted
        .split(':')
        .map(|p| p.parse::<u64>().unwrap_or(0))
        .collect();
    match parts.as_slice() {
        [h, m, s] => h * 3600 + m * 60 + s,
        [m, s] => m * 60 + s,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_duration("PT3M21S"), "03:21");
        assert_eq!(format_duration("PT45S"), "00:45");
    }

    #[test]
    fn formats_hours() {
        assert_eq!(format_duration("PT1H2M3S"), "1:02:03");
        assert_eq!(format_duration("PT2H"), "2:00:00");
    }

    #[test]
    fn zero_sentinel_formats_as_empty_clock() {
        assert_eq!(format_duration(ZERO_DURATION_SENTINEL), "00:00");
        assert_eq!(iso_duration_seconds(ZERO_DURATION_SENTINEL), 0);
    }

    #[test]
    fn iso_seconds() {
        assert_eq!(iso_duration_seconds("PT1M1S"), 61);
        assert_eq!(iso_duration_seconds("PT59S"), 59);
        assert_eq!(iso_duration_seconds("PT1H"), 3600);
    }

    #[test]
    fn formatted_seconds_roundtrip() {
        assert_eq!(formatted_duration_seconds("03:21"), 201);
        assert_eq!(formatted_duration_seconds("1:02:03"), 3723);
        assert_eq!(formatted_duration_seconds(""), 0);
    }

    #[test]
    fn live_broadcast_from_wire() {
        assert_eq!(LiveBroadcast::from_wire(Some("live")), LiveBroadcast::Live);
        assert_eq!(LiveBroadcast::from_wire(Some("upcoming")), LiveBroadcast::Upcoming);
        assert_eq!(LiveBroadcast::from_wire(Some("none")), LiveBroadcast::None);
        assert_eq!(LiveBroadcast::from_wire(None), LiveBroadcast::None);
    }
}
