use chrono::{DateTime, Duration, Months, Utc};

use crate::core::models::video::{LiveBroadcast, VideoRecord, ZERO_DURATION_SENTINEL};

/// Videos under this length are treated as Shorts.
pub const SHORTS_MAX_SECONDS: u64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    All,
    Regular,
    Shorts,
}

impl ContentType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "regular" | "long" => Some(Self::Regular),
            "shorts" | "short" => Some(Self::Shorts),
            _ => None,
        }
    }
}

/// Subscriber-count buckets, matching the dashboard's preset ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriberBucket {
    #[default]
    All,
    Under5k,
    Over10k,
    Over50k,
    Over100k,
    Over1m,
}

impl SubscriberBucket {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "u5k" => Some(Self::Under5k),
            "o10k" => Some(Self::Over10k),
            "o50k" => Some(Self::Over50k),
            "o100k" => Some(Self::Over100k),
            "o1m" => Some(Self::Over1m),
            _ => None,
        }
    }

    fn matches(&self, subscribers: u64) -> bool {
        match self {
            Self::All => true,
            Self::Under5k => subscribers < 5_000,
            Self::Over10k => subscribers >= 10_000,
            Self::Over50k => subscribers >= 50_000,
            Self::Over100k => subscribers >= 100_000,
            Self::Over1m => subscribers >= 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewBucket {
    #[default]
    All,
    Under10k,
    Over10k,
    Over100k,
    Over500k,
    Over1m,
}

impl ViewBucket {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "u10k" => Some(Self::Under10k),
            "o10k" => Some(Self::Over10k),
            "o100k" => Some(Self::Over100k),
            "o500k" => Some(Self::Over500k),
            "o1m" => Some(Self::Over1m),
            _ => None,
        }
    }

    fn matches(&self, views: u64) -> bool {
        match self {
            Self::All => true,
            Self::Under10k => views < 10_000,
            Self::Over10k => views >= 10_000,
            Self::Over100k => views >= 100_000,
            Self::Over500k => views >= 500_000,
            Self::Over1m => views >= 1_000_000,
        }
    }

    /// High-views buckets switch the provider search ordering to viewCount.
    pub fn prefers_view_order(&self) -> bool {
        matches!(self, Self::Over10k | Self::Over100k | Self::Over500k | Self::Over1m)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateWindow {
    #[default]
    All,
    Day,
    ThreeDays,
    Month,
    SixMonths,
}

impl DateWindow {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "1d" => Some(Self::Day),
            "3d" => Some(Self::ThreeDays),
            "1m" => Some(Self::Month),
            "6m" => Some(Self::SixMonths),
            _ => None,
        }
    }

    /// Lower publish-time bound for the window. Month windows move by
    /// calendar months, not fixed day counts.
    pub fn published_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::All => None,
            Self::Day => Some(now - Duration::days(1)),
            Self::ThreeDays => Some(now - Duration::days(3)),
            Self::Month => now.checked_sub_months(Months::new(1)),
            Self::SixMonths => now.checked_sub_months(Months::new(6)),
        }
    }
}

/// Post-fetch result filters. All predicates are pure; applying the same
/// filters twice yields the same set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultFilters {
    pub content_type: ContentType,
    pub subscribers: SubscriberBucket,
    pub views: ViewBucket,
    pub date: DateWindow,
}

impl ResultFilters {
    pub fn is_pass_through(&self) -> bool {
        self.content_type == ContentType::All
            && self.subscribers == SubscriberBucket::All
            && self.views == ViewBucket::All
            && self.date == DateWindow::All
    }

    /// Applies all filters. Live broadcasts and zero-duration placeholders
    /// are dropped regardless of the configured filters.
    pub fn apply(&self, videos: Vec<VideoRecord>, now: DateTime<Utc>) -> Vec<VideoRecord> {
        let after = self.date.published_after(now);
        videos
            .into_iter()
            .filter(|v| self.keeps(v, after))
            .collect()
    }

    fn keeps(&self, video: &VideoRecord, after: Option<DateTime<Utc>>) -> bool {
        if video.live_broadcast != LiveBroadcast::None || video.is_live_content {
            return false;
        }
        if video.duration == ZERO_DURATION_SENTINEL {
            return false;
        }
        let seconds = video.duration_seconds();
        let is_short = seconds < SHORTS_MAX_SECONDS;
        match self.content_type {
            ContentType::All => {}
            ContentType::Regular if is_short => return false,
            ContentType::Shorts if !is_short => return false,
            _ => {}
        }
        if !self.subscribers.matches(video.subscriber_count) {
            return false;
        }
        if !self.views.matches(video.view_count) {
            return false;
        }
        if let Some(after) = after {
            match video.published_at {
                Some(published) if published >= after => {}
                _ => return false,
            }
        }
        true
    }
}
