use chrono::{DateTime, Local, Utc};
use colored::{control, ColoredString, Colorize};

use crate::core::models::keyword::{KeywordCandidate, KeywordKind};
use crate::core::models::video::{ChannelRecord, VideoRecord};
use crate::core::orchestrator::OpReport;
use crate::core::quota::{QuotaLedger, RotationPolicy};

const BAR_WIDTH: usize = 12;

/// "1.2K" / "3.4M" style counts for table cells.
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        format!("{}", count)
    }
}

/// "2026.08.21" in local time, or "-" when unknown.
pub fn format_date(published_at: Option<DateTime<Utc>>) -> String {
    match published_at {
        Some(dt) => dt.with_timezone(&Local).format("%Y.%m.%d").to_string(),
        None => "-".to_string(),
    }
}

/// "[████████░░░░]" where █ = remaining quota, ░ = spent.
fn format_quota_bar(used: u64, limit: u64, width: usize) -> String {
    let used_fraction = if limit == 0 {
        1.0
    } else {
        (used as f64 / limit as f64).clamp(0.0, 1.0)
    };
    let used_blocks = (used_fraction * width as f64).round() as usize;
    let remaining_blocks = width.saturating_sub(used_blocks);
    format!("[{}{}]", "█".repeat(remaining_blocks), "░".repeat(used_blocks))
}

fn color_by_usage(used: u64, threshold: u64, text: &str) -> ColoredString {
    if used >= threshold {
        text.red()
    } else if used * 4 >= threshold * 3 {
        text.yellow()
    } else {
        text.green()
    }
}

/// Full ledger block:
/// ```text
///  API quota (2026-08-21)
///   Key 1 *  8100 / 10000 used [██░░░░░░░░░░]
///   Key 2      0 / 10000 used [████████████]
/// ```
/// The `*` marks the active key.
pub fn render_ledger(ledger: &QuotaLedger, policy: &RotationPolicy, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(" API quota ({})", ledger.date).bold().to_string());

    let threshold = policy.threshold_points();
    for (i, key) in ledger.keys.iter().enumerate() {
        let marker = if i == ledger.current_index { "*" } else { " " };
        let usage = format!("{:>5} / {} used", key.used, policy.daily_limit);
        let colored_usage = color_by_usage(key.used, threshold, &usage);
        let bar = format_quota_bar(key.used, policy.daily_limit, BAR_WIDTH).magenta();
        lines.push(format!(
            "  {} {} {} {}",
            format!("Key {}", i + 1).cyan(),
            marker,
            colored_usage,
            bar
        ));
    }
    lines.join("\n")
}

/// One video row per line, compact:
/// ```text
///  1. Never Gonna Give You Up
///     Rick Astley | 1.6B views | 2.3M subs | 03:33 | 2009.10.25
/// ```
pub fn render_videos(videos: &[VideoRecord], use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();
    for (i, video) in videos.iter().enumerate() {
        lines.push(format!(" {:>2}. {}", i + 1, video.title.bold()));
        lines.push(format!(
            "     {} | {} views | {} subs | {} | {}",
            video.channel_title.cyan(),
            format_count(video.view_count),
            format_count(video.subscriber_count),
            video.formatted_duration,
            format_date(video.published_at).dimmed()
        ));
    }
    lines.join("\n")
}

pub fn render_channel(channel: &ChannelRecord, use_color: bool) -> String {
    control::set_override(use_color);
    format!(
        " {} | {} subs | {}",
        channel.channel_title.bold(),
        format_count(channel.subscriber_count),
        channel.channel_id.dimmed()
    )
}

fn kind_label(kind: KeywordKind, use_color: bool) -> String {
    control::set_override(use_color);
    let text = kind.as_str();
    let colored: ColoredString = match kind {
        KeywordKind::Hot => text.red(),
        KeywordKind::Potential => text.yellow(),
        KeywordKind::Weak => text.dimmed(),
        KeywordKind::Shorttail | KeywordKind::Longtail => text.blue(),
        KeywordKind::Unknown => text.normal(),
    };
    colored.to_string()
}

/// Keyword table with whatever metrics each candidate carries.
pub fn render_keywords(candidates: &[KeywordCandidate], use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let mut parts: Vec<String> = Vec::new();
        if let Some(source) = candidate.primary_source() {
            parts.push(source.as_str().to_string());
        }
        if let Some(frequency) = candidate.frequency {
            parts.push(format!("x{}", frequency));
        }
        if candidate.kind != KeywordKind::Unknown {
            parts.push(kind_label(candidate.kind, use_color));
        }
        if let (Some(hits), Some(total)) = (candidate.hit_videos, candidate.total_searched) {
            let rate = candidate.hit_rate.unwrap_or(0);
            parts.push(format!("{}/{} hits ({}%)", hits, total, rate));
        }
        if let Some(count) = candidate.hashtag_count {
            parts.push(format!("#{}", format_count(count)));
        }
        if let Some(trend) = &candidate.trend {
            parts.push(trend.clone());
        }
        lines.push(format!(
            " {:>2}. {:<30} {}",
            i + 1,
            candidate.keyword.bold(),
            parts.join(" | ").dimmed()
        ));
        for hit in candidate.hit_video_list.iter().take(3) {
            lines.push(format!(
                "       {} ({} views, {})",
                hit.title,
                format_count(hit.view_count),
                hit.channel_title
            ));
        }
        if !candidate.related_keywords.is_empty() {
            lines.push(format!(
                "       related: {}",
                candidate.related_keywords.join(", ").dimmed()
            ));
        }
    }
    lines.join("\n")
}

/// Per-operation quota footnote printed to stderr in text mode.
pub fn render_report(report: &OpReport) -> String {
    let mut parts = vec![format!("quota spent: {}", report.cost)];
    if let Some(index) = report.rotated_to {
        parts.push(format!("switched to key {}", index + 1));
    }
    if report.exhausted {
        parts.push("all keys at threshold".to_string());
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::keyword::KeywordSource;
    use crate::core::models::video::LiveBroadcast;
    use crate::core::quota::ledger::KeyUsage;
    use chrono::TimeZone;

    fn video() -> VideoRecord {
        VideoRecord {
            id: "vid00000001".to_string(),
            title: "Budget Headphones".to_string(),
            description: String::new(),
            thumbnail: None,
            published_at: Some(Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap()),
            channel_title: "AudioLab".to_string(),
            channel_id: "UCaaaaaaaaaaaaaaaaaaaaaa".to_string(),
            channel_thumbnail: None,
            subscriber_count: 42_000,
            view_count: 1_234_567,
            like_count: 0,
            comment_count: 0,
            duration: "PT3M33S".to_string(),
            formatted_duration: "03:33".to_string(),
            tags: Vec::new(),
            category: None,
            live_broadcast: LiveBroadcast::None,
            is_live_content: false,
            db_id: None,
        }
    }

    #[test]
    fn count_formatting() {
        assert_eq!(format_count(532), "532");
        assert_eq!(format_count(1_234), "1.2K");
        assert_eq!(format_count(3_400_000), "3.4M");
    }

    #[test]
    fn video_rows_contain_core_fields() {
        let output = render_videos(&[video()], false);
        assert!(output.contains("Budget Headphones"));
        assert!(output.contains("AudioLab"));
        assert!(output.contains("1.2M views"));
        assert!(output.contains("42.0K subs"));
        assert!(output.contains("03:33"));
        assert!(!output.contains('\x1b'), "no ANSI codes without color");
    }

    #[test]
    fn ledger_marks_active_key() {
        let ledger = QuotaLedger {
            date: "2026-08-21".to_string(),
            current_index: 1,
            keys: vec![KeyUsage { used: 8_100 }, KeyUsage { used: 0 }],
        };
        let policy = RotationPolicy::new(10_000, 0.8);
        let output = render_ledger(&ledger, &policy, false);
        assert!(output.contains("Key 1"));
        assert!(output.contains("Key 2 *"));
        assert!(output.contains("8100 / 10000 used"));
    }

    #[test]
    fn quota_bar_extremes() {
        assert_eq!(format_quota_bar(0, 10_000, 4), "[████]");
        assert_eq!(format_quota_bar(10_000, 10_000, 4), "[░░░░]");
        assert_eq!(format_quota_bar(5_000, 10_000, 4), "[██░░]");
    }

    #[test]
    fn keyword_rows_show_metrics() {
        let mut candidate = KeywordCandidate::new("budget headphones", KeywordSource::Title);
        candidate.frequency = Some(3);
        candidate.hit_videos = Some(25);
        candidate.total_searched = Some(50);
        candidate.hit_rate = Some(50);
        candidate.kind = KeywordKind::Hot;
        let output = render_keywords(&[candidate], false);
        assert!(output.contains("budget headphones"));
        assert!(output.contains("25/50 hits (50%)"));
        assert!(output.contains("hot"));
    }

    #[test]
    fn report_line_mentions_rotation() {
        let report = OpReport {
            cost: 102,
            rotated_to: Some(1),
            exhausted: false,
        };
        let line = render_report(&report);
        assert!(line.contains("quota spent: 102"));
        assert!(line.contains("switched to key 2"));
    }
}
