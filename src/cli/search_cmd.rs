use anyhow::Result;
use chrono::Utc;

use crate::cli::output::OutputOptions;
use crate::cli::renderer;
use crate::cli::AppContext;
use crate::core::filter::{ContentType, DateWindow, ResultFilters, SubscriberBucket, ViewBucket};

pub fn parse_filters(
    content_type: &str,
    subscribers: &str,
    views: &str,
    date: &str,
) -> Result<ResultFilters> {
    let content_type = ContentType::parse(content_type)
        .ok_or_else(|| anyhow::anyhow!("unknown content type '{content_type}' (all|regular|shorts)"))?;
    let subscribers = SubscriberBucket::parse(subscribers)
        .ok_or_else(|| anyhow::anyhow!("unknown subscriber range '{subscribers}' (all|u5k|o10k|o50k|o100k|o1m)"))?;
    let views = ViewBucket::parse(views)
        .ok_or_else(|| anyhow::anyhow!("unknown view range '{views}' (all|u10k|o10k|o100k|o500k|o1m)"))?;
    let date = DateWindow::parse(date)
        .ok_or_else(|| anyhow::anyhow!("unknown date window '{date}' (all|1d|3d|1m|6m)"))?;
    Ok(ResultFilters {
        content_type,
        subscribers,
        views,
        date,
    })
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    query: Vec<String>,
    content_type: String,
    subscribers: String,
    views: String,
    date: String,
    page_token: Option<String>,
    opts: &OutputOptions,
) -> Result<()> {
    let filters = parse_filters(&content_type, &subscribers, &views, &date)?;
    let ctx = AppContext::init()?;
    let orchestrator = ctx.orchestrator();

    let query = query.join(" ");
    if query.trim().is_empty() && opts.verbose {
        eprintln!("No query given, showing the {} trending chart", ctx.config.region_code);
    }

    let page = orchestrator.search(&query, &filters, page_token).await?;
    let videos = filters.apply(page.videos, Utc::now());

    if opts.is_json() {
        #[derive(serde::Serialize)]
        struct Payload {
            videos: Vec<crate::core::models::video::VideoRecord>,
            next_page_token: Option<String>,
            quota_cost: u64,
        }
        opts.print_json(&Payload {
            videos,
            next_page_token: page.next_page_token,
            quota_cost: page.report.cost,
        })?;
    } else {
        if videos.is_empty() {
            println!("No videos matched.");
        } else {
            println!("{}", renderer::render_videos(&videos, opts.use_color));
        }
        if let Some(token) = &page.next_page_token {
            println!("\n Next page: --page {}", token);
        }
        eprintln!("{}", renderer::render_report(&page.report));
    }
    Ok(())
}
