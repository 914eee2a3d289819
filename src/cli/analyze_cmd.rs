use anyhow::Result;
use std::io::Write;

use crate::cli::output::OutputOptions;
use crate::cli::renderer;
use crate::cli::search_cmd::parse_filters;
use crate::cli::AppContext;
use crate::core::orchestrator::Orchestrator;
use crate::core::provider::YoutubeClient;

/// Estimated costs above this prompt for confirmation first.
const CONFIRM_ABOVE: u64 = 2_000;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    channels: Vec<String>,
    content_type: String,
    subscribers: String,
    views: String,
    date: String,
    yes: bool,
    opts: &OutputOptions,
) -> Result<()> {
    if channels.is_empty() {
        anyhow::bail!("no channels given");
    }
    let filters = parse_filters(&content_type, &subscribers, &views, &date)?;
    let ctx = AppContext::init()?;
    let orchestrator = ctx.orchestrator();

    let estimate = Orchestrator::<YoutubeClient>::analysis_cost_estimate(channels.len());
    if opts.verbose {
        eprintln!(
            "Analyzing {} channel(s), estimated quota cost {}",
            channels.len(),
            estimate
        );
    }
    if estimate > CONFIRM_ABOVE && !yes && !confirm(estimate)? {
        eprintln!("Cancelled.");
        return Ok(());
    }

    let outcome = orchestrator.analyze_channels(&channels, &filters).await?;

    if opts.is_json() {
        #[derive(serde::Serialize)]
        struct ChannelPayload {
            channel: crate::core::models::video::ChannelRecord,
            videos: Vec<crate::core::models::video::VideoRecord>,
        }
        #[derive(serde::Serialize)]
        struct Payload {
            channels: Vec<ChannelPayload>,
            skipped: Vec<(String, String)>,
            quota_cost: u64,
        }
        opts.print_json(&Payload {
            channels: outcome
                .channels
                .into_iter()
                .map(|a| ChannelPayload {
                    channel: a.channel,
                    videos: a.videos,
                })
                .collect(),
            skipped: outcome.skipped,
            quota_cost: outcome.report.cost,
        })?;
        return Ok(());
    }

    let mut sections: Vec<String> = Vec::new();
    for analysis in &outcome.channels {
        let mut block = renderer::render_channel(&analysis.channel, opts.use_color);
        if analysis.videos.is_empty() {
            block.push_str("\n   no recent uploads matched the filters");
        } else {
            block.push('\n');
            block.push_str(&renderer::render_videos(&analysis.videos, opts.use_color));
        }
        sections.push(block);
    }
    for (input, reason) in &outcome.skipped {
        sections.push(format!(" {} (skipped)\n   {}", input, reason));
    }
    println!("{}", sections.join("\n\n"));
    eprintln!("{}", renderer::render_report(&outcome.report));
    Ok(())
}

fn confirm(estimate: u64) -> Result<bool> {
    eprint!(
        "This run is estimated to cost {} quota points. Continue? [y/N] ",
        estimate
    );
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
