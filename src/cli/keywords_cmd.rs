use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::output::OutputOptions;
use crate::cli::renderer;
use crate::cli::AppContext;
use crate::core::keywords::{
    classify_trends, ExtractionInput, KeywordStrategy, LexicalStrategy, RemoteStrategy,
    StrategyKind,
};
use crate::core::models::keyword::KeywordCandidate;
use crate::core::provider::{TranscriptFetcher, TranscriptInfo};
use crate::core::quota::EnrichmentCounterStore;

pub async fn run(
    input: String,
    strategy: String,
    script: Option<String>,
    save: bool,
    opts: &OutputOptions,
) -> Result<()> {
    let kind = StrategyKind::parse(&strategy)
        .ok_or_else(|| anyhow::anyhow!("unknown strategy '{strategy}' (lexical|remote)"))?;
    let ctx = AppContext::init()?;
    let orchestrator = ctx.orchestrator();

    let added = orchestrator.add_video(&input).await?;
    let video = added.video;
    if opts.verbose {
        eprintln!("Fetched \"{}\" ({})", video.title, renderer::render_report(&added.report));
    }

    let (transcript, transcript_info) = resolve_transcript(&ctx, &video.id, script, opts).await?;

    let extraction_input = ExtractionInput {
        title: video.title.clone(),
        description: video.description.clone(),
        tags: video.tags.clone(),
        transcript,
    };

    let mut outcome = match kind {
        StrategyKind::Lexical => {
            LexicalStrategy::new().extract(extraction_input).await?
        }
        StrategyKind::Remote => {
            let suggestions = ctx.suggestion_client()?;
            if !suggestions.has_suggestions() {
                anyhow::bail!(
                    "remote strategy needs endpoints.keyword_api set in the config"
                );
            }
            let strategy = RemoteStrategy::new(
                Arc::clone(&ctx.api),
                Arc::new(suggestions),
                Arc::clone(&ctx.tracker),
                ctx.policy,
                ctx.config.api_keys.clone(),
            );
            strategy.extract(extraction_input).await?
        }
    };

    if outcome.quota_warning {
        eprintln!("Warning: quota exhausted, keyword validation was skipped or cut short.");
    }

    let suggestions = ctx.suggestion_client()?;
    if suggestions.has_trends() && !outcome.candidates.is_empty() {
        let counter = EnrichmentCounterStore::new(EnrichmentCounterStore::default_path());
        let calls = classify_trends(&suggestions, &mut outcome.candidates, &counter).await?;
        if opts.verbose && calls > 0 {
            eprintln!(
                "Classified {} keyword(s); {} trend calls used in total",
                calls,
                counter.load()?.trend_calls
            );
        }
    }

    if save {
        let store = ctx.store_required()?;
        let db_id = match video.db_id {
            Some(id) => id,
            None => {
                let saved = store.saved_video_ids().await?;
                if saved.contains(&video.id) {
                    anyhow::bail!(
                        "video {} is already saved; keyword rerun against stored rows is not supported without its row id",
                        video.id
                    );
                }
                store
                    .insert_video(&video)
                    .await?
                    .id
                    .context("store returned a video row without an id")?
            }
        };
        let count = store.save_keywords(db_id, &outcome.candidates).await?;
        if !opts.is_json() {
            println!(" Saved {} keyword(s) for video {}", count, video.id);
        }
    }

    if opts.is_json() {
        #[derive(serde::Serialize)]
        struct Payload<'a> {
            video_id: &'a str,
            video_type: crate::core::models::keyword::VideoType,
            transcript: &'a TranscriptInfo,
            keywords: &'a [KeywordCandidate],
        }
        opts.print_json(&Payload {
            video_id: &video.id,
            video_type: outcome.video_type,
            transcript: &transcript_info,
            keywords: &outcome.candidates,
        })?;
    } else {
        if outcome.candidates.is_empty() {
            println!("No keywords extracted.");
        } else {
            println!("{}", renderer::render_keywords(&outcome.candidates, opts.use_color));
        }
        if transcript_info.has_transcript {
            println!(
                "\n Transcript: {} chars ({})",
                transcript_info.length, transcript_info.source
            );
        }
    }
    Ok(())
}

/// Manual script file wins over fetching; fetch failures degrade to "no
/// transcript" because extraction works without one.
async fn resolve_transcript(
    ctx: &AppContext,
    video_id: &str,
    script: Option<String>,
    opts: &OutputOptions,
) -> Result<(Option<String>, TranscriptInfo)> {
    if let Some(path) = script {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read script file {path}"))?;
        let info = TranscriptInfo::manual(&text);
        return Ok((Some(text), info));
    }

    let fetcher = TranscriptFetcher::new(
        ctx.config.endpoints.local_transcript_api.as_deref(),
        ctx.config.endpoints.transcript_api.as_deref(),
    );
    if !fetcher.is_configured() {
        return Ok((None, TranscriptInfo::missing()));
    }
    match fetcher.fetch(video_id).await {
        Some((text, source)) => {
            if opts.verbose {
                eprintln!("Transcript fetched from the {} endpoint", source);
            }
            let info = TranscriptInfo {
                has_transcript: true,
                length: text.len(),
                is_manual: false,
                source: source.to_string(),
            };
            Ok((Some(text), info))
        }
        None => Ok((None, TranscriptInfo::missing())),
    }
}
