use anyhow::Result;

use crate::cli::output::OutputOptions;
use crate::cli::renderer;
use crate::cli::AppContext;
use crate::core::error::Error;
use crate::core::orchestrator::Orchestrator;
use crate::core::provider::YoutubeClient;

pub async fn video(input: String, opts: &OutputOptions) -> Result<()> {
    let ctx = AppContext::init()?;
    let orchestrator = ctx.orchestrator();

    if let Some(store) = ctx.store()? {
        let saved = store.saved_video_ids().await?;
        if let Some(id) = crate::core::ids::extract_video_id(&input) {
            if saved.contains(&id) {
                return Err(Error::Duplicate(format!("video {id} is already saved")).into());
            }
        }
    }

    let added = orchestrator.add_video(&input).await?;
    let stored = match ctx.store()? {
        Some(store) => Some(store.insert_video(&added.video).await?),
        None => None,
    };

    if opts.is_json() {
        opts.print_json(&added.video)?;
    } else {
        println!("{}", renderer::render_videos(&[added.video], opts.use_color));
        match stored {
            Some(row) => println!(" Saved (id {})", row.id.unwrap_or_default()),
            None => println!(" Store not configured, nothing persisted."),
        }
        eprintln!("{}", renderer::render_report(&added.report));
    }
    Ok(())
}

/// Cost warning for `@handle` inputs. Direct ids stay quiet; one list call
/// is not worth a notice.
fn handle_cost_notice(input: &str) -> Option<String> {
    let id = crate::core::ids::extract_channel_id(input)?;
    if !id.starts_with('@') {
        return None;
    }
    Some(format!(
        "Resolving {} goes through search and will cost about {} quota points",
        id,
        Orchestrator::<YoutubeClient>::add_channel_cost(input)
    ))
}

pub async fn channel(input: String, opts: &OutputOptions) -> Result<()> {
    let ctx = AppContext::init()?;
    let orchestrator = ctx.orchestrator();

    // Handle lookups go through search and cost two orders of magnitude
    // more than a direct id; surface that before spending it.
    if let Some(notice) = handle_cost_notice(&input) {
        eprintln!("{notice}");
    } else if opts.verbose {
        eprintln!(
            "Resolving this input will cost about {} quota point(s)",
            Orchestrator::<YoutubeClient>::add_channel_cost(&input)
        );
    }

    if let Some(store) = ctx.store()? {
        let saved = store.saved_channel_ids().await?;
        if let Some(id) = crate::core::ids::extract_channel_id(&input) {
            if saved.contains(&id) {
                return Err(Error::Duplicate(format!("channel {id} is already saved")).into());
            }
        }
    }

    let added = orchestrator.add_channel(&input).await?;
    let stored = match ctx.store()? {
        Some(store) => Some(store.insert_channel(&added.channel).await?),
        None => None,
    };

    if opts.is_json() {
        opts.print_json(&added.channel)?;
    } else {
        println!("{}", renderer::render_channel(&added.channel, opts.use_color));
        match stored {
            Some(row) => println!(" Saved (id {})", row.id.unwrap_or_default()),
            None => println!(" Store not configured, nothing persisted."),
        }
        eprintln!("{}", renderer::render_report(&added.report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_inputs_always_get_a_cost_notice() {
        let notice = handle_cost_notice("@somecreator").unwrap();
        assert!(notice.contains("@somecreator"));
        assert!(notice.contains("101"));
    }

    #[test]
    fn direct_ids_stay_quiet() {
        assert!(handle_cost_notice("UCuAXFkgsw1L7xaCfnd5JJOw").is_none());
        assert!(handle_cost_notice("???").is_none());
    }
}
