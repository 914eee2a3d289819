use anyhow::Result;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::AppContext;
use crate::cli::renderer::format_count;

pub async fn videos(opts: &OutputOptions) -> Result<()> {
    let ctx = AppContext::init()?;
    let store = ctx.store_required()?;
    let rows = store.list_videos().await?;

    match opts.format {
        OutputFormat::Json => opts.print_json(&rows)?,
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No saved videos.");
                return Ok(());
            }
            for row in &rows {
                println!(
                    " {:>4}  {:<50} {} views  {}",
                    row.id.unwrap_or_default(),
                    truncate(&row.title, 50),
                    format_count(row.view_count),
                    row.channel_title
                );
            }
        }
    }
    Ok(())
}

pub async fn channels(opts: &OutputOptions) -> Result<()> {
    let ctx = AppContext::init()?;
    let store = ctx.store_required()?;
    let rows = store.list_channels().await?;

    match opts.format {
        OutputFormat::Json => opts.print_json(&rows)?,
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No saved channels.");
                return Ok(());
            }
            for row in &rows {
                println!(
                    " {:>4}  {:<40} {} subs  {}",
                    row.id.unwrap_or_default(),
                    truncate(&row.channel_title, 40),
                    format_count(row.subscriber_count),
                    row.category.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

pub async fn delete_video(id: i64, _opts: &OutputOptions) -> Result<()> {
    let ctx = AppContext::init()?;
    let store = ctx.store_required()?;
    store.delete_video(id).await?;
    println!("Deleted video row {}.", id);
    Ok(())
}

pub async fn delete_channel(id: i64, _opts: &OutputOptions) -> Result<()> {
    let ctx = AppContext::init()?;
    let store = ctx.store_required()?;
    store.delete_channel(id).await?;
    println!("Deleted channel row {}.", id);
    Ok(())
}

pub async fn categorize(id: i64, category: String, _opts: &OutputOptions) -> Result<()> {
    let ctx = AppContext::init()?;
    let store = ctx.store_required()?;
    store.update_video_category(id, &category).await?;
    println!("Set category of video row {} to '{}'.", id, category);
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("한글제목이깁니다", 5), "한글제목…");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
