use anyhow::Result;
use std::io::Write;

use crate::cli::output::OutputOptions;
use crate::cli::renderer;
use crate::cli::AppContext;
use crate::core::quota::EnrichmentCounterStore;

pub fn show(opts: &OutputOptions) -> Result<()> {
    let ctx = AppContext::init()?;
    let ledger = ctx.tracker.snapshot();
    let counter = EnrichmentCounterStore::new(EnrichmentCounterStore::default_path()).load()?;

    if opts.is_json() {
        #[derive(serde::Serialize)]
        struct Payload {
            ledger: crate::core::quota::QuotaLedger,
            daily_limit: u64,
            switch_threshold: f64,
            trend_calls: u64,
        }
        opts.print_json(&Payload {
            ledger,
            daily_limit: ctx.policy.daily_limit,
            switch_threshold: ctx.policy.switch_threshold,
            trend_calls: counter.trend_calls,
        })?;
    } else {
        println!("{}", renderer::render_ledger(&ledger, &ctx.policy, opts.use_color));
        println!("\n Trend calls used (lifetime): {}", counter.trend_calls);
    }
    Ok(())
}

pub fn reset(yes: bool, _opts: &OutputOptions) -> Result<()> {
    let ctx = AppContext::init()?;
    if !yes && !confirm()? {
        eprintln!("Cancelled.");
        return Ok(());
    }
    ctx.tracker.reset()?;
    println!("Quota ledger reset.");
    Ok(())
}

/// `key` is 1-based, matching the display.
pub fn switch(key: usize, _opts: &OutputOptions) -> Result<()> {
    let ctx = AppContext::init()?;
    if key == 0 {
        anyhow::bail!("key numbers start at 1");
    }
    ctx.tracker.switch_to(key - 1)?;
    println!("Switched to key {}.", key);
    Ok(())
}

fn confirm() -> Result<bool> {
    eprint!("Reset today's usage for every key? [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
