mod cli;
mod core;

use clap::{Parser, Subcommand};

use cli::output::OutputOptions;

#[derive(Parser)]
#[command(name = "tubedash", about = "Quota-aware YouTube curation CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search videos (empty query shows the trending chart)
    Search {
        /// Search terms
        query: Vec<String>,

        /// Content type filter (all|regular|shorts)
        #[arg(long = "type", default_value = "all")]
        content_type: String,

        /// Subscriber range (all|u5k|o10k|o50k|o100k|o1m)
        #[arg(long, default_value = "all")]
        subs: String,

        /// View range (all|u10k|o10k|o100k|o500k|o1m)
        #[arg(long, default_value = "all")]
        views: String,

        /// Publish window (all|1d|3d|1m|6m)
        #[arg(long, default_value = "all")]
        date: String,

        /// Continue from a previous page token
        #[arg(long)]
        page: Option<String>,
    },
    /// Fetch recent uploads for one or more channels
    Analyze {
        /// Channel ids, URLs or @handles
        channels: Vec<String>,

        /// Content type filter (all|regular|shorts)
        #[arg(long = "type", default_value = "all")]
        content_type: String,

        /// Subscriber range (all|u5k|o10k|o50k|o100k|o1m)
        #[arg(long, default_value = "all")]
        subs: String,

        /// View range (all|u10k|o10k|o100k|o500k|o1m)
        #[arg(long, default_value = "all")]
        views: String,

        /// Publish window (all|1d|3d|1m|6m)
        #[arg(long, default_value = "all")]
        date: String,

        /// Skip the cost confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Fetch and save a single asset
    Add {
        #[command(subcommand)]
        target: AddTarget,
    },
    /// Extract and score keywords for a video
    Keywords {
        /// Video id or URL
        video: String,

        /// Extraction strategy (lexical|remote)
        #[arg(short, long, default_value = "lexical")]
        strategy: String,

        /// Use a local transcript file instead of fetching one
        #[arg(long)]
        script: Option<String>,

        /// Persist the results to the store
        #[arg(long)]
        save: bool,
    },
    /// Browse and manage stored assets
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
    /// Inspect or adjust the key-quota ledger
    Quota {
        #[command(subcommand)]
        action: QuotaAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum AddTarget {
    /// Fetch a video by id or URL
    Video {
        /// Video id or URL
        input: String,
    },
    /// Fetch a channel by id, URL or @handle
    Channel {
        /// Channel id, URL or @handle
        input: String,
    },
}

#[derive(Subcommand)]
enum SavedAction {
    /// List saved videos
    Videos,
    /// List saved channels
    Channels,
    /// Delete a saved video by row id
    DeleteVideo {
        /// Row id shown by `saved videos`
        id: i64,
    },
    /// Delete a saved channel by row id
    DeleteChannel {
        /// Row id shown by `saved channels`
        id: i64,
    },
    /// Set the category of a saved video
    Categorize {
        /// Row id shown by `saved videos`
        id: i64,
        /// Category label
        category: String,
    },
}

#[derive(Subcommand)]
enum QuotaAction {
    /// Show today's usage per key
    Show,
    /// Zero out today's usage
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Make a specific key active (1-based)
    Switch {
        /// Key number as shown by `quota show`
        key: usize,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let opts = OutputOptions::from_flags(
        cli.format.as_deref(),
        cli.json,
        cli.pretty,
        cli.no_color,
        cli.verbose,
    );

    match cli.command {
        Commands::Search {
            query,
            content_type,
            subs,
            views,
            date,
            page,
        } => {
            cli::search_cmd::run(query, content_type, subs, views, date, page, &opts).await?;
        }
        Commands::Analyze {
            channels,
            content_type,
            subs,
            views,
            date,
            yes,
        } => {
            cli::analyze_cmd::run(channels, content_type, subs, views, date, yes, &opts).await?;
        }
        Commands::Add { target } => match target {
            AddTarget::Video { input } => cli::add_cmd::video(input, &opts).await?,
            AddTarget::Channel { input } => cli::add_cmd::channel(input, &opts).await?,
        },
        Commands::Keywords {
            video,
            strategy,
            script,
            save,
        } => {
            cli::keywords_cmd::run(video, strategy, script, save, &opts).await?;
        }
        Commands::Saved { action } => match action {
            SavedAction::Videos => cli::saved_cmd::videos(&opts).await?,
            SavedAction::Channels => cli::saved_cmd::channels(&opts).await?,
            SavedAction::DeleteVideo { id } => cli::saved_cmd::delete_video(id, &opts).await?,
            SavedAction::DeleteChannel { id } => {
                cli::saved_cmd::delete_channel(id, &opts).await?
            }
            SavedAction::Categorize { id, category } => {
                cli::saved_cmd::categorize(id, category, &opts).await?
            }
        },
        Commands::Quota { action } => match action {
            QuotaAction::Show => cli::quota_cmd::show(&opts)?,
            QuotaAction::Reset { yes } => cli::quota_cmd::reset(yes, &opts)?,
            QuotaAction::Switch { key } => cli::quota_cmd::switch(key, &opts)?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Init => cli::config_cmd::init(&opts)?,
            ConfigAction::Check => cli::config_cmd::check(&opts)?,
        },
    }

    Ok(())
}
