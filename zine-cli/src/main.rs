use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use std::{fs, io, path::PathBuf, process, sync::Arc};
use thiserror::Error as ThisError;
use tokio_util::sync::CancellationToken;
use zine_context::{Client, Config, Ports};
use zine_msg::{LoadShoutsOptions, Metric, SearchOptions};
use zine_ref::{RefError, ShoutSlug};
use zine_store::{AuthorsSortBy, ReactionNode, TopicsSortBy};

mod fixture;

use fixture::{FixtureApi, FixtureError};

#[derive(Parser)]
#[command(name = "zine")]
#[command(about = "Browse a publishing platform snapshot through the client cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Json snapshot of the backend to serve from
    #[arg(short, long)]
    fixture: PathBuf,

    /// Client config file (toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local database, defaults to ~/.zine/client.sqlite3
    #[arg(long)]
    db: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// One page of the feed
    Feed {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Shouts whose title contains the text
    Search { text: String },
    /// One shout and its comment thread
    Shout { slug: String },
    /// All authors in the chosen order
    Authors {
        #[arg(long, value_enum, default_value = "name")]
        sort: AuthorsOrder,
    },
    /// All topics in the chosen order
    Topics {
        #[arg(long, value_enum, default_value = "shouts")]
        sort: TopicsOrder,
    },
    /// Top lists computed from the loaded feed
    Tops,
    /// Records a shout as seen and lists everything seen
    Seen { slug: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum AuthorsOrder {
    Created,
    Name,
    Shouts,
    Followers,
}

#[derive(Clone, Copy, ValueEnum)]
enum TopicsOrder {
    Shouts,
    Followers,
    Authors,
    Title,
}

#[derive(Debug, ThisError)]
enum Error {
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error(transparent)]
    Context(#[from] zine_context::Error),
    #[error(transparent)]
    Store(#[from] zine_store::Error),
    #[error(transparent)]
    Ref(#[from] RefError),
    #[error("Json error, cause: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create data directory, cause: {0}")]
    CreateDir(#[source] io::Error),
}

fn default_db_path() -> Result<String, Error> {
    let Some(home) = simple_home_dir::home_dir() else {
        return Ok("sqlite::memory:".to_string());
    };
    let dir = home.join(".zine");
    fs::create_dir_all(&dir).map_err(Error::CreateDir)?;
    Ok(dir.join("client.sqlite3").to_string_lossy().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_thread(nodes: &[ReactionNode], depth: usize) {
    for node in nodes {
        let reaction = &node.reaction;
        println!(
            "{}- {}: {}",
            "  ".repeat(depth),
            reaction.created_by.slug,
            reaction.body.as_deref().unwrap_or("")
        );
        print_thread(&node.replies, depth + 1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(db) = cli.db {
        config.database_path = Some(db);
    }
    if config.database_path.is_none() {
        config.database_path = Some(default_db_path()?);
    }

    let api = Arc::new(FixtureApi::load(&cli.fixture)?);
    let ports = Ports {
        core: api.clone(),
        auth: api.clone(),
        notifier: api.clone(),
        inbox: api.clone(),
        events: api,
    };
    let client = Client::open(config, ports).await?;
    let zine = client.zine();
    let cancel = CancellationToken::new();
    info!("Serving from {}", cli.fixture.display());

    match cli.command {
        Commands::Feed { limit, offset } => {
            let options = LoadShoutsOptions::new(limit).with_offset(offset);
            let page = zine.load_shouts(&options, &cancel).await?;
            print_json(&page)?;
        }
        Commands::Search { text } => {
            let options = SearchOptions {
                text,
                limit: client.config().shouts_per_page,
                offset: 0,
            };
            let page = zine.load_shouts_search(&options, &cancel).await?;
            print_json(&page)?;
        }
        Commands::Shout { slug } => {
            let slug = ShoutSlug::try_from(slug)?;
            let shout = zine.load_shout(&slug, &cancel).await?;
            zine.load_shout_reactions(&slug, 0, &cancel).await?;
            println!("{} ({})", shout.title, shout.slug);
            print_thread(&zine.comment_thread(&slug), 1);
        }
        Commands::Authors { sort } => {
            zine.load_all_authors(&cancel).await?;
            zine.set_authors_sort_by(match sort {
                AuthorsOrder::Created => AuthorsSortBy::Created,
                AuthorsOrder::Name => AuthorsSortBy::Name,
                AuthorsOrder::Shouts => AuthorsSortBy::Stat(Metric::Shouts),
                AuthorsOrder::Followers => AuthorsSortBy::Stat(Metric::Followers),
            });
            for (letter, authors) in zine.authors_grouped_by_name() {
                let names: Vec<String> = authors
                    .iter()
                    .map(|author| author.name.clone().unwrap_or_else(|| author.slug.to_string()))
                    .collect();
                println!("{}: {}", letter, names.join(", "));
            }
        }
        Commands::Topics { sort } => {
            client.load_all_topics_cached(&cancel).await?;
            zine.set_topics_sort_by(match sort {
                TopicsOrder::Shouts => TopicsSortBy::Shouts,
                TopicsOrder::Followers => TopicsSortBy::Followers,
                TopicsOrder::Authors => TopicsSortBy::Authors,
                TopicsOrder::Title => TopicsSortBy::Title,
            });
            for topic in zine.sorted_topics() {
                println!("{}\t{}", topic.slug, topic.title.unwrap_or_default());
            }
        }
        Commands::Tops => {
            let options = LoadShoutsOptions::new(client.config().shouts_per_page);
            zine.load_shouts(&options, &cancel).await?;
            client.refresh_tops();
            print_json(&zine.tops())?;
        }
        Commands::Seen { slug } => {
            let slug = ShoutSlug::try_from(slug)?;
            client.mark_seen(&slug).await?;
            print_json(&client.seen().await?)?;
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    if let Err(err) = run(cli).await {
        eprintln!("{}", err);
        process::exit(1);
    }
}
