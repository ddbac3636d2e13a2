use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hymnsync::{cli, config, error, types::Book};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API
    Serve,

    /// List song files
    Songs(SongsOptions),

    /// Print one song
    Song(SongOptions),

    /// Show the title index of a book
    Titles(TitlesOptions),

    /// Search titles and lyrics
    Search(SearchOptions),

    /// Address-bar style suggestions for a query
    Suggest(SuggestOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct SongsOptions {
    /// Only list this book (be, bn, kj)
    #[clap(long)]
    pub book: Option<Book>,
}

#[derive(Parser, Debug, Clone)]
pub struct SongOptions {
    pub book: Book,
    pub number: String,
}

#[derive(Parser, Debug, Clone)]
pub struct TitlesOptions {
    pub book: Book,

    /// Read titles from a running server instead of the store
    #[clap(long)]
    pub server: Option<String>,

    /// Drop the cached titles of this book first
    #[clap(long)]
    pub refresh: bool,

    /// Also warm the title cache of the other books
    #[clap(long)]
    pub warm: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    pub query: String,

    /// Restrict the search to one book
    #[clap(long)]
    pub book: Option<Book>,
}

#[derive(Parser, Debug, Clone)]
pub struct SuggestOptions {
    pub query: String,

    /// Open the first suggestion in the browser
    #[clap(long)]
    pub open: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve().await,
        Command::Songs(opt) => cli::songs(opt.book).await,
        Command::Song(opt) => cli::song(opt.book, opt.number).await,
        Command::Titles(opt) => cli::titles(opt.book, opt.server, opt.refresh, opt.warm).await,
        Command::Search(opt) => cli::search(opt.query, opt.book).await,
        Command::Suggest(opt) => cli::suggest(opt.query, opt.open).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
