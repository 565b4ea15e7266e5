use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tokio_util::sync::CancellationToken;

use dabcli::{
    cli, config, error, logging,
    types::{Format, SearchKind},
    utils, warning,
};

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
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Print debug diagnostics to stderr
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in and store the session
    Login(LoginOptions),

    /// Search the catalog
    Search(SearchOptions),

    /// Download a single track
    Track(DownloadOptions),

    /// Download an album
    Album(DownloadOptions),

    /// Download the discography of an artist
    Artist(DownloadOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOptions {
    email: String,
    password: String,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    query: String,

    /// What to search for
    #[clap(
        long = "type",
        short = 't',
        default_value = "track",
        value_parser = utils::parse_search_kind
    )]
    kind: SearchKind,
}

#[derive(Parser, Debug, Clone)]
pub struct DownloadOptions {
    /// Catalog id
    id: String,

    /// Audio format (flac or mp3)
    #[clap(long, short, default_value = "flac", value_parser = utils::parse_format)]
    format: Format,
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

    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if cli::watch_interrupts(cli::ctrl_c_presses(), on_interrupt).await {
            warning!("Interrupted again, quitting");
            std::process::exit(130);
        }
    });

    match cli.command {
        Command::Login(opt) => cli::login(&opt.email, &opt.password).await,
        Command::Search(opt) => cli::search(&opt.query, opt.kind).await,
        Command::Track(opt) => cli::download_track(&opt.id, opt.format, cancel).await,
        Command::Album(opt) => cli::download_album(&opt.id, opt.format, cancel).await,
        Command::Artist(opt) => cli::download_artist(&opt.id, opt.format, cancel).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
