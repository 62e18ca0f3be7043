use cfhighlight::config::{Config, Mode, load_config};
use cfhighlight::{Engine, Error, HtmlDocument, Result, highlight_source};
use clap::{Parser, Subcommand};
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(
    name = "cfhighlight",
    about = "Highlight keywords in competitive-programming problem statements"
)]
struct Cli {
    /// Rule file (default: ~/.config/cfhighlight.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the configured matching mode
    #[arg(long, global = true, value_enum)]
    mode: Option<Mode>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Highlight the <p> and <li> contents of HTML pages (stdin if no files)
    Page {
        files: Vec<PathBuf>,
        /// Rewrite the files instead of printing them
        #[arg(short, long)]
        in_place: bool,
    },
    /// Highlight a single fragment (stdin if no text)
    Fragment { text: Option<String> },
    /// Print the effective rule table as TOML
    Rules,
}

fn resolve_config(cli: &Cli) -> Config {
    let mut config = load_config(cli.config.as_deref());
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    config
}

async fn read_stdin() -> Result<String> {
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    Ok(input)
}

fn highlight_page(html: String, engine: &Engine) -> Result<String> {
    let mut doc = HtmlDocument::parse(html);
    let changed = highlight_source(&mut doc, engine)?;
    debug!("{changed}/{} fragments highlighted", doc.len());
    Ok(doc.render())
}

async fn highlight_file(path: PathBuf, engine: Arc<Engine>, in_place: bool) -> Result<String> {
    let start = std::time::Instant::now();
    let html = tokio::fs::read_to_string(&path).await?;
    let rendered = highlight_page(html, &engine)?;
    if in_place {
        tokio::fs::write(&path, &rendered).await?;
    }
    debug!("{path:?}: {:?}", start.elapsed());
    Ok(rendered)
}

async fn run_pages(files: Vec<PathBuf>, engine: Arc<Engine>, in_place: bool) -> Result<()> {
    if files.is_empty() {
        let html = read_stdin().await?;
        print!("{}", highlight_page(html, &engine)?);
        return Ok(());
    }

    // Pages are independent; spawn them all and report in argument order.
    let handles: Vec<_> = files
        .into_iter()
        .map(|path| tokio::spawn(highlight_file(path, engine.clone(), in_place)))
        .collect();

    // Wait for every task before reporting, so no in-place write is cut short.
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.map_err(Error::from).and_then(|result| result));
    }

    let mut first_error = None;
    for result in results {
        match result {
            Ok(rendered) if !in_place => print!("{rendered}"),
            Ok(_) => {}
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => warn!("{e}"),
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn strip_line_ending(input: &str) -> &str {
    input.trim_end_matches(['\r', '\n'])
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli);

    match cli.command {
        Commands::Rules => {
            print!("{}", toml::to_string(&config)?);
        }
        Commands::Fragment { text } => {
            let engine = Engine::new(&config)?;
            let text = match text {
                Some(text) => text,
                None => strip_line_ending(&read_stdin().await?).to_string(),
            };
            println!("{}", engine.transform(&text));
        }
        Commands::Page { files, in_place } => {
            let engine = Engine::new(&config)?;
            debug!("mode={:?} rules={}", engine.mode(), engine.rule_count());
            run_pages(files, Arc::new(engine), in_place).await?;
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
