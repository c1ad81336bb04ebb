use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use roadmapper_lib::config::{self, RoadmapperConfig};
use roadmapper_lib::generate::{GeminiClient, RoadmapGenerator};
use roadmapper_lib::payload::{self, PayloadDecode};
use roadmapper_lib::render::render_view;
use roadmapper_lib::{logging, Tracker};

#[derive(Parser)]
#[command(name = "roadmapper", version, about = "Generate a learning roadmap and track your progress through it")]
struct Cli {
    /// Log filter when RUST_LOG is unset (e.g. "info", "roadmapper_lib=debug")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the generation API for a roadmap on a topic
    Generate {
        topic: String,
        /// Also write the raw roadmap text to this file
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print a link to this base URL carrying the roadmap as `?data=`,
        /// instead of the checklist
        #[arg(long)]
        link: Option<String>,
    },
    /// Show the checklist with progress
    Show {
        #[command(flatten)]
        source: Source,
        /// Only show phases and items containing this text
        #[arg(long, short)]
        query: Option<String>,
    },
    /// Mark an item done, or undo it
    ToggleItem {
        #[command(flatten)]
        source: Source,
        phase: String,
        item: String,
    },
    /// Collapse or expand a phase
    TogglePhase {
        #[command(flatten)]
        source: Source,
        phase: String,
    },
    /// Clear completion for every item of the roadmap
    Reset {
        #[command(flatten)]
        source: Source,
    },
    /// Decode a `data` payload (or a URL carrying one) and print the roadmap text
    Decode { data: String },
    /// Launch the desktop app
    #[cfg(feature = "desktop")]
    Desktop,
}

/// Where the roadmap text comes from. Defaults to the last generated roadmap.
#[derive(Args)]
struct Source {
    /// Read raw roadmap text from a file
    #[arg(long, conflicts_with = "data")]
    file: Option<PathBuf>,
    /// `data` payload, or a URL containing `?data=`
    #[arg(long)]
    data: Option<String>,
}

impl Source {
    fn read(&self) -> anyhow::Result<String> {
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
        if let Some(data) = &self.data {
            return match payload::decode_input(data) {
                PayloadDecode::Valid(raw) => Ok(raw),
                other => bail!("{}", other.message().unwrap_or(payload::INVALID_SHAPE)),
            };
        }
        let path = config::last_roadmap_path().context("cannot find home directory")?;
        std::fs::read_to_string(&path).with_context(|| {
            format!(
                "{} (no --file or --data given and {} is unreadable; run `roadmapper generate` first)",
                payload::NO_DATA,
                path.display()
            )
        })
    }

    fn open(&self, cfg: &RoadmapperConfig) -> anyhow::Result<Tracker> {
        let raw = self.read()?;
        Ok(Tracker::open(&raw, cfg.state_store(&raw)))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_default();
    logging::init(cli.log_level.as_deref().unwrap_or(cfg.log_level()));

    // The desktop shell drives its own event loop and async runtime.
    #[cfg(feature = "desktop")]
    if matches!(cli.command, Command::Desktop) {
        roadmapper_lib::run();
        return Ok(());
    }

    tokio::runtime::Runtime::new()?.block_on(execute(cli.command, cfg))
}

async fn execute(command: Command, cfg: RoadmapperConfig) -> anyhow::Result<()> {
    match command {
        Command::Generate { topic, out, link } => {
            let client = GeminiClient::from_config(&cfg)?;
            let raw = client.generate(&topic).await?;

            if let Some(path) = config::last_roadmap_path() {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, &raw)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if let Some(path) = out {
                std::fs::write(&path, &raw)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if let Err(e) = config::save_last_topic(topic.trim()) {
                tracing::warn!(error = %e, "could not remember last topic");
            }

            match link {
                Some(base) => println!("{}", payload::payload_link(&base, &raw)),
                None => {
                    let tracker = Tracker::open(&raw, cfg.state_store(&raw));
                    print!("{}", render_view(&tracker.view("")));
                }
            }
        }
        Command::Show { source, query } => {
            let tracker = source.open(&cfg)?;
            print!("{}", render_view(&tracker.view(query.as_deref().unwrap_or_default())));
        }
        Command::ToggleItem {
            source,
            phase,
            item,
        } => {
            let mut tracker = source.open(&cfg)?;
            let Some(found) = tracker.find_phase(&phase) else {
                bail!("no phase titled {phase:?}");
            };
            let title = found.title.clone();
            let Some(text) = found
                .content
                .iter()
                .find(|c| c.to_lowercase() == item.to_lowercase())
                .cloned()
            else {
                bail!("phase {title:?} has no item {item:?}");
            };
            let done = tracker.toggle_item(&title, &text);
            println!("{} {text}", if done { "[x]" } else { "[ ]" });
        }
        Command::TogglePhase { source, phase } => {
            let mut tracker = source.open(&cfg)?;
            let Some(title) = tracker.find_phase(&phase).map(|p| p.title.clone()) else {
                bail!("no phase titled {phase:?}");
            };
            let expanded = tracker.toggle_phase_expanded(&title);
            println!("{title}: {}", if expanded { "expanded" } else { "collapsed" });
        }
        Command::Reset { source } => {
            let mut tracker = source.open(&cfg)?;
            let cleared = tracker.reset_progress();
            println!("cleared {cleared} item(s)");
        }
        Command::Decode { data } => match payload::decode_input(&data) {
            PayloadDecode::Valid(raw) => println!("{raw}"),
            other => bail!("{}", other.message().unwrap_or(payload::INVALID_SHAPE)),
        },
        #[cfg(feature = "desktop")]
        Command::Desktop => unreachable!("handled before the runtime starts"),
    }

    Ok(())
}
