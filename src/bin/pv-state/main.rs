//! Pawsville state inspection CLI.
//!
//! Operates on a JSON dump of the studio's browser storage: one object
//! mapping storage keys to their stored string values.
//!
//! Usage:
//!   pv-state --store dump.json show
//!   pv-state --store dump.json generate "cat skateboards at sunset"
//!   pv-state --store dump.json enhance --scenes scenes.txt

mod store;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pawsville::assemble::{join_batch, BATCH_COPY_SEPARATOR};
use pawsville::builder::{BuilderManager, CURRENT_STATE_KEY, LEGACY_STATE_KEY};
use pawsville::history::{PromptHistory, HISTORY_KEY, MAX_ENTRIES};
use pawsville::manual::{ManualManager, MANUAL_KEY};
use pawsville::persist::KeyValueStore;
use pawsville::provider::ProviderKind;
use pawsville::refinery::{RefineryManager, REFINERY_KEY};

use store::FileStore;

#[derive(Parser)]
#[command(
    name = "pv-state",
    about = "Inspect and exercise Pawsville state dumps",
    version
)]
struct Args {
    /// State file: a JSON object of storage keys to stored values
    #[arg(short, long)]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize every Pawsville key in the store
    Show,

    /// Print one tool's normalized state as JSON
    State {
        /// Which tool: builder, refinery, or manual
        #[arg(short, long)]
        tool: String,

        /// Print the stored string untouched instead of normalizing
        #[arg(long)]
        raw: bool,
    },

    /// Assemble prompts from the stored builder state
    Generate {
        /// Scene text (one prompt per non-blank line)
        scene: Option<String>,

        /// Read scene text from a file instead
        #[arg(long)]
        scenes: Option<PathBuf>,

        /// Use the manual editor state instead of the builder
        #[arg(long)]
        manual: bool,
    },

    /// Print history ledger entries, newest first
    History {
        /// Show at most this many entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Write the history export JSON to a file
    ExportHistory {
        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the refinery system prompt for the stored state
    SystemPrompt,

    /// Run scene lines through the configured AI provider
    Enhance {
        /// Scene text (one request per non-blank line)
        scene: Option<String>,

        /// Read scene text from a file instead
        #[arg(long)]
        scenes: Option<PathBuf>,

        /// API key (overrides the one in the state file)
        #[arg(short, long, env = "PAWSVILLE_API_KEY")]
        key: Option<String>,

        /// Provider override: openai or gemini
        #[arg(short, long)]
        provider: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let file_store = FileStore::open(&args.store)?;

    match args.command {
        Command::Show => run_show(&file_store),
        Command::State { tool, raw } => run_state(file_store, &tool, raw),
        Command::Generate {
            scene,
            scenes,
            manual,
        } => run_generate(file_store, scene, scenes.as_deref(), manual),
        Command::History { limit } => run_history(&file_store, limit),
        Command::ExportHistory { output } => run_export_history(&file_store, &output),
        Command::SystemPrompt => run_system_prompt(file_store),
        Command::Enhance {
            scene,
            scenes,
            key,
            provider,
        } => run_enhance(file_store, scene, scenes.as_deref(), key, provider).await,
    }
}

fn run_show(file_store: &FileStore) -> Result<()> {
    println!("Keys:");
    for key in [CURRENT_STATE_KEY, HISTORY_KEY, REFINERY_KEY, MANUAL_KEY] {
        match file_store.raw_len(key) {
            Some(len) => println!("  {:<28} {:>8} bytes", key, len),
            None => println!("  {:<28} (absent)", key),
        }
    }
    if file_store.raw_len(LEGACY_STATE_KEY).is_some() {
        println!("  {:<28} present (read-only fallback)", LEGACY_STATE_KEY);
    }

    let builder = BuilderManager::load(file_store.clone(), epoch_ms());
    let stats = builder.stats();
    println!();
    println!("Builder:");
    println!(
        "  Characters: {} total, {} active",
        stats.total_characters, stats.active_characters
    );
    println!("  Texture:    {}", stats.texture_label);
    println!("  Presets:    {}", builder.state().presets.len());
    if builder.migrated_from_legacy() {
        println!("  Loaded from the legacy key.");
    }

    let history_stats = builder.history().stats();
    println!();
    println!("History:");
    println!("  Entries: {} (cap {})", history_stats.total, MAX_ENTRIES);
    if let Some(ts) = history_stats.last_ts {
        println!("  Latest:  {} (epoch ms)", ts);
    }

    let refinery = RefineryManager::load(file_store.clone());
    println!();
    println!("Refinery:");
    println!("  Actors:   {}", refinery.state().actors.len());
    println!("  Provider: {}", refinery.state().api.provider.as_key());
    println!(
        "  API key:  {}",
        if refinery.state().api.key.is_empty() {
            "unset"
        } else {
            "set"
        }
    );

    let manual = ManualManager::load(file_store.clone());
    println!();
    println!("Manual editor:");
    println!("  Blocks: {}", manual.state().blocks.len());

    Ok(())
}

fn run_state(file_store: FileStore, tool: &str, raw: bool) -> Result<()> {
    let key = state_key(tool)?;

    if raw {
        let text = file_store
            .get(key)
            .with_context(|| format!("Nothing stored under {}", key))?;
        println!("{}", text);
        return Ok(());
    }

    let json = if key == CURRENT_STATE_KEY {
        serde_json::to_string_pretty(BuilderManager::load(file_store, epoch_ms()).state())?
    } else if key == REFINERY_KEY {
        serde_json::to_string_pretty(RefineryManager::load(file_store).state())?
    } else {
        serde_json::to_string_pretty(ManualManager::load(file_store).state())?
    };
    println!("{}", json);
    Ok(())
}

fn run_generate(
    file_store: FileStore,
    scene: Option<String>,
    scenes: Option<&Path>,
    manual: bool,
) -> Result<()> {
    let input = resolve_scene_input(scene, scenes)?;

    let results = if manual {
        ManualManager::load(file_store).build_batch(&input)
    } else {
        BuilderManager::load(file_store, epoch_ms()).generate_batch(&input)
    };

    if results.is_empty() {
        anyhow::bail!("No non-blank scene lines in the input.");
    }
    println!("{}", join_batch(&results));
    Ok(())
}

fn run_history(file_store: &FileStore, limit: Option<usize>) -> Result<()> {
    let history = PromptHistory::load(file_store, epoch_ms());
    if history.is_empty() {
        println!("History is empty.");
        return Ok(());
    }

    let shown = limit.unwrap_or(history.len()).min(history.len());
    for entry in history.entries().iter().take(shown) {
        println!("[{}] {} ({})", entry.ts, entry.id, entry.mode.as_key());
        println!("  scene:  {}", preview(&entry.scene, 100));
        println!("  prompt: {}", preview(&entry.prompt, 100));
    }
    println!();
    println!("{} of {} entries", shown, history.len());
    Ok(())
}

fn run_export_history(file_store: &FileStore, output: &Path) -> Result<()> {
    let history = PromptHistory::load(file_store, epoch_ms());
    let json = history.export_json(epoch_ms())?;
    std::fs::write(output, &json)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Exported {} entries to {}", history.len(), output.display());
    Ok(())
}

fn run_system_prompt(file_store: FileStore) -> Result<()> {
    let refinery = RefineryManager::load(file_store);
    println!("{}", refinery.system_prompt());
    Ok(())
}

async fn run_enhance(
    file_store: FileStore,
    scene: Option<String>,
    scenes: Option<&Path>,
    key: Option<String>,
    provider: Option<String>,
) -> Result<()> {
    let input = resolve_scene_input(scene, scenes)?;

    let mut refinery = RefineryManager::load(file_store);
    if let Some(key) = key {
        refinery.set_api_key(&key);
    }
    if let Some(name) = provider {
        if !matches!(name.as_str(), "openai" | "gemini") {
            anyhow::bail!("Unknown provider: {} (expected openai or gemini)", name);
        }
        refinery.set_api_provider(ProviderKind::from_key(&name));
    }
    if refinery.state().api.key.is_empty() {
        anyhow::bail!(
            "No API key. Pass --key, set PAWSVILLE_API_KEY, or store one in the state file."
        );
    }

    let client = refinery.state().api.connect();
    let results = refinery.enhance_batch(client.as_ref(), &input).await;
    if results.is_empty() {
        anyhow::bail!("No non-blank scene lines in the input.");
    }
    println!("{}", results.join(BATCH_COPY_SEPARATOR));
    Ok(())
}

fn state_key(tool: &str) -> Result<&'static str> {
    match tool {
        "builder" => Ok(CURRENT_STATE_KEY),
        "refinery" => Ok(REFINERY_KEY),
        "manual" => Ok(MANUAL_KEY),
        other => anyhow::bail!(
            "Unknown tool: {} (expected builder, refinery, or manual)",
            other
        ),
    }
}

fn resolve_scene_input(scene: Option<String>, scenes: Option<&Path>) -> Result<String> {
    match (scene, scenes) {
        (Some(_), Some(_)) => anyhow::bail!("Pass scene text or --scenes, not both."),
        (Some(text), None) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenes file: {}", path.display())),
        (None, None) => anyhow::bail!("Pass scene text or --scenes <file>."),
    }
}

/// Single-line preview of possibly multi-line text.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
