//! End-to-end tour of the Pawsville core.
//!
//! Covers: a builder session, batch generation and the history ledger,
//! persistence with debounced autosave, legacy migration, the refinery
//! system prompt, and the manual editor.
//!
//! Run with: cargo run --example walkthrough

use pawsville::builder::LEGACY_STATE_KEY;
use pawsville::persist::AUTOSAVE_DELAY_MS;
use pawsville::{
    BuilderManager, KeyValueStore, ManualManager, MemoryStore, RefineryManager, TextureLevel,
};

fn main() {
    println!("========================================");
    println!(" Pawsville Core Walkthrough");
    println!("========================================\n");

    builder_session();
    batch_and_history();
    autosave_roundtrip();
    legacy_migration();
    refinery_session();
    manual_session();
}

// -----------------------------------------------------------------------------
// 1. Builder session: globals + characters -> assembled prompt
// -----------------------------------------------------------------------------
fn builder_session() {
    println!("Builder session");

    let mut builder = BuilderManager::load(MemoryStore::new(), 0);
    builder.set_style("Pixar style 3D render");
    builder.set_camera("low angle, fisheye");
    builder.set_light("golden hour");
    builder.set_rules("no text, no watermark");
    builder.set_texture(TextureLevel::High);

    // The shipped roster starts with empty descriptions; fill the two
    // active ones.
    builder.set_character_text("c1", "orange tabby cat, green eyes, blue hoodie");
    builder.set_character_text("c2", "tiny green dragon, leather jacket");

    let prompt = builder.generate("the pair kickflips off a fire hydrant");
    println!("   Prompt:\n{}", indent(&prompt, "     | "));
    println!();
}

// -----------------------------------------------------------------------------
// 2. Batch generation + the history ledger
// -----------------------------------------------------------------------------
fn batch_and_history() {
    println!("Batch generation + history ledger");

    let mut builder = BuilderManager::load(MemoryStore::new(), 0);
    builder.set_style("ink sketch");
    builder.set_character_text("c1", "orange tabby cat");

    let scenes = "cat naps on a warm laptop\n\ncat chases a laser dot\ncat judges you silently";
    let results = builder.generate_batch(scenes);
    println!("   Scene lines in: 3 (one blank line skipped)");
    println!("   Prompts out:    {}", results.len());

    let recorded = builder.record_batch(&results, 1_700_000_000_000);
    let stats = builder.history().stats();
    println!("   Recorded:       {} entries", recorded);
    println!(
        "   Ledger:         {} total, latest ts {:?}",
        stats.total, stats.last_ts
    );

    let export = builder.export_history_json(1_700_000_000_500).unwrap();
    println!("   Export:         {} bytes of JSON", export.len());
    println!();
}

// -----------------------------------------------------------------------------
// 3. Persistence + debounced autosave
// -----------------------------------------------------------------------------
fn autosave_roundtrip() {
    println!("Persistence + debounced autosave");

    let mut builder = BuilderManager::load(MemoryStore::new(), 0);
    builder.set_style("watercolor");
    builder.mark_changed(1_000);
    println!("   Edit at t=1000, quiet window {} ms", AUTOSAVE_DELAY_MS);
    println!("   poll(t=1100) -> {:?}", builder.poll_autosave(1_100));
    println!("   poll(t=1200) -> {:?}", builder.poll_autosave(1_200));

    // Reopen from the same backing and confirm the edit survived.
    let store = builder.store().clone();
    let reopened = BuilderManager::load(store, 2_000);
    println!("   Reopened style: {:?}", reopened.state().globals.style);
    println!();
}

// -----------------------------------------------------------------------------
// 4. Legacy envelope migration
// -----------------------------------------------------------------------------
fn legacy_migration() {
    println!("Legacy envelope migration");

    let mut store = MemoryStore::new();
    store.set(
        LEGACY_STATE_KEY,
        r#"{
            "globals": { "style": "Ghibli", "light": "dusk" },
            "characters": [
                { "id": "c1", "name": "Tabby", "text": "orange tabby cat", "active": 1 }
            ]
        }"#,
    );

    let builder = BuilderManager::load(store, 0);
    println!("   Migrated:   {}", builder.migrated_from_legacy());
    println!("   Style:      {:?}", builder.state().globals.style);
    println!("   Characters: {}", builder.state().characters.len());
    println!();
}

// -----------------------------------------------------------------------------
// 5. Refinery: the enhancement system prompt
// -----------------------------------------------------------------------------
fn refinery_session() {
    println!("Refinery system prompt");

    let mut refinery = RefineryManager::load(MemoryStore::new());
    refinery.set_style("gritty cyberpunk photo");
    refinery.set_negative("blurry, extra limbs");
    refinery.set_texture(TextureLevel::Extreme);
    refinery.set_suffix("shot on 35mm film");

    // rc1 is the shipped default actor.
    refinery
        .add_outfit("rc1", "Rain gear", "yellow raincoat, tiny boots")
        .unwrap();

    let system = refinery.system_prompt();
    println!("   System prompt:\n{}", indent(&system, "     | "));
    println!(
        "   Suffixed reply: {:?}",
        refinery.apply_suffix("a cat leaps over neon puddles\n")
    );
    println!();
}

// -----------------------------------------------------------------------------
// 6. Manual editor: unlabeled assembly
// -----------------------------------------------------------------------------
fn manual_session() {
    println!("Manual editor");

    let mut manual = ManualManager::load(MemoryStore::new());
    manual.set_style("Anime");
    manual.set_camera("low angle");

    let results = manual.build_batch("kickflip at noon");
    println!("   Prompt:\n{}", indent(&results[0].prompt, "     | "));
    println!();
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}
