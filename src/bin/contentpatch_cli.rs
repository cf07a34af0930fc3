//! Content Patch CLI - resolve a content pack against a token file
//!
//! Commands: patches, resolve
//! Outputs JSON to stdout
//! Returns 2 when any patch reports errors

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use contentpatch_core::{logging, ContentPack, Patch, TokenMap};

#[derive(Parser)]
#[command(name = "contentpatch-cli")]
#[command(about = "Content Patch CLI - Conditional Patch Resolution")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the content pack directory
    #[arg(short, long, global = true, default_value = ".")]
    pack: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List patches and any that failed to load
    Patches,

    /// Resolve every patch against a token file
    Resolve {
        /// JSON object of token values
        #[arg(short, long)]
        tokens: PathBuf,
    },
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let mut pack = match ContentPack::load_from_dir(&cli.pack) {
        Ok(p) => p,
        Err(e) => {
            print_json(&serde_json::json!({ "error": format!("Failed to load pack: {e}") }));
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Patches => {
            let patches: Vec<_> = pack
                .patches()
                .iter()
                .map(|p| serde_json::json!({
                    "logName": p.log_name(),
                    "action": p.kind(),
                    "target": p.raw_target(),
                }))
                .collect();
            let rejected: Vec<_> = pack
                .rejected()
                .iter()
                .map(|(name, e)| serde_json::json!({ "logName": name, "error": e.to_string() }))
                .collect();

            print_json(&serde_json::json!({ "patches": patches, "rejected": rejected }));
            ExitCode::SUCCESS
        }

        Commands::Resolve { tokens } => {
            let context: TokenMap = match fs::read_to_string(&tokens)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
            {
                Ok(c) => c,
                Err(e) => {
                    print_json(&serde_json::json!({ "error": format!("Invalid tokens: {e}") }));
                    return ExitCode::FAILURE;
                }
            };

            let update = pack.update_context(&context);
            let patches: Vec<_> = pack.patches().iter().map(describe).collect();
            let failed: Vec<_> = update
                .failed
                .iter()
                .map(|(name, e)| serde_json::json!({ "logName": name, "error": e.to_string() }))
                .collect();

            let has_errors = !failed.is_empty()
                || pack.patches().iter().any(|p| p.diagnostic_state().has_errors());
            print_json(&serde_json::json!({
                "changed": update.changed,
                "patches": patches,
                "failed": failed,
            }));

            if has_errors {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

fn describe(patch: &Patch) -> serde_json::Value {
    let tokens: Vec<_> = patch.tokens_used().iter().map(|t| t.to_string()).collect();
    serde_json::json!({
        "logName": patch.log_name(),
        "ready": patch.is_ready(),
        "target": patch.target_asset(),
        "fromFile": patch.from_asset(),
        "sourceExists": patch.source_asset_exists(),
        "conditionsMatch": patch.matches_conditions(),
        "tokensUsed": tokens,
        "diagnostics": patch.diagnostic_state(),
    })
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to serialize output: {e}"),
    }
}
