use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use textpatch::config::{load_from_path, EditDef, PatchSetConfig};
use textpatch::{report, run, verify, CheckResult, PatchOutcome, PatchStatus, TextBuffer};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "textpatch")]
#[command(about = "Idempotent text patch engine for one-shot source migrations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply patch sets to a target file
    Apply {
        /// Path to the target text artifact
        target: PathBuf,

        /// Patch set TOML file, or a directory of them (default: ./patches)
        #[arg(short, long)]
        patches: Option<PathBuf>,

        /// Dry run - report what would change without writing the target
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Emit the run report as JSON instead of the console summary
        #[arg(long)]
        json: bool,
    },

    /// Check patch status against a target without writing
    Status {
        /// Path to the target text artifact
        target: PathBuf,

        /// Patch set TOML file, or a directory of them (default: ./patches)
        #[arg(short, long)]
        patches: Option<PathBuf>,
    },

    /// List available patch sets, their patches and checks
    List {
        /// Patch set TOML file, or a directory of them (default: ./patches)
        #[arg(short, long)]
        patches: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            target,
            patches,
            dry_run,
            diff,
            json,
        } => cmd_apply(&target, patches, dry_run, diff, json),

        Commands::Status { target, patches } => cmd_apply(&target, patches, true, false, false),

        Commands::List { patches } => cmd_list(patches),
    }
}

/// Discover patch set TOML files.
///
/// A file argument is used as-is; a directory argument (or the default
/// `./patches`) is scanned one level deep for `.toml` files, sorted by name
/// so application order is stable.
fn discover_patch_files(patches: Option<PathBuf>) -> Result<Vec<PathBuf>> {
    let root = patches.unwrap_or_else(|| PathBuf::from("patches"));

    if root.is_file() {
        return Ok(vec![root]);
    }

    if !root.is_dir() {
        anyhow::bail!("no patch set file or directory at {}", root.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();

    if files.is_empty() {
        anyhow::bail!("no .toml patch sets found in {}", root.display());
    }

    Ok(files)
}

fn cmd_apply(
    target: &Path,
    patches: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    json: bool,
) -> Result<ExitCode> {
    let patch_files = discover_patch_files(patches)?;

    let source = fs::read_to_string(target)
        .with_context(|| format!("failed to read target {}", target.display()))?;
    let original = TextBuffer::new(source);

    if dry_run && !json {
        println!("{}", "[dry run - target will not be written]".cyan());
    }

    let mut buffer = original.clone();
    let mut all_outcomes: Vec<PatchOutcome> = Vec::new();
    let mut all_checks: Vec<CheckResult> = Vec::new();

    for patch_file in &patch_files {
        let config = load_from_path(patch_file)?;
        let set = config
            .to_patch_set()
            .with_context(|| format!("invalid patch set in {}", patch_file.display()))?;
        let checks = config
            .to_checks()
            .with_context(|| format!("invalid checks in {}", patch_file.display()))?;

        if !json {
            let title = if config.meta.name.is_empty() {
                patch_file.display().to_string()
            } else {
                config.meta.name.clone()
            };
            println!("{}", format!("== {title}").bold());
        }

        let out = run(&buffer, &set)
            .with_context(|| format!("patch set {} rejected", patch_file.display()))?;

        if !json {
            for outcome in &out.outcomes {
                print_outcome(outcome, &config, &buffer);
            }
        }

        // Each patch set's checks run against its own final text, before any
        // later patch set touches the buffer.
        let results = verify(&out.buffer, &out.outcomes, &checks);
        if !json {
            for check in &results {
                print_check(check);
            }
        }

        buffer = out.buffer;
        all_outcomes.extend(out.outcomes);
        all_checks.extend(results);
    }

    let run_report = report(
        &all_outcomes,
        all_checks,
        original.char_count(),
        buffer.char_count(),
    );

    if show_diff && buffer != original {
        display_diff(target, original.as_str(), buffer.as_str());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&run_report)?);
    } else {
        println!();
        print!("{}", run_report.render());
    }

    if !dry_run && buffer != original {
        atomic_write(target, buffer.as_str())?;
        if !json {
            println!("{}", format!("wrote {}", target.display()).green());
        }
    }

    // Skips on an up-to-date target are a success state; only verification
    // gates the exit status.
    if run_report.all_checks_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_list(patches: Option<PathBuf>) -> Result<ExitCode> {
    let patch_files = discover_patch_files(patches)?;

    for patch_file in &patch_files {
        let config = load_from_path(patch_file)?;
        println!("{}", patch_file.display().to_string().bold());
        if !config.meta.name.is_empty() {
            println!("  name: {}", config.meta.name);
        }
        if let Some(description) = &config.meta.description {
            println!("  description: {description}");
        }
        for patch in &config.patches {
            println!("  patch {} ({})", patch.name, edit_kind(&patch.edit));
        }
        for check in &config.checks {
            println!("  check {}", check.name);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn edit_kind(edit: &EditDef) -> &'static str {
    match edit {
        EditDef::Literal { .. } => "literal",
        EditDef::LiteralAll { .. } => "literal-all",
        EditDef::Structural { .. } => "structural",
    }
}

fn print_outcome(outcome: &PatchOutcome, config: &PatchSetConfig, buffer: &TextBuffer) {
    let line = format!("  {} - {}", outcome.name, outcome.status);
    match &outcome.status {
        PatchStatus::Applied => println!("{}", line.green()),
        PatchStatus::AlreadyApplied => println!("{}", line.yellow()),
        PatchStatus::NotFound => {
            println!("{}", line.yellow());
            if let Some(hint) = anchor_hint(config, &outcome.name, buffer) {
                println!("{}", format!("      nearest line: {hint}").dimmed());
            }
        }
        PatchStatus::Failed { .. } => println!("{}", line.red()),
    }
}

fn print_check(check: &CheckResult) {
    if check.passed {
        println!("{}", format!("  check {} - passed", check.name).green());
    } else {
        match &check.error {
            Some(error) => println!(
                "{}",
                format!("  check {} - failed ({error})", check.name).red()
            ),
            None => println!("{}", format!("  check {} - failed", check.name).red()),
        }
    }
}

/// For a not-found anchor, the most similar line of the target. Surfaces
/// near-miss anchors (whitespace drift, renamed identifiers) without guessing.
fn anchor_hint<'a>(
    config: &PatchSetConfig,
    patch_name: &str,
    buffer: &'a TextBuffer,
) -> Option<&'a str> {
    let entry = config.patches.iter().find(|p| p.name == patch_name)?;
    let anchor = match &entry.edit {
        EditDef::Literal { match_text, .. } | EditDef::LiteralAll { match_text, .. } => match_text,
        EditDef::Structural { start_marker, .. } => start_marker,
    };
    let anchor = anchor.lines().next()?.trim();
    if anchor.is_empty() {
        return None;
    }

    buffer
        .as_str()
        .lines()
        .map(|line| (strsim::normalized_levenshtein(line.trim(), anchor), line))
        .filter(|(score, _)| *score >= 0.6)
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, line)| line.trim())
}

/// Show unified diff between original and patched content.
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

/// Atomic write-back: tempfile in the target's directory, fsync, rename.
///
/// The run completed before this point, so either the full result lands or
/// the original file is untouched.
fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create tempfile next to {}", path.display()))?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    Ok(())
}
