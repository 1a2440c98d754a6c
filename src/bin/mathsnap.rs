//! CLI binary for mathsnap.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SolveConfig`, renders the parsed sections, and records history.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mathsnap::{
    solve, HistoryStore, MathSegment, SegmentKind, SolveConfig, SolveOutput, SolutionSection,
    TaskKind,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Solve a photographed problem (stdout)
  mathsnap homework.jpg

  # Check the pictured working instead of solving
  mathsnap --check exam_answer.png

  # Write the solution to a file
  mathsnap homework.jpg -o solution.txt

  # Use a specific model
  mathsnap --model gpt-4.1 --provider openai homework.jpg

  # Solve from a URL
  mathsnap https://example.com/problem.png

  # Structured JSON output (sections + token stats)
  mathsnap --json homework.jpg > solution.json

  # Show the last 20 solved problems
  mathsnap --history 20

SUPPORTED PROVIDERS & MODELS:
  Provider     Model                  Input $/1M  Output $/1M  Vision
  ─────────    ─────────────────────  ──────────  ───────────  ──────
  openai       gpt-4.1-nano (default) $0.10       $0.40        ✓
  openai       gpt-4.1-mini           $0.40       $1.60        ✓
  openai       gpt-4.1                $2.00       $8.00        ✓
  anthropic    claude-sonnet-4-20250514         $3.00       $15.00       ✓
  gemini       gemini-2.0-flash       $0.10       $0.40        ✓
  ollama       llava, llama3.2-vision free        free         ✓

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  MATHSNAP_PROVIDER       Default for --provider (openai, anthropic, gemini, ollama)
  MATHSNAP_MODEL          Default for --model
  MATHSNAP_LLM_PROVIDER   With MATHSNAP_MODEL also set, overrides provider
                          auto-detection for library callers that set neither flag
  MATHSNAP_HISTORY_DB     History database path (default ~/.mathsnap/history.db)

SETUP:
  1. Set API key:     export OPENAI_API_KEY=sk-...
  2. Solve:           mathsnap homework.jpg
"#;

/// Solve photographed math problems using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "mathsnap",
    version,
    about = "Solve photographed math problems using Vision LLMs",
    long_about = "Point mathsnap at a photo of a handwritten or printed math problem (local file \
or URL) and get a typed, step-by-step solution. Supports OpenAI, Anthropic, Google Gemini, and \
any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image path or HTTP/HTTPS URL. Omit with --history/--clear-history.
    input: Option<String>,

    /// Check the pictured working for mistakes instead of solving.
    #[arg(long)]
    check: bool,

    /// Write the solution to this file instead of stdout.
    #[arg(short, long, env = "MATHSNAP_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(
        long,
        env = "MATHSNAP_MODEL",
        long_help = "Vision LLM model to use. Default: gpt-4.1-nano ($0.10/$0.40 per 1M tokens).\n\
          Popular choices: gpt-4.1-mini ($0.40/$1.60), gpt-4.1 ($2/$8), claude-sonnet-4-20250514 ($3/$15)."
    )]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "MATHSNAP_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "MATHSNAP_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "MATHSNAP_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Retries on LLM failure.
    #[arg(long, env = "MATHSNAP_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Longest image side in pixels before downscaling.
    #[arg(long, env = "MATHSNAP_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "MATHSNAP_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Output structured JSON (SolveOutput) instead of rendered text.
    #[arg(long, env = "MATHSNAP_JSON")]
    json: bool,

    /// History database path.
    #[arg(long, env = "MATHSNAP_HISTORY_DB")]
    history_db: Option<PathBuf>,

    /// Do not record this request in history.
    #[arg(long, env = "MATHSNAP_NO_HISTORY")]
    no_history: bool,

    /// List the N most recent history records and exit.
    #[arg(long, value_name = "N")]
    history: Option<usize>,

    /// Delete all history records and exit.
    #[arg(long)]
    clear_history: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "MATHSNAP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MATHSNAP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the solution itself.
    #[arg(short, long, env = "MATHSNAP_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "MATHSNAP_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// LLM call timeout in seconds.
    #[arg(long, env = "MATHSNAP_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── History-only modes ───────────────────────────────────────────────
    if let Some(n) = cli.history {
        let store = open_history(&cli)?;
        for rec in store.recent(n).context("Failed to read history")? {
            let verdict = match rec.correct {
                Some(true) => green(" ✓"),
                Some(false) => red(" ✗"),
                None => String::new(),
            };
            println!(
                "{} {} [{}]{} {}",
                dim(&format!("#{}", rec.id)),
                dim(&format_timestamp(rec.created_at)),
                rec.kind.as_str(),
                verdict,
                rec.problem,
            );
        }
        return Ok(());
    }

    if cli.clear_history {
        let store = open_history(&cli)?;
        let n = store.clear().context("Failed to clear history")?;
        if !cli.quiet {
            eprintln!("{} {} history records deleted", green("✔"), bold(&n.to_string()));
        }
        return Ok(());
    }

    let input = cli
        .input
        .clone()
        .context("No input given. Pass an image path or URL (see --help).")?;

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli).await?;

    // ── Progress spinner ─────────────────────────────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix(if cli.check { "Checking" } else { "Solving" });
        bar.set_message("Reading the photo…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    // ── Solve ────────────────────────────────────────────────────────────
    let result = match (&cli.output, cli.json) {
        (Some(path), false) => mathsnap::solve_to_file(&input, path, &config).await,
        _ => solve(&input, &config).await,
    };
    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }
    let output = result.context(if cli.check {
        "Check failed"
    } else {
        "Solve failed"
    })?;

    // ── Record history ───────────────────────────────────────────────────
    if !cli.no_history {
        match open_history(&cli).and_then(|store| {
            store
                .insert(config.task, &output.problem, &output.raw, output.correct)
                .context("insert failed")
        }) {
            Ok(_) => {}
            Err(e) => {
                // History is best-effort; never fail the run over it.
                if !cli.quiet {
                    eprintln!("{} history not recorded: {e:#}", yellow("⚠"));
                }
            }
        }
    }

    // ── Render ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if let Some(ref path) = cli.output {
        // solve_to_file already wrote the rendering.
        if !cli.quiet {
            eprintln!("{} wrote {}", green("✔"), bold(&path.display().to_string()));
        }
    } else {
        render_terminal(&output, cli.quiet);
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.total_duration_ms,
        );
    }

    Ok(())
}

/// Map CLI args to `SolveConfig`.
async fn build_config(cli: &Cli) -> Result<SolveConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut config = SolveConfig::builder()
        .task(if cli.check {
            TaskKind::Check
        } else {
            TaskKind::Solve
        })
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .max_image_pixels(cli.max_pixels)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout)
        .build()
        .context("Invalid configuration")?;

    // Fields the builder doesn't have setters for
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.system_prompt = system_prompt;

    Ok(config)
}

/// Open the history store at `--history-db`, `$MATHSNAP_HISTORY_DB`, or
/// the default `~/.mathsnap/history.db`.
fn open_history(cli: &Cli) -> Result<HistoryStore> {
    let path = match cli.history_db {
        Some(ref p) => p.clone(),
        None => {
            let home = std::env::var_os("HOME")
                .map(PathBuf::from)
                .context("HOME not set; pass --history-db explicitly")?;
            home.join(".mathsnap").join("history.db")
        }
    };
    HistoryStore::open(&path).with_context(|| format!("Failed to open {}", path.display()))
}

/// Render the solution for the terminal: headers coloured, display math
/// indented on its own rows, verdict line for check mode.
fn render_terminal(output: &SolveOutput, quiet: bool) {
    if !quiet {
        eprintln!("{} {}", cyan("◆"), bold(&output.problem));
    }

    for section in &output.sections {
        match section {
            SolutionSection::Problem { content } => {
                println!("{} {}", bold("Problem:"), content);
            }
            SolutionSection::Step { number, content } => {
                println!("{} {}", cyan(&format!("Step {number}:")), render_math(content));
            }
            SolutionSection::Answer { content } => {
                println!("{} {}", green(&bold("Answer:")), render_math(content));
            }
            SolutionSection::FreeText { content } => {
                println!("{}", render_math(content));
            }
        }
    }

    match output.correct {
        Some(true) => println!("{}", green(&bold("✓ The pictured working is correct"))),
        Some(false) => println!("{}", red(&bold("✗ The pictured working has a mistake"))),
        None => {}
    }
}

/// Flatten one section's math segments back to a terminal-friendly line:
/// inline math dimmed, display math on its own indented row, bold bolded.
fn render_math(content: &str) -> String {
    let segments = mathsnap::parse_math_segments(content);
    let mut out = String::new();
    for row in mathsnap::group_rows(&segments) {
        if !out.is_empty() {
            out.push('\n');
        }
        let line: Vec<String> = row
            .iter()
            .map(|seg: &MathSegment| match seg.kind {
                SegmentKind::Text => seg.content.clone(),
                SegmentKind::BoldText => bold(&seg.content),
                SegmentKind::InlineMath => dim(&format!("${}$", seg.content)),
                SegmentKind::DisplayMath => format!("    {}", dim(&seg.content)),
            })
            .collect();
        out.push_str(&line.join(" "));
    }
    out
}

/// Format a Unix timestamp as local `YYYY-MM-DD HH:MM`.
fn format_timestamp(secs: i64) -> String {
    use chrono::TimeZone;
    match chrono::Local.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        _ => secs.to_string(),
    }
}
