//! commitron - CLI entry point.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commitron::commit::{build_commit_prompt, build_system_prompt, normalize};
use commitron::config::{CommitConfig, ContextConfig, Convention, DiffStrategy};
use commitron::diff::{ContextOutput, build_context, resolve_budget};
use commitron::error::NormalizeError;
use commitron::git::{collect_staged_changes, open_repository};
use commitron::tokenizer::Tokenizer;

/// Budget diffs for LLM prompts and normalize generated commit messages.
#[derive(Parser, Debug)]
#[command(name = "commitron")]
#[command(about = "Budget diffs for LLM prompts and normalize generated commit messages")]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reduce a diff to fit a token budget and print it
    Context(ContextArgs),
    /// Print the system and user prompts for a diff as JSON
    Prompt(PromptArgs),
    /// Turn raw generator output into a valid commit message
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug)]
struct ContextArgs {
    /// Diff file to read ("-" for stdin)
    #[arg(long, conflicts_with = "staged")]
    diff: Option<PathBuf>,

    /// Use the staged changes of the repository in the current directory
    #[arg(long)]
    staged: bool,

    /// Changed paths, comma separated (defaults to the staged paths)
    #[arg(long, value_delimiter = ',')]
    files: Vec<String>,

    /// Explicit token budget (otherwise derived from provider and model)
    #[arg(long)]
    budget: Option<usize>,

    /// Generation provider used to derive the budget
    #[arg(long, default_value = "openai")]
    provider: String,

    /// Generation model, also selects the tokenizer
    #[arg(long, default_value = "gpt-4o")]
    model: String,

    /// Reduction strategy: auto, summarize, batch or truncate
    #[arg(long, default_value = "auto")]
    strategy: DiffStrategy,

    /// Only truncate oversized diffs
    #[arg(long)]
    no_summarize: bool,
}

#[derive(Args, Debug)]
struct MessageArgs {
    /// Convention: conventional, none, or a header template with {type}, {scope}, {subject}
    #[arg(long, default_value = "conventional")]
    convention: String,

    /// Maximum header length in characters
    #[arg(long, default_value_t = 72)]
    max_length: usize,

    /// Maximum body length in characters
    #[arg(long, default_value_t = 500)]
    max_body_length: usize,

    /// Do not require or render a body
    #[arg(long)]
    no_body: bool,
}

impl MessageArgs {
    fn commit_config(&self, verbose: bool) -> CommitConfig {
        CommitConfig {
            convention: parse_convention(&self.convention),
            include_body: !self.no_body,
            max_length: self.max_length,
            max_body_length: self.max_body_length,
            verbose,
            ..CommitConfig::default()
        }
    }
}

#[derive(Args, Debug)]
struct PromptArgs {
    #[command(flatten)]
    context: ContextArgs,

    #[command(flatten)]
    message: MessageArgs,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// File with the generator output ("-" for stdin)
    #[arg(long, default_value = "-")]
    input: PathBuf,

    #[command(flatten)]
    message: MessageArgs,

    /// Changed paths, comma separated, used for a default body
    #[arg(long, value_delimiter = ',')]
    files: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Context(args) => run_context(args, cli.verbose),
        Command::Prompt(args) => run_prompt(args, cli.verbose),
        Command::Normalize(args) => run_normalize(args, cli.verbose),
    }
}

/// Read a file, or stdin when the path is "-".
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Budget the requested diff. Returns the context and the changed paths.
fn gather_context(args: ContextArgs, verbose: bool) -> Result<(ContextOutput, Vec<String>)> {
    let (diff, files) = if args.staged {
        let repo = open_repository(".")
            .context("Not a git repository. Run commitron from within a git repository.")?;
        let staged = collect_staged_changes(&repo).context("Failed to collect staged changes")?;
        let files = if args.files.is_empty() { staged.files } else { args.files };
        (staged.diff_text, files)
    } else {
        let Some(path) = args.diff.as_deref() else {
            bail!("Pass --diff <FILE> (or -) or --staged");
        };
        (read_input(path)?, args.files)
    };

    let config = ContextConfig {
        summarization_enabled: !args.no_summarize,
        strategy: args.strategy,
        verbose,
        ..ContextConfig::default()
    };
    let budget = args
        .budget
        .unwrap_or_else(|| resolve_budget(&args.provider, &args.model, &config));
    let tokenizer = Tokenizer::for_model(config.tokenizer_model(&args.model));

    let output = build_context(&diff, &files, budget, &tokenizer, &config);
    info!(
        "{} -> {} tokens (budget {}, {}, {} files)",
        output.input_tokens, output.output_tokens, budget, output.strategy, output.file_count
    );
    Ok((output, files))
}

fn run_context(args: ContextArgs, verbose: bool) -> Result<()> {
    let (output, _) = gather_context(args, verbose)?;
    println!("{}", output.text);
    Ok(())
}

fn run_prompt(args: PromptArgs, verbose: bool) -> Result<()> {
    let config = args.message.commit_config(verbose);
    let (output, files) = gather_context(args.context, verbose)?;

    let prompts = serde_json::json!({
        "system": build_system_prompt(&config),
        "user": build_commit_prompt(&output.text, &files, &config),
    });
    println!("{prompts:#}");
    Ok(())
}

fn parse_convention(value: &str) -> Convention {
    match value.to_lowercase().as_str() {
        "conventional" => Convention::Conventional,
        "none" | "" => Convention::None,
        _ => Convention::Custom(value.to_string()),
    }
}

fn run_normalize(args: NormalizeArgs, verbose: bool) -> Result<()> {
    let raw = read_input(&args.input)?;
    let config = args.message.commit_config(verbose);

    match normalize(&raw, &args.files, &config) {
        Ok(normalized) => {
            info!(
                "Normalized via {} ({:?})",
                normalized.strategy, normalized.state
            );
            println!("{}", normalized.rendered);
            Ok(())
        }
        Err(err @ NormalizeError::Unresolved { .. }) => {
            warn!("{}; using the raw response", err);
            if let Some(raw) = err.raw_fallback() {
                println!("{}", raw.trim());
            }
            Ok(())
        }
        Err(err) => Err(err).context("Failed to normalize commit message"),
    }
}
