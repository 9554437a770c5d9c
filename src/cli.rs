// Command-line driver
// Reads one text, runs the analysis and prints the three result panels

use crate::api::{analyze_text, AppState};
use crate::models::{AnalysisReport, WordCount};
use crate::services::config_store::ConfigStore;
use anyhow::Context;
use clap::Parser;
use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

const INPUT_PREVIEW_CHARS: usize = 500;
const BAR_WIDTH: usize = 40;

#[derive(Parser, Debug)]
#[command(name = "gpt-shield", version, about = "Estimate whether a text was generated by an AI model")]
pub struct Cli {
    /// Text to analyze (reads stdin when neither --text nor --file is given)
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Bigram language model JSON, e.g. assets/sample-bigram.json
    /// (falls back to GPTSHIELD_MODEL_PATH, then config)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Check a model file loads and store its path in config.json
    #[arg(long, value_name = "PATH", conflicts_with = "model")]
    pub save_model: Option<PathBuf>,

    /// Number of top words to list
    #[arg(long)]
    pub top: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory holding config.json
    #[arg(long, env = "GPTSHIELD_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,
}

pub fn run_args<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let config_dir = cli
        .config_dir
        .clone()
        .or_else(ConfigStore::default_config_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let store = ConfigStore::new(config_dir);
    let mut config = store.load().map_err(anyhow::Error::msg)?;
    if let Some(n) = cli.top {
        config.top_words = n;
    }

    let model_path = match &cli.save_model {
        Some(path) => Some(
            std::fs::canonicalize(path)
                .with_context(|| format!("model file not found: {}", path.display()))?,
        ),
        None => cli.model.clone(),
    };
    let state = AppState::from_config(&config, model_path.as_deref())
        .context("failed to initialize the language model")?;

    if let Some(path) = model_path.as_deref().filter(|_| cli.save_model.is_some()) {
        store.set_model_path(path).map_err(anyhow::Error::msg)?;
        info!(path = %path.display(), "config.model_saved");
        eprintln!("Saved model path {}", path.display());
        if cli.text.is_none() && cli.file.is_none() {
            return Ok(());
        }
    }

    let text = read_input(&cli)?;
    let report = analyze_text(&state, &text).map_err(anyhow::Error::msg)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

fn read_input(cli: &Cli) -> anyhow::Result<String> {
    if let Some(text) = &cli.text {
        return Ok(text.clone());
    }
    if let Some(path) = &cli.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

/// One line per word, bars scaled against the most frequent word.
pub fn render_word_bars(words: &[WordCount], width: usize) -> Vec<String> {
    let max_count = words.iter().map(|w| w.count).max().unwrap_or(0);
    let label_width = words.iter().map(|w| w.word.chars().count()).max().unwrap_or(0);
    words
        .iter()
        .map(|w| {
            let len = if max_count == 0 {
                0
            } else {
                ((w.count * width) as f64 / max_count as f64).round().max(1.0) as usize
            };
            format!(
                "{:<label_width$}  {} {}",
                w.word,
                "#".repeat(len),
                w.count,
                label_width = label_width
            )
        })
        .collect()
}

pub fn render_report(report: &AnalysisReport) -> String {
    let a = &report.analysis;
    let mut out = String::new();

    out.push_str("== Your Input Text ==\n");
    out.push_str(&preview(&report.input, INPUT_PREVIEW_CHARS));
    out.push_str("\n\n== Detection Score ==\n");
    out.push_str(&format!("Perplexity: {:.4}\n", a.perplexity));
    out.push_str(&format!("Burstiness Score: {:.4}\n", a.burstiness));
    out.push_str(&format!(
        "Percentage of being generated by AI: {:.2}%\n",
        a.ai_likelihood_percent
    ));
    if a.raw_ai_likelihood_percent != a.ai_likelihood_percent {
        out.push_str(&format!("(unclamped: {:.2}%)\n", a.raw_ai_likelihood_percent));
    }
    out.push_str(&format!("Text Analysis Result: {}\n", a.verdict.label()));

    out.push_str(&format!("\n== Top {} Most Repeated Words ==\n", report.top_words.len()));
    if report.top_words.is_empty() {
        out.push_str("(no content words)\n");
    }
    for line in render_word_bars(&report.top_words, BAR_WIDTH) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}
