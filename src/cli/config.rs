use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::FillOptions;
use crate::browser::session::{OPERATION_TIMEOUT_MS, OPTION_CLICK_TIMEOUT_MS, SessionOptions};
use crate::fill::executor::FillSettings;
use crate::walker::walker_model::{
    DEFAULT_LOOP_DETECT_THRESHOLD, DEFAULT_MAX_TABS, DEFAULT_STUCK_LIMIT, DEFAULT_TOP_N, WalkerConfig,
};

pub const DEFAULT_CONFIG_FILE: &str = "focus-fill.yaml";
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5:1.5b";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "focus-fill",
    version,
    about = "Discover and fill web forms through the accessibility tree"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: focus-fill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output directory; logs and screenshots go under <out-dir>/logs
    #[arg(long, global = true)]
    pub out_dir: Option<String>,

    /// Run the browser headless (--headless false to watch it)
    #[arg(long, global = true, num_args = 0..=1, default_missing_value = "true")]
    pub headless: Option<bool>,

    /// Ollama API endpoint
    #[arg(long, global = true)]
    pub ollama_endpoint: Option<String>,

    /// Ollama model name
    #[arg(long, global = true)]
    pub ollama_model: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a page and write its fields document
    Scan {
        /// URL or local HTML path
        #[arg(long)]
        target: String,
    },

    /// Walk a page's focus order and fill every field
    Fill {
        /// URL or local HTML path
        #[arg(long)]
        target: String,

        /// Fields document: a file, a directory, or "latest" (default: scan the page)
        #[arg(long)]
        fields_yaml: Option<String>,

        /// Prior answers: a file, a directory, or "latest"
        #[arg(long)]
        answers_yaml: Option<String>,

        /// Candidate profile YAML
        #[arg(long)]
        profile_yaml: Option<String>,

        /// Hard ceiling on focus advances
        #[arg(long)]
        max_tabs: Option<u32>,

        /// Distinct labels needed before a return to the first one is a loop
        #[arg(long)]
        loop_detect_threshold: Option<usize>,

        /// Screenshot file name (default: form-fill-<ms>.png)
        #[arg(long)]
        screenshot_name: Option<String>,

        /// Write a JSONL step trace to this file
        #[arg(long)]
        trace: Option<String>,
    },

    /// Ask an answer backend to fill a fields document
    Answer {
        /// Fields document: a file, a directory, or "latest"
        #[arg(long)]
        fields_yaml: String,

        /// Candidate profile YAML
        #[arg(long)]
        profile_yaml: String,

        /// Prior answers passed to the model
        #[arg(long)]
        answers_yaml: Option<String>,

        /// Answer backend: mock or ollama
        #[arg(long, default_value = "mock")]
        backend: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `focus-fill.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub walker: WalkerSection,
    #[serde(default)]
    pub fill: FillSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub browser: BrowserSection,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerSection {
    #[serde(default = "default_max_tabs")]
    pub max_tabs: u32,

    #[serde(default = "default_loop_threshold")]
    pub loop_detect_threshold: usize,

    #[serde(default = "default_stuck_limit")]
    pub stuck_limit: u32,
}

impl Default for WalkerSection {
    fn default() -> Self {
        Self {
            max_tabs: DEFAULT_MAX_TABS,
            loop_detect_threshold: DEFAULT_LOOP_DETECT_THRESHOLD,
            stuck_limit: DEFAULT_STUCK_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillSection {
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_radio_tries")]
    pub radio_max_tries: usize,

    #[serde(default = "default_one")]
    pub verify_retries: usize,

    #[serde(default = "default_true")]
    pub human_pacing: bool,
}

impl Default for FillSection {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            radio_max_tries: 6,
            verify_retries: 1,
            human_pacing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSection {
    #[serde(default = "default_server_script")]
    pub server_script: String,

    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_click_timeout")]
    pub click_timeout_ms: u64,

    /// Deadline for every other bridge operation.
    #[serde(default = "default_op_timeout")]
    pub op_timeout_ms: u64,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            server_script: default_server_script(),
            headless: true,
            click_timeout_ms: OPTION_CLICK_TIMEOUT_MS,
            op_timeout_ms: OPERATION_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OllamaConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

// Serde default helpers
fn default_max_tabs() -> u32 { DEFAULT_MAX_TABS }
fn default_loop_threshold() -> usize { DEFAULT_LOOP_DETECT_THRESHOLD }
fn default_stuck_limit() -> u32 { DEFAULT_STUCK_LIMIT }
fn default_top_n() -> usize { DEFAULT_TOP_N }
fn default_radio_tries() -> usize { 6 }
fn default_one() -> usize { 1 }
fn default_true() -> bool { true }
fn default_out_dir() -> String { ".".to_string() }
fn default_server_script() -> String { "node/ax_server.js".to_string() }
fn default_click_timeout() -> u64 { OPTION_CLICK_TIMEOUT_MS }
fn default_op_timeout() -> u64 { OPERATION_TIMEOUT_MS }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Fill options: CLI flag > config file > built-in default.
pub fn build_fill_options(
    config: &AppConfig,
    max_tabs: Option<u32>,
    loop_detect_threshold: Option<usize>,
) -> FillOptions {
    FillOptions {
        walker: WalkerConfig {
            max_tabs: max_tabs.unwrap_or(config.walker.max_tabs),
            loop_detect_threshold: loop_detect_threshold.unwrap_or(config.walker.loop_detect_threshold),
            stuck_limit: config.walker.stuck_limit,
            fill: FillSettings {
                radio_max_tries: config.fill.radio_max_tries,
                verify_retries: config.fill.verify_retries,
            },
        },
        top_n: config.fill.top_n,
    }
}

pub fn build_session_options(config: &AppConfig, headless: Option<bool>) -> SessionOptions {
    SessionOptions {
        server_script: PathBuf::from(&config.browser.server_script),
        headless: headless.unwrap_or(config.browser.headless),
        click_timeout_ms: config.browser.click_timeout_ms,
        op_timeout_ms: config.browser.op_timeout_ms,
        ..SessionOptions::default()
    }
}

/// `<out_dir>/logs`, from the CLI flag or the config file.
pub fn logs_dir(config: &AppConfig, out_dir: Option<&str>) -> PathBuf {
    PathBuf::from(out_dir.unwrap_or(&config.output.out_dir)).join("logs")
}

/// Level used when `RUST_LOG` is unset.
pub fn verbosity_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_level(verbose)));

    // A second call (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
