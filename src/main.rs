// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use lifebridge::app_config::{self, Config};
use lifebridge::database::{DatabaseConnection, Repository};
use lifebridge::gateway::{GatewayRequest, TranslationGateway};
use lifebridge::models::{MedicalContext, PerformanceMode, Priority};
use lifebridge::review::ReviewDecision;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum CliContext {
    Emergency,
    General,
    Consultation,
    Medication,
}

impl From<CliContext> for MedicalContext {
    fn from(context: CliContext) -> Self {
        match context {
            CliContext::Emergency => MedicalContext::Emergency,
            CliContext::General => MedicalContext::General,
            CliContext::Consultation => MedicalContext::Consultation,
            CliContext::Medication => MedicalContext::Medication,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum CliMode {
    Standard,
    Optimized,
}

impl From<CliMode> for PerformanceMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Standard => PerformanceMode::Standard,
            CliMode::Optimized => PerformanceMode::Optimized,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum CliPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl From<CliPriority> for Priority {
    fn from(priority: CliPriority) -> Self {
        match priority {
            CliPriority::Low => Priority::Low,
            CliPriority::Medium => Priority::Medium,
            CliPriority::High => Priority::High,
            CliPriority::Critical => Priority::Critical,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum CliDecision {
    Approved,
    Rejected,
    RequiresRevision,
}

impl From<CliDecision> for ReviewDecision {
    fn from(decision: CliDecision) -> Self {
        match decision {
            CliDecision::Approved => ReviewDecision::Approved,
            CliDecision::Rejected => ReviewDecision::Rejected,
            CliDecision::RequiresRevision => ReviewDecision::RequiresRevision,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate one utterance through the safety gateway
    Translate(TranslateArgs),

    /// Show what would be redacted from a text, without translating it
    Redact {
        /// Text to inspect
        text: String,

        /// Context the text would be processed under
        #[arg(short, long, value_enum, default_value = "general")]
        context: CliContext,
    },

    /// Score the medical criticality of a text
    Analyze {
        /// Text to analyze
        text: String,
    },

    /// Work the human review queue
    #[command(subcommand)]
    Reviews(ReviewCommands),

    /// Generate shell completions for lifebridge
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Text to translate
    text: String,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Medical context; detected from the text when omitted
    #[arg(short, long, value_enum)]
    context: Option<CliContext>,

    /// Performance profile that overrides routing
    #[arg(short, long, value_enum)]
    mode: Option<CliMode>,

    /// Session identifier for the audit trail
    #[arg(long)]
    session_id: Option<String>,

    /// Caller identifier, stored pseudonymized
    #[arg(long)]
    user_id: Option<String>,

    /// Translator timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum ReviewCommands {
    /// List open reviews, most urgent first
    List {
        #[arg(short, long, value_enum)]
        priority: Option<CliPriority>,

        /// Only emergency reviews
        #[arg(short, long)]
        emergency_only: bool,
    },

    /// Claim a pending review
    Claim {
        id: String,

        #[arg(short, long)]
        reviewer: String,
    },

    /// Submit a decision for a review
    Submit {
        id: String,

        #[arg(short, long)]
        reviewer: String,

        #[arg(short, long, value_enum)]
        decision: CliDecision,

        #[arg(short, long)]
        notes: Option<String>,

        /// Corrected translation; the candidate is kept when omitted
        #[arg(short, long)]
        final_text: Option<String>,
    },

    /// Escalate a review to critical priority
    Escalate {
        id: String,

        #[arg(short, long)]
        reason: String,

        /// Phone or pager for the on-call reviewer
        #[arg(short, long)]
        contact: Option<String>,
    },

    /// Queue statistics over a time window
    Metrics {
        /// Window such as 30m, 24h or 7d
        #[arg(short, long, default_value = "24h")]
        timeframe: String,
    },
}

/// LifeBridge - Medical Translation Safety Gateway
///
/// Redacts protected health information, scores medical criticality,
/// translates, assesses quality, and holds doubtful translations for review.
#[derive(Parser, Debug)]
#[command(name = "lifebridge")]
#[command(version)]
#[command(about = "Medical translation safety gateway")]
#[command(long_about = "LifeBridge translates medical utterances with safety checks around the engine.

EXAMPLES:
    lifebridge translate \"I have chest pain\" -s en -t es    # Translate with automatic context
    lifebridge translate \"take 5 mg daily\" -c medication    # Force the medication context
    lifebridge redact \"Call me at 555-123-4567\"              # Preview redaction
    lifebridge analyze \"severe bleeding after a fall\"        # Criticality score
    lifebridge reviews list --emergency-only                  # Urgent review queue
    lifebridge reviews submit REVIEW_ID -r nurse-7 -d approved
    lifebridge completions bash > lifebridge.bash             # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load `config_path`, writing the defaults there first if it does not exist
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path).context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {}", config_path))
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        Ok(config)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "lifebridge", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    let mut config = load_config(&cli.config_path)?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }
    if let Commands::Translate(args) = &cli.command {
        if let Some(source) = &args.source_language {
            config.source_language = source.clone();
        }
        if let Some(target) = &args.target_language {
            config.target_language = target.clone();
        }
        if let Some(timeout_ms) = args.timeout_ms {
            config.gateway.translator_timeout_ms = timeout_ms;
        }
    }
    config.validate().context("Configuration validation failed")?;
    if cli.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let repository = match &config.database_path {
        Some(path) => Repository::new(DatabaseConnection::new(path)?),
        None => Repository::new_default()?,
    };
    let gateway = TranslationGateway::from_config(&config, repository)?;

    let outcome = run_command(cli.command, &config, &gateway).await;
    gateway.audit().flush().await;
    outcome
}

async fn run_command(command: Commands, config: &Config, gateway: &TranslationGateway) -> Result<()> {
    match command {
        Commands::Translate(args) => {
            let mut request = GatewayRequest::new(args.text, &config.source_language, &config.target_language);
            request.context = args.context.map(Into::into);
            request.performance_mode = args.mode.map(Into::into);
            request.session_id = args.session_id;
            request.user_id = args.user_id;

            match gateway.translate(request).await {
                Ok(response) => {
                    if response.is_pending_review() {
                        info!("Translation held for human review");
                    }
                    print_json(&response)
                }
                Err(e) => {
                    error!("Translation failed ({}): {}", e.status(), e);
                    Err(anyhow!(e))
                }
            }
        }
        Commands::Redact { text, context } => {
            let context: MedicalContext = context.into();
            let detector = gateway.detector();
            let prepared = detector.prepare_for_translation(&text, context);
            if let Some(warning) = &prepared.warning {
                warn!("{}", warning);
            }
            print_json(&serde_json::json!({
                "prepared": prepared,
                "safety": detector.validate_safety(&text, context),
                "report": detector.risk_report(&text, context),
            }))
        }
        Commands::Analyze { text } => print_json(&gateway.analyzer().analyze(&text)),
        Commands::Reviews(review_command) => run_review_command(review_command, gateway).await,
        Commands::Completions { .. } => Ok(()),
    }
}

async fn run_review_command(command: ReviewCommands, gateway: &TranslationGateway) -> Result<()> {
    let reviews = gateway.reviews();
    match command {
        ReviewCommands::List { priority, emergency_only } => {
            let queue = reviews.list_pending(priority.map(Into::into), emergency_only).await?;
            info!("{} open review(s)", queue.len());
            print_json(&queue)
        }
        ReviewCommands::Claim { id, reviewer } => print_json(&reviews.claim(&id, &reviewer).await?),
        ReviewCommands::Submit {
            id,
            reviewer,
            decision,
            notes,
            final_text,
        } => {
            let review = reviews
                .submit_review(&id, &reviewer, decision.into(), notes, final_text)
                .await?;
            print_json(&review)
        }
        ReviewCommands::Escalate { id, reason, contact } => {
            let outcome = reviews.escalate(&id, &reason, contact).await?;
            if outcome.notifications_sent == 0 {
                warn!("Escalation of {} reached no notification channel", id);
            }
            print_json(&outcome)
        }
        ReviewCommands::Metrics { timeframe } => print_json(&reviews.metrics(&timeframe).await?),
    }
}
