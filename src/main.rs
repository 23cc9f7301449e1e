use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use carevoice::i18n::LocalizationStore;
use carevoice::db::{self, SqliteStore};
use carevoice::speech::capture::{AudioCapture, SAMPLE_RATE};
use carevoice::speech::endpoint::{
    EndpointConfig, EndpointDetector, EndpointEvent, EndpointState, rms,
};
use carevoice::store::LANGUAGE_KEY;
use carevoice::{AssistantKind, Config, Language, ListenOutcome, RouteOutcome, Runtime};

/// carevoice - multilingual speech and voice navigation
#[derive(Parser)]
#[command(name = "carevoice", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported languages
    Languages {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up a translation key
    Translate {
        key: String,
        /// Language code (defaults to the active language)
        #[arg(short, long)]
        lang: Option<String>,
    },
    /// Select and persist the active language
    SetLanguage { code: String },
    /// Forget the stored language so the next start follows the locale
    ResetLanguage,
    /// List installed synthesis voices
    Voices {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Speak text in the active language
    Speak { text: String },
    /// Transcribe one utterance in the active language
    Listen,
    /// Resolve a transcript against an assistant's phrase table
    Route {
        transcript: String,
        #[arg(short, long, value_enum, default_value_t = Assistant::Floating)]
        assistant: Assistant,
    },
    /// Listen for a spoken command and navigate
    Assist {
        #[arg(short, long, value_enum, default_value_t = Assistant::Floating)]
        assistant: Assistant,
    },
    /// Show how the endpoint detector hears the microphone
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Assistant {
    Floating,
    Navigation,
}

impl From<Assistant> for AssistantKind {
    fn from(assistant: Assistant) -> Self {
        match assistant {
            Assistant::Floating => Self::Floating,
            Assistant::Navigation => Self::Navigation,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,carevoice=info",
        1 => "info,carevoice=debug",
        2 => "debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::TestMic { duration } => {
            return test_mic(config.recognition.endpoint(), duration).await;
        }
        Command::ResetLanguage => return reset_language(&config),
        _ => {}
    }

    let runtime = Runtime::from_config(config)?;

    match cli.command {
        Command::Languages { json } => languages(&runtime, json),
        Command::Translate { key, lang } => translate(&runtime, &key, lang.as_deref()),
        Command::SetLanguage { code } => set_language(&runtime, &code),
        Command::Voices { json } => voices(&runtime, json).await,
        Command::Speak { text } => speak(&runtime, &text).await,
        Command::Listen => listen(&runtime).await,
        Command::Route {
            transcript,
            assistant,
        } => route(&runtime, &transcript, assistant.into()),
        Command::Assist { assistant } => assist(&runtime, assistant.into()).await,
        Command::TestMic { .. } | Command::ResetLanguage => Ok(()),
    }
}

fn languages(runtime: &Runtime, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(Language::all())?);
        return Ok(());
    }

    let current = runtime.session().current();
    let localization = LocalizationStore::builtin();
    for language in Language::all() {
        let marker = if language.code == current.code { "*" } else { " " };
        let partial = if localization.is_mostly_untranslated(language.code) {
            " (partial)"
        } else {
            ""
        };
        println!(
            "{marker} {:<3} {:<10} {:<12} {}{partial}",
            language.code, language.display_name, language.native_name, language.speech_code
        );
    }
    Ok(())
}

fn translate(runtime: &Runtime, key: &str, lang: Option<&str>) -> anyhow::Result<()> {
    let session = runtime.session();
    let text = match lang {
        Some(code) => {
            let language = Language::from_code(code)
                .ok_or_else(|| anyhow::anyhow!("unsupported language: {code}"))?;
            session.message_for(language, key)
        }
        None => session.translate(key),
    };
    println!("{text}");
    Ok(())
}

fn set_language(runtime: &Runtime, code: &str) -> anyhow::Result<()> {
    let language =
        Language::from_code(code).ok_or_else(|| anyhow::anyhow!("unsupported language: {code}"))?;
    runtime.session().set_current(language);
    println!("{} ({})", language.display_name, language.native_name);
    Ok(())
}

fn reset_language(config: &Config) -> anyhow::Result<()> {
    let store = SqliteStore::new(db::init(config.database_path())?);
    store.remove(LANGUAGE_KEY)?;
    println!("Stored language cleared");
    Ok(())
}

async fn voices(runtime: &Runtime, json: bool) -> anyhow::Result<()> {
    let voices = runtime.output().voices().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&voices)?);
        return Ok(());
    }
    for voice in &voices {
        println!("{:<24} {:<8} {}", voice.id, voice.lang, voice.name);
    }
    Ok(())
}

async fn speak(runtime: &Runtime, text: &str) -> anyhow::Result<()> {
    let output = runtime.output();

    tokio::select! {
        result = output.speak(text) => match result {
            Err(e) if e.is_benign() => Ok(()),
            other => Ok(other?),
        },
        _ = tokio::signal::ctrl_c() => {
            output.cancel();
            Ok(())
        }
    }
}

async fn listen(runtime: &Runtime) -> anyhow::Result<()> {
    let input = runtime.speech_input();
    eprintln!("{}", runtime.session().translate("voice.listening"));

    tokio::select! {
        outcome = input.listen() => {
            if let ListenOutcome::Transcript(text) = outcome? {
                println!("{text}");
            }
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            input.stop();
            Ok(())
        }
    }
}

fn route(runtime: &Runtime, transcript: &str, kind: AssistantKind) -> anyhow::Result<()> {
    match runtime.config().assistants.table(kind).route(transcript) {
        RouteOutcome::Matched(path) => println!("{path}"),
        RouteOutcome::Unmatched => anyhow::bail!("no route for {transcript:?}"),
    }
    Ok(())
}

async fn assist(runtime: &Runtime, kind: AssistantKind) -> anyhow::Result<()> {
    let assistant = runtime.assistant(kind);
    if !assistant.is_supported() {
        anyhow::bail!(runtime.session().translate("voice.not_supported"));
    }

    eprintln!("{}", runtime.session().translate("voice.listening"));

    tokio::select! {
        state = assistant.activate() => {
            tracing::debug!(?state, "assistant finished");
            println!("{}", runtime.router().current_path());
        }
        _ = tokio::signal::ctrl_c() => assistant.cancel(),
    }
    Ok(())
}

/// Run the endpoint detector against the live microphone
///
/// Prints the capture level each tick and every utterance boundary the
/// recognizer would act on, using the configured windows.
#[allow(clippy::future_not_send)]
async fn test_mic(endpoint: EndpointConfig, duration: u64) -> anyhow::Result<()> {
    const TICK: Duration = Duration::from_millis(250);

    println!(
        "Listening for {duration}s (speech above {:.3} RMS)",
        endpoint.energy_threshold
    );

    let mut capture = AudioCapture::open()?;
    capture.start()?;

    let mut detector = EndpointDetector::new(endpoint);
    let mut utterances = 0usize;
    let ticks = duration.saturating_mul(4);

    for tick in 1..=ticks {
        tokio::time::sleep(TICK).await;

        let samples = capture.take_buffer();
        let level = rms(&samples);
        let event = detector.process(&samples);
        let state = match detector.state() {
            EndpointState::Waiting => "waiting",
            EndpointState::Speaking => "speaking",
        };

        #[allow(clippy::cast_precision_loss)]
        let elapsed = tick as f32 * TICK.as_secs_f32();
        println!("{elapsed:5.2}s  level {level:.4}  {state}");

        match event {
            EndpointEvent::Pending => {}
            EndpointEvent::Complete => {
                utterances += 1;
                #[allow(clippy::cast_precision_loss)]
                let seconds = detector.take_utterance().len() as f32 / SAMPLE_RATE as f32;
                println!("        utterance {utterances}: {seconds:.1}s of audio");
            }
            EndpointEvent::NoSpeech => {
                detector.take_utterance();
                println!("        no speech within the window");
            }
        }
    }

    capture.stop();

    if utterances == 0 {
        println!("No utterance detected. Check the input device with `arecord -l`.");
    } else {
        println!("{utterances} utterance(s) detected; recognition should work.");
    }
    Ok(())
}
