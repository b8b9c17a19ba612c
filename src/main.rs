use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

use hark::audio::capture::{CpalFrameSource, list_devices, suppress_audio_warnings};
use hark::audio::wav::WavFrameSource;
use hark::cli::{Cli, Commands, ConfigAction};
use hark::config::Config;
use hark::recognizer::{RecognitionOutcome, Recognizer};
use hark::{DecoderEngine, WhisperEngine};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        None => run_recognize(&cli),
        Some(Commands::Devices) => list_audio_devices(),
        Some(Commands::Config { action }) => handle_config_command(action, &cli),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "hark", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load the configuration, layering file → environment → command line.
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };

    let mut config = config.with_env_overrides();
    cli.apply_to_config(&mut config);
    Ok(config)
}

fn run_recognize(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    suppress_audio_warnings();

    let engine = WhisperEngine::new(config.model.clone())
        .context("failed to initialize the decoding engine")?;
    let mut recognizer = Recognizer::new(engine, config.endpoint_config())?
        .with_max_leading_silence_ms(config.endpoint.max_leading_silence_ms);

    if !cli.quiet && cli.verbose > 0 {
        eprintln!(
            "hark {} (model {}, {})",
            hark::version_string(),
            recognizer.engine().name(),
            hark::defaults::gpu_backend()
        );
    }

    if std::io::stdin().is_terminal() {
        run_mic_mode(cli, &config, &mut recognizer)
    } else {
        run_pipe_mode(cli, &mut recognizer)
    }
}

/// Mic mode: capture from the microphone, one fresh device per pass.
fn run_mic_mode(
    cli: &Cli,
    config: &Config,
    recognizer: &mut Recognizer<WhisperEngine>,
) -> Result<()> {
    loop {
        let mut source = CpalFrameSource::new(config.audio.device.as_deref())?;

        if !cli.quiet {
            eprintln!("{}", "listening...".dimmed());
        }

        let outcome = recognizer.recognize(&mut source);
        print_outcome(&outcome, cli);

        let fatal = matches!(
            outcome,
            RecognitionOutcome::NotInitialized | RecognitionOutcome::DeviceError(_)
        );
        if !cli.continuous || fatal {
            break;
        }
    }
    Ok(())
}

/// Pipe mode: stdin has WAV data. Each pass consumes one utterance from the
/// stream; `--continuous` drains the whole file.
fn run_pipe_mode(cli: &Cli, recognizer: &mut Recognizer<WhisperEngine>) -> Result<()> {
    let mut source = WavFrameSource::from_stdin()?;

    loop {
        let outcome = recognizer.recognize(&mut source);
        let exhausted = !outcome.is_transcription();
        print_outcome(&outcome, cli);

        if !cli.continuous || exhausted {
            break;
        }
    }
    Ok(())
}

/// Render one recognition outcome. Transcriptions go to stdout, everything
/// else to stderr, so piped output stays clean.
fn print_outcome(outcome: &RecognitionOutcome, cli: &Cli) {
    if cli.json {
        let value = match outcome {
            RecognitionOutcome::Transcription(hyp) => serde_json::json!({
                "outcome": "transcription",
                "text": hyp.text,
                "confidence": hyp.confidence,
            }),
            other => serde_json::json!({
                "outcome": "error",
                "message": other.to_string(),
            }),
        };
        println!("{}", value);
        return;
    }

    match outcome {
        RecognitionOutcome::Transcription(hyp) => {
            println!("{}", hyp.text);
            if !cli.quiet && cli.verbose > 0 {
                eprintln!("{}", format!("confidence {:.2}", hyp.confidence).dimmed());
            }
        }
        RecognitionOutcome::NoSpeechDetected | RecognitionOutcome::Cancelled => {
            if !cli.quiet {
                eprintln!("{}", outcome.to_string().yellow());
            }
        }
        RecognitionOutcome::NotInitialized
        | RecognitionOutcome::DeviceError(_)
        | RecognitionOutcome::DecoderError(_) => {
            eprintln!("{}", outcome.to_string().red());
        }
    }
}

fn list_audio_devices() -> Result<()> {
    suppress_audio_warnings();
    let devices = list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        return Ok(());
    }

    println!("Available audio input devices:");
    for device in devices {
        if device.ends_with("[recommended]") {
            println!("  {}", device.green());
        } else {
            println!("  {}", device);
        }
    }
    Ok(())
}

fn handle_config_command(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(cli)?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigAction::Path => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => Config::default_path().context("could not determine config directory")?,
            };
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Init => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => Config::default_path().context("could not determine config directory")?,
            };
            if path.exists() {
                anyhow::bail!("config file already exists at {}", path.display());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::default().to_toml()?)?;
            eprintln!("wrote {}", path.display());
            Ok(())
        }
    }
}
