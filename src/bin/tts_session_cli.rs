//! tts-session-cli: drive a TTS service from the terminal
//!
//! Usage:
//!   tts-session-cli languages                       List languages and voices
//!   tts-session-cli voices <language>               List voices for one language
//!   tts-session-cli speak <text> [options]          Synthesize and play (MP3) or save
//!   tts-session-cli health                          Check the service

use anyhow::{bail, Context};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tts_session::session::{CommandPlayer, PlaybackOutcome, TracingObserver};
use tts_session::{AudioFormat, ClientConfig, Quality, SessionController};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "languages" => cmd_languages(&args[2..]).await,
        "voices" => cmd_voices(&args[2..]).await,
        "speak" => cmd_speak(&args[2..]).await,
        "health" => cmd_health(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("tts-session-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"tts-session-cli: text-to-speech from the terminal

USAGE:
    tts-session-cli <COMMAND> [OPTIONS]

COMMANDS:
    languages                   List languages and their voices
    voices <language>           List voices for a language
    speak <text>                Synthesize text
    health                      Check that the service is up
    version                     Show version information
    help                        Show this help message

SPEAK OPTIONS:
    --lang <code>               Language code (default: en-GB)
    --voice <name>              Voice name (default: Ryan (Male))
    --speed <percent>           Speed adjustment, -50..50 (default: 0)
    --quality <standard|high>   Output quality (default: standard)
    --format <mp3|wav>          Output format (default: mp3)
    --download                  Save to TTS_DOWNLOAD_DIR instead of playing
    --player <program>          Player fed through stdin (default: ffplay)

GLOBAL OPTIONS:
    --config <file>             YAML configuration file

ENVIRONMENT:
    TTS_API_BASE_URL            Service base URL (default: http://localhost:8000)
    TTS_HTTP_TIMEOUT_SECS       HTTP timeout
    TTS_REQUEST_TIMEOUT_SECS    Overall request timeout
    TTS_DOWNLOAD_DIR            Where downloads are written
    RUST_LOG                    Log filter"#
    );
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn load_config(args: &[String]) -> anyhow::Result<ClientConfig> {
    let config = match flag_value(args, "--config") {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("reading config {path}"))?,
        None => ClientConfig::default(),
    };
    Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
}

async fn open_session(
    args: &[String],
    player: Option<CommandPlayer>,
) -> anyhow::Result<SessionController> {
    let mut builder = SessionController::builder()
        .config(load_config(args)?)
        .observer(Arc::new(TracingObserver));
    if let Some(player) = player {
        builder = builder.player(Arc::new(player));
    }
    let session = builder.build()?;
    session.load_catalog().await?;
    Ok(session)
}

async fn cmd_languages(args: &[String]) -> anyhow::Result<()> {
    let session = open_session(args, None).await?;
    for (code, entry) in session.catalog().languages() {
        println!("{code:8} {}", entry.name);
        for voice in entry.voices.keys() {
            println!("         - {voice}");
        }
    }
    Ok(())
}

async fn cmd_voices(args: &[String]) -> anyhow::Result<()> {
    let Some(code) = args.first() else {
        bail!("usage: tts-session-cli voices <language>");
    };
    let session = open_session(args, None).await?;
    for voice in session.select_language(code)? {
        println!("{voice}");
    }
    Ok(())
}

async fn cmd_speak(args: &[String]) -> anyhow::Result<()> {
    let Some(text) = args.first().filter(|a| !a.starts_with("--")) else {
        bail!("usage: tts-session-cli speak <text> [options]");
    };
    let download = args.iter().any(|a| a == "--download");
    let player = CommandPlayer::new(
        flag_value(args, "--player").unwrap_or("ffplay"),
        ["-nodisp", "-autoexit", "-loglevel", "quiet", "-i", "-"],
    );
    let session = open_session(args, Some(player)).await?;

    if let Some(lang) = flag_value(args, "--lang") {
        session.select_language(lang)?;
    }
    if let Some(voice) = flag_value(args, "--voice") {
        session.select_voice(voice)?;
    }
    let speed: i32 = flag_value(args, "--speed")
        .map(str::parse::<i32>)
        .transpose()
        .context("--speed must be an integer")?
        .unwrap_or(0);
    let quality: Quality = flag_value(args, "--quality").unwrap_or("standard").parse()?;
    let format: AudioFormat = flag_value(args, "--format").unwrap_or("mp3").parse()?;

    session.set_text(text.as_str());
    println!("{} characters", session.visible_char_count());
    let request = session.compose_request(speed, quality, format)?;
    let audio = session.request_synthesis(&request).await?;

    if download {
        let saved = session.consume_for_download(&audio, quality).await?;
        println!("saved {} ({} bytes)", saved.path.display(), saved.size_bytes);
        return Ok(());
    }

    match session.consume_for_playback(&audio)? {
        PlaybackOutcome::Started(handle) => {
            let stopper = session.clone();
            tokio::select! {
                end = handle.finished() => { end?; }
                _ = tokio::signal::ctrl_c() => { stopper.stop_playback(); }
            }
        }
        PlaybackOutcome::UseDownload { note } => println!("{note} (pass --download)"),
    }
    Ok(())
}

async fn cmd_health(args: &[String]) -> anyhow::Result<()> {
    let session = SessionController::connect(load_config(args)?)?;
    let health = session.check_health().await?;
    println!(
        "{} ({} languages)",
        health.status,
        health
            .languages_supported
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string())
    );
    Ok(())
}
