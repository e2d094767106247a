use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use soul_talk::room::{InProcessRoomBus, RoomBus, SessionRelay};
use soul_talk::soul_color::{self, FallbackClassifier, GeminiClassifier, SoulColorClassifier};
use soul_talk::voice::{ElevenLabsVerifier, PhraseVerifier};
use soul_talk::{spawn_ticker, AppConfig};
use talk_core::{AnswerPool, Decision, EventKind, Party, SessionHandle, SessionPhase};
use tracing::{info, warn};

/// Soul Talk: timed chats with progressive reveal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file overlaid on the environment defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted two-party session and print its events
    Demo {
        /// Chat length in seconds (overrides the configured duration)
        #[arg(long)]
        duration: Option<u32>,

        /// Milliseconds per countdown tick
        #[arg(long, default_value_t = 1000)]
        tick_ms: u64,

        /// Self's choice when time runs out
        #[arg(long, default_value = "continue")]
        self_decision: Decision,

        /// Peer's choice when time runs out
        #[arg(long, default_value = "continue")]
        peer_decision: Decision,
    },

    /// Assign a soul color to a set of onboarding answers
    Classify {
        /// One answer per argument
        #[arg(required = true)]
        answers: Vec<String>,
    },

    /// List the soul-color catalog
    Colors,

    /// Transcribe an audio file and check it against a phrase
    Verify {
        #[arg(long)]
        audio: PathBuf,

        #[arg(long)]
        phrase: String,
    },
}

const SELF_LINES: &[&str] = &[
    "hey! your prompt about night trains caught my eye",
    "do you actually sleep on them or just watch the dark go by",
    "same, I always end up at the window",
    "where was the last one headed?",
    "never been, is it worth it?",
    "adding it to the list",
];

const PEER_LINES: &[&str] = &[
    "haha hi, someone finally asked",
    "mostly watching, sleeping feels like cheating",
    "the lights from small towns are the best part",
    "Vienna to Venice, last spring",
    "the morning coming into the lagoon, yes",
    "bring a good book",
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Demo {
            duration,
            tick_ms,
            self_decision,
            peer_decision,
        } => run_demo(&config, duration, tick_ms, self_decision, peer_decision).await,
        Command::Classify { answers } => run_classify(&config, &answers).await,
        Command::Colors => {
            for color in soul_color::SOUL_COLORS.iter() {
                println!(
                    "{:<16} {:<15} {} -> {}  {} {}",
                    color.id,
                    color.name,
                    color.gradient.from,
                    color.gradient.to,
                    color.line1,
                    color.line2
                );
            }
            Ok(())
        }
        Command::Verify { audio, phrase } => run_verify(&config, &audio, &phrase).await,
    }
}

fn classifier(config: &AppConfig) -> FallbackClassifier {
    match GeminiClassifier::new(&config.gemini, config.http_timeout) {
        Ok(gemini) => FallbackClassifier::new(gemini),
        Err(e) => {
            warn!(error = %e, "Gemini not configured, colors will be assigned offline");
            FallbackClassifier::offline()
        }
    }
}

async fn run_classify(config: &AppConfig, answers: &[String]) -> Result<()> {
    let classification = classifier(config)
        .classify(answers)
        .await
        .context("Classification failed")?;
    let color = classification
        .color()
        .context("Classifier returned a color outside the catalog")?;

    println!("{} ({})", color.name, color.id);
    println!("  {}", color.line1);
    println!("  {}", color.line2);
    if !classification.reasoning.is_empty() {
        println!("  reasoning: {}", classification.reasoning);
    }
    Ok(())
}

async fn run_verify(config: &AppConfig, audio: &std::path::Path, phrase: &str) -> Result<()> {
    let verifier = ElevenLabsVerifier::new(&config.elevenlabs, config.http_timeout)
        .context("Voice verifier unavailable")?;
    let bytes = std::fs::read(audio)
        .with_context(|| format!("Failed to read audio file {}", audio.display()))?;
    let result = verifier
        .verify(&bytes, phrase)
        .await
        .context("Voice verification failed")?;

    println!("transcript: {}", result.transcript);
    if !result.verified {
        bail!("phrase not recognized");
    }
    println!("verified");
    Ok(())
}

async fn run_demo(
    config: &AppConfig,
    duration: Option<u32>,
    tick_ms: u64,
    self_decision: Decision,
    peer_decision: Decision,
) -> Result<()> {
    if self_decision == Decision::Pending || peer_decision == Decision::Pending {
        bail!("decisions must be 'continue' or 'end'");
    }

    let mut session_config = config.session.clone();
    if let Some(secs) = duration {
        session_config.active_duration_secs = secs;
    }
    let handle = SessionHandle::with_config(
        session_config,
        AnswerPool::from_pairs([
            ("What are you chasing lately?", "Quiet mornings"),
            ("A song on repeat?", "Holocene"),
            ("Best trip you've taken?", "Lisbon in the rain"),
        ]),
        AnswerPool::from_pairs([
            ("What are you chasing lately?", "A new city"),
            ("A song on repeat?", "Motion Sickness"),
            ("Best trip you've taken?", "Night train to Venice"),
        ]),
    )
    .context("Failed to create session")?;
    info!(session_id = %handle.id(), "Demo session started");

    let bus = Arc::new(InProcessRoomBus::new());
    let room_id = format!("room-{}", handle.id().short());
    let mut room = bus.subscribe(&room_id);
    let relay = SessionRelay::new(room_id.clone(), bus.clone() as Arc<dyn RoomBus>).spawn(&handle);

    let printer = tokio::spawn(async move {
        while let Ok(envelope) = room.recv().await {
            let done = matches!(envelope.event.kind, EventKind::Ended { .. });
            println!("#{:<3} {}", envelope.sequence, describe(&envelope.event.kind));
            if done {
                break;
            }
        }
    });

    let tick = Duration::from_millis(tick_ms.max(1));
    let ticker = spawn_ticker(handle.clone(), tick);

    // Pre-match: one line every half tick until time runs out
    let pace = tick / 2;
    let mut lines = SELF_LINES.iter().zip(PEER_LINES.iter()).cycle();
    while handle.phase() == SessionPhase::Active {
        let Some((mine, theirs)) = lines.next() else {
            break;
        };
        for (party, text) in [(Party::Me, *mine), (Party::Peer, *theirs)] {
            if let Err(e) = handle.send(party, text) {
                info!(error = %e, "Send refused");
                break;
            }
            tokio::time::sleep(pace).await;
        }
    }
    ticker.await.context("Ticker task failed")?;

    handle.submit_decision(Party::Me, self_decision)?;
    handle.submit_decision(Party::Peer, peer_decision)?;

    if handle.phase() == SessionPhase::Matched {
        for (mine, theirs) in SELF_LINES.iter().zip(PEER_LINES.iter()) {
            handle.send(Party::Me, *mine)?;
            handle.send(Party::Peer, *theirs)?;
        }
        handle.end_session()?;
    }

    relay.await.context("Relay task failed")?;
    printer.await.context("Printer task failed")?;
    println!("{}", handle.status().status_line());
    Ok(())
}

fn describe(kind: &EventKind) -> String {
    match kind {
        EventKind::MessageAppended { message } => {
            format!("{:>5}: {}", message.party.to_string(), message.text)
        }
        EventKind::AnswerRevealed { reveal } => format!(
            "  reveal ({}): {} -> {}",
            reveal.revealed_by, reveal.answer.question, reveal.answer.answer
        ),
        EventKind::TimeRunningLow { remaining_seconds } => {
            format!("  this conversation is ending in {} seconds", remaining_seconds)
        }
        EventKind::NegotiationStarted { .. } => "  time's up: continue or end?".to_string(),
        EventKind::DecisionRecorded { party, decision } => {
            format!("  {} chose {}", party, decision)
        }
        EventKind::Matched => "  matched! the timer is off".to_string(),
        EventKind::Ended {
            prior_phase,
            reason,
        } => format!("  ended from {} ({:?})", prior_phase, reason),
    }
}
