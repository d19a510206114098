//! Best-of-n smoke runner.
//!
//! Drives the full engine against a live OpenAI-compatible backend using
//! the stub codec and a fixed-transcript recognizer (so recognition error
//! is constant and the heuristic signals decide the winner), then writes
//! the selected rendering to a WAV file.
//!
//! ```text
//! bestofn --text "Hello there." [--base-url http://127.0.0.1:8000/v1]
//!         [--n 4] [--language auto] [--model id] [--output bestofn.wav]
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cantus_core::{
    audio, BestOfNEngine, ChatParams, CodecHandle, EngineConfig, Language, LlmClient, LlmConfig,
    RecognizerHandle, SynthesisRequest, VoiceReference,
};
use cantus_core::asr::FixedRecognizer;
use cantus_core::synth::StubCodec;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Args {
    base_url: String,
    api_key: Option<String>,
    text: String,
    n: usize,
    language: Language,
    model: Option<String>,
    output: PathBuf,
}

fn parse_args() -> Result<Args, String> {
    let mut base_url = "http://127.0.0.1:8000/v1".to_string();
    let mut api_key = std::env::var("CANTUS_API_KEY").ok();
    let mut text: Option<String> = None;
    let mut n: usize = 4;
    let mut language = Language::Auto;
    let mut model: Option<String> = None;
    let mut output = PathBuf::from("bestofn.wav");

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--base-url" => {
                base_url = it.next().ok_or("--base-url requires a value")?;
            }
            "--api-key" => {
                api_key = Some(it.next().ok_or("--api-key requires a value")?);
            }
            "--text" => {
                text = Some(it.next().ok_or("--text requires a value")?);
            }
            "--n" => {
                let value = it.next().ok_or("--n requires a value")?;
                n = value.parse().map_err(|_| format!("invalid --n: {value}"))?;
            }
            "--language" => {
                let value = it.next().ok_or("--language requires a value")?;
                language = Language::from_tag(&value);
            }
            "--model" => {
                model = Some(it.next().ok_or("--model requires a value")?);
            }
            "--output" => {
                output = PathBuf::from(it.next().ok_or("--output requires a value")?);
            }
            "--help" | "-h" => {
                return Err(
                    "usage: bestofn --text TEXT [--base-url URL] [--api-key KEY] [--n N] \
                     [--language ja|en|auto] [--model ID] [--output PATH]"
                        .into(),
                );
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(Args {
        base_url,
        api_key,
        text: text.ok_or("--text is required")?,
        n: n.max(1),
        language,
        model,
        output,
    })
}

fn main() {
    if let Err(e) = run() {
        eprintln!("bestofn failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = parse_args().map_err(|e| anyhow::anyhow!(e))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let llm = Arc::new(LlmClient::new(LlmConfig {
            base_url: args.base_url.clone(),
            api_key: args.api_key.clone(),
            timeout: Duration::from_secs(120),
            ..LlmConfig::default()
        })?);
        let codec = CodecHandle::new(StubCodec::default());
        let recognizer = RecognizerHandle::new(FixedRecognizer::new(args.text.clone()));
        let engine = BestOfNEngine::new(llm, codec, Some(recognizer), EngineConfig::default());

        let synthesis = engine
            .synthesize(SynthesisRequest {
                text: args.text.clone(),
                reference: VoiceReference::Embedding(Vec::new()),
                params: ChatParams {
                    model: args.model.clone(),
                    ..ChatParams::default()
                },
                candidates: args.n,
                language: args.language,
            })
            .await?;

        let wav = audio::write_wav_bytes(&synthesis.audio)?;
        std::fs::write(&args.output, wav)?;

        println!(
            "selected candidate {}/{} — {} tokens, {:.2}s audio → {}",
            synthesis.selected_index + 1,
            synthesis.candidate_count,
            synthesis.tokens.len(),
            synthesis.audio.duration_secs(),
            args.output.display()
        );
        println!("timings: {}", serde_json::to_string(&synthesis.timings)?);
        Ok(())
    })
}
