//! Parlance host binary - composition root.
//!
//! Ties the crates together into a runnable demonstration against the
//! in-memory engine:
//! 1. Load configuration from TOML
//! 2. Resolve the engine capabilities through a provider
//! 3. Build the grammar service and load a demo grammar
//! 4. Activate a rule, push one recognition through the engine, print it
//! 5. Tear every session down
//!
//! A live deployment swaps the mock provider for one backed by a real
//! engine connection; everything downstream of `EngineConnection::connect`
//! is identical.

use std::sync::Arc;

use clap::Parser;

use parlance_core::config::ParlanceConfig;
use parlance_engine::mock::{MockProvider, MockResultGraph, MockWindowSystem};
use parlance_engine::{current_profile_name, EngineConnection, PhraseFlags};
use parlance_grammar::GrammarService;

mod cli;

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first; its log level is the fallback filter.
    let config_file = args.resolve_config_path();
    let config = ParlanceConfig::load_or_default(&config_file);

    let filter = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    tracing::info!("Starting Parlance v{}", env!("CARGO_PKG_VERSION"));

    // Engine connection. The mock provider stands in for a live engine.
    let provider = MockProvider::new();
    let engine = provider.engine().clone();
    let connection = EngineConnection::connect(&provider)?;

    if let Ok(version) = connection.control.version() {
        tracing::info!(%version, "Engine version");
    }
    match current_profile_name(connection.speaker.as_ref()) {
        Ok(Some(profile)) => tracing::info!(profile, "Speaker profile"),
        Ok(None) => tracing::info!("No speaker profile selected"),
        Err(e) => tracing::warn!(error = %e, "Profile query failed"),
    }

    let service = Arc::new(GrammarService::new(
        &connection,
        Arc::new(MockWindowSystem { valid: true }),
        &config,
    )?);

    // Log the service's domain events as they happen.
    let mut events = service.subscribe_events();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(event = ?event, "Grammar event");
        }
    });

    // Demo grammar: load, activate, recognize one phrase, tear down.
    let grammar_id = parlance_core::types::GrammarId::new();
    let mut results = service.load_grammar(grammar_id, b"demo command grammar")?;
    service.activate_rule(grammar_id, None, &args.rule)?;

    let words: Vec<(u32, u32, &str)> = args
        .phrase
        .split_whitespace()
        .enumerate()
        .map(|(i, text)| (i as u32 + 1, u32::from(i == 0), text))
        .collect();
    let sink = engine
        .last_grammar_sink()
        .ok_or("engine did not retain the grammar sink")?;
    sink.phrase_finish(
        PhraseFlags::RECOGNIZED,
        Some(Box::new(MockResultGraph::from_words(&words))),
    );

    match results.recv().await {
        Some(result) => {
            tracing::info!(rule_tag = ?result.rule_tag, "Recognized: {}", result.phrase());
            println!("{}", result.phrase());
        }
        None => tracing::warn!("No recognition delivered"),
    }

    service.deactivate_rule(grammar_id, &args.rule)?;
    service.unload_all();

    drop(service);
    event_task.abort();

    tracing::info!("Parlance shut down");
    Ok(())
}
