//! `maildraft draft`: Draft one reply from the terminal.
//!
//! The arguments go through the same validation as `POST /ai-draft`.

use maildraft_config::AppConfig;
use maildraft_gateway::{local_orchestrator, validate_draft_request};
use serde_json::json;

pub async fn run(
    config: AppConfig,
    question: String,
    model: Option<String>,
    session: Option<String>,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = validate_draft_request(&json!({
        "question": question,
        "modelId": model,
        "requestSessionId": session,
    }))?;

    let orchestrator = local_orchestrator(&config)?;
    let draft = orchestrator
        .draft(&request)
        .await
        .map_err(|e| format!("{} ({e})", e.public_message()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&draft)?);
        return Ok(());
    }

    println!("{}", draft.response);
    println!();
    match &draft.citation {
        Some(citation) => println!("Source: {citation}"),
        None => println!("Source: none (no relevant knowledge found)"),
    }

    Ok(())
}
