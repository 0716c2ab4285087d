//! `maildraft orchestrator`: Start the standalone orchestrator endpoint.

use maildraft_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.orchestrator.port = port;
    }

    println!("📨 maildraft orchestrator");
    println!(
        "   Listening: {}:{} (POST /draft)",
        config.orchestrator.host, config.orchestrator.port
    );

    maildraft_gateway::start_orchestrator(config).await?;

    Ok(())
}
