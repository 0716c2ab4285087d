//! `maildraft serve`: Start the public HTTP gateway.

use maildraft_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    port_override: Option<u16>,
    upstream: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(url) = upstream {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("--upstream must be an http(s) URL, got '{url}'").into());
        }
        config.gateway.upstream_url = Some(url);
    }

    println!("📨 maildraft gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    match &config.gateway.upstream_url {
        Some(url) => println!("   Mode: proxy → {url}"),
        None => println!("   Mode: in-process (model {})", config.default_model.label()),
    }

    maildraft_gateway::start(config).await?;

    Ok(())
}
