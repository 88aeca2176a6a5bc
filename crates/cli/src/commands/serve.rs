//! `salespulse serve` — Start the HTTP API server.

use salespulse_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = host_override {
        config.gateway.host = host;
    }
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("📈 SalesPulse Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Dataset:   {}", config.dataset.path.display());
    println!("   Model:     {} ({})", config.default_model, config.default_provider);

    salespulse_gateway::start(config).await?;

    Ok(())
}
