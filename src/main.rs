use anyhow::Context;
use clap::Parser;
use prestations_client::config::Command;
use prestations_client::utils::{logger, validation::Validate};
use prestations_client::{group_by_categorie, CliConfig, PrestationsService, ReqwestTransport};
use serde::Serialize;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve_client_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config '{}': {}", cli.config, e);
            eprintln!("💡 Pass --base-url or create the file with an [api] section");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if cli.json_logs || config.json_logs() {
        logger::init_json_logger(cli.verbose, config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    tracing::debug!("Using API at {}", config.api.base_url);

    // 單一長生命週期的服務實例
    let transport = ReqwestTransport::from_config(&config).context("building HTTP transport")?;
    let service = PrestationsService::new(transport);

    let outcome = run(&service, &cli.command).await;

    if let Err(e) = outcome {
        tracing::error!("❌ Request failed: {} (Category: {:?})", e, e.category());
        eprintln!("❌ {}", e.user_friendly_message());
        let exit_code = if e.is_not_found() { 4 } else { 1 };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run(
    service: &PrestationsService<ReqwestTransport>,
    command: &Command,
) -> prestations_client::Result<()> {
    match command {
        Command::Prestations { grouped, .. } => {
            let filter = command.prestation_filter().unwrap_or_default();
            let prestations = service.search_prestations(&filter).await?;
            if *grouped {
                print_json(&group_by_categorie(&prestations))
            } else {
                print_json(&prestations)
            }
        }
        Command::Prestation { id } => print_json(&service.get_prestation(*id).await?),
        Command::Demander { .. } => {
            let Some(demande) = command.new_demande() else {
                return Ok(());
            };
            let created = service.create_demande(&demande).await?;
            tracing::info!("✅ Demande {} created ({})", created.id, created.statut);
            print_json(&created)
        }
        Command::Demandes { user_id } => print_json(&service.list_demandes(*user_id).await?),
        Command::Demande { id } => print_json(&service.get_demande(*id).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> prestations_client::Result<()> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(prestations_client::ClientError::Encode)?;
    println!("{}", rendered);
    Ok(())
}
