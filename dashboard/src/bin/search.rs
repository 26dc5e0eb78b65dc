//! Search dashboard - results, filters, pagination and product details in the terminal.

use dashboard::commands::{self, Command, HELP};
use dashboard::render;
use shared::epd::{ids_from_csv, ScanRequest};
use shared::{ApiClient, Config, Error, FilterChange, SearchController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

async fn handle(controller: &mut SearchController, command: Command) -> shared::Result<Option<String>> {
    let outcome = match command {
        Command::Search(query) => controller.search(query).await,
        Command::ToggleCategory(name) => controller.change_filter(FilterChange::ToggleCategory(name)).await,
        Command::ToggleManufacturer(name) => {
            controller.change_filter(FilterChange::ToggleManufacturer(name)).await
        }
        Command::ToggleCertification(name) => {
            controller.change_filter(FilterChange::ToggleCertification(name)).await
        }
        Command::ToggleCertifications => controller.change_filter(FilterChange::ToggleCertifications).await,
        Command::ToggleCarbonData => controller.change_filter(FilterChange::ToggleCarbonData).await,
        Command::ClearFilters => controller.change_filter(FilterChange::Clear).await,
        Command::Page(page) => controller.go_to_page(page).await,
        Command::NextPage => controller.next_page().await,
        Command::PreviousPage => controller.previous_page().await,

        // Everything below renders its own output and leaves the results alone.
        Command::Manufacturers(term) => {
            let matches = controller.manufacturer_matches(&term);
            return Ok(Some(render::filter_options("Manufacturers", &matches)));
        }
        Command::Categories => {
            let categories: Vec<_> = controller.filter_options().categories.iter().collect();
            return Ok(Some(render::filter_options("Categories", &categories)));
        }
        Command::Show(id) => {
            let product = controller.product_detail(&id).await?;
            return Ok(Some(render::product_detail(&product)));
        }
        Command::Lookup(raw_id) => {
            let product = controller.client().lookup_product(&raw_id).await?;
            return Ok(Some(render::product_detail(&product)));
        }
        Command::Similar(id) => {
            let similar = controller.client().similar(&id).await?;
            return Ok(Some(render::similar(&similar)));
        }
        Command::Stats => {
            let stats = controller.stats().await?;
            return Ok(Some(render::stats(&stats)));
        }
        Command::Certifications => {
            let names = controller.client().certifications().await?;
            return Ok(Some(render::certifications(&names)));
        }
        Command::Health => {
            let health = controller.client().health().await?;
            return Ok(Some(render::health(&health)));
        }
        Command::Scan(ids) => {
            let scan = controller.client().scan(&ScanRequest::new(ids)).await?;
            return Ok(Some(render::scan(&scan)));
        }
        Command::ScanFile(file) => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .map_err(|source| Error::File {
                    path: file.clone(),
                    source,
                })?;
            let ids = ids_from_csv(&text);
            info!(file = %file, ids = ids.len(), "Loaded scan ids");
            let scan = controller.client().scan(&ScanRequest::new(ids)).await?;
            return Ok(Some(render::scan(&scan)));
        }
        Command::ScanReport(scan_id) => {
            let report = controller.client().scan_report(scan_id).await?;
            return Ok(Some(render::scan_report(&report)));
        }
        Command::ScanExport { scan_id, path } => {
            let csv = controller.client().export_scan(scan_id).await?;
            let path = path.unwrap_or_else(|| format!("epd_scan_{}.csv", scan_id));
            tokio::fs::write(&path, csv)
                .await
                .map_err(|source| Error::File {
                    path: path.clone(),
                    source,
                })?;
            return Ok(Some(format!("Saved scan #{} to {}", scan_id, path)));
        }
        Command::Help => return Ok(Some(HELP.to_string())),
        Command::Quit => return Ok(None),
    };

    // Failed searches are already reflected in the view.
    if let Err(e) = outcome {
        warn!(error = %e, "Search request failed");
    }
    Ok(Some(render::results(&controller.view())))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dashboard::init_tracing();

    let config = Config::from_env()?;
    info!(api = %config.api_base_url, per_page = config.per_page, "Starting search dashboard");

    let mut controller = SearchController::new(ApiClient::from_config(&config), config.per_page);
    if let Err(e) = controller.load_filter_options().await {
        warn!(error = %e, "Could not load filter options");
        println!("Filters unavailable: {}", e.user_message());
    }

    if let Err(e) = controller.search("").await {
        warn!(error = %e, "Initial browse failed");
    }
    println!("{}", render::results(&controller.view()));
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match handle(&mut controller, command).await {
            Ok(Some(output)) => println!("{}", output),
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Command failed");
                println!("Error: {}", e.user_message());
            }
        }
    }

    Ok(())
}
