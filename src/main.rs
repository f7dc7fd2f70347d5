//! FireWatch Core - Main Entry Point
//!
//! Thin command dispatcher over the service; the real consumers are the
//! presentation and assistant layers calling into the library.

use firewatch_core::api::commands::{
    DetectionQuery, GeneratePredictionsRequest, RefreshRequest, StatsRequest,
};
use firewatch_core::{CoreResult, FireService};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(
        "Starting {} core v{}...",
        firewatch_core::constants::APP_NAME,
        firewatch_core::constants::APP_VERSION
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");

    let result = run(command);
    if let Err(e) = result {
        log::error!("{command} failed: {e}");
        std::process::exit(1);
    }
}

fn run(command: &str) -> CoreResult<()> {
    if command == "help" {
        print_usage();
        return Ok(());
    }

    let service = FireService::open_default()?;

    match command {
        "refresh" => {
            let response = service.refresh_fire_data(RefreshRequest::default())?;
            print_json(&response);
        }
        "train" => {
            let response = service.train_model()?;
            print_json(&response);
        }
        "generate" => {
            let response = service.generate_predictions(GeneratePredictionsRequest::default())?;
            print_json(&response);
        }
        "recent" => {
            let detections = service.get_recent_fires(Some(10))?;
            print_json(&detections);
        }
        "detections" => {
            let detections = service.get_fire_detections(DetectionQuery::default())?;
            print_json(&detections);
        }
        "stats" => {
            let stats = service.get_fire_statistics(StatsRequest::default())?;
            print_json(&stats);
        }
        other => {
            log::error!("Unknown command '{other}'");
            print_usage();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialise response: {e}"),
    }
}

fn print_usage() {
    println!("usage: firewatch-core <refresh|train|generate|recent|detections|stats>");
}
