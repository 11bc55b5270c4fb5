use clap::{Arg, Command};
use log::LevelFilter;
use phishwatch::{ClassificationService, ClassifyError, Config, DecisionStore, ForestModel};
use std::process;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("phishwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Classify URLs as phishing or legitimate and keep a log of every decision")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("phishwatch.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Check that the model loads and the decision store opens")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("Classify a URL and record the decision")
                .conflicts_with("logs")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("logs")
                .long("logs")
                .help("List recorded decisions, newest first")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Output format for --logs (table, json)")
                .value_parser(["table", "json"])
                .default_value("table"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
}

fn main() {
    let matches = cli().get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("phishwatch.yaml");

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        config.log_level()
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if !std::path::Path::new(config_path).exists() {
        log::warn!("Configuration file '{config_path}' not found, using default configuration");
    }

    let service = match build_service(&config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("❌ {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        println!("🔍 Testing configuration...");
        println!("Model: {} ({})", config.model_path, service.classifier_name());
        println!("Decision store: {}", config.database_path);
        match service.record_count() {
            Ok(count) => {
                println!("Recorded decisions: {count}");
                println!("✅ Configuration validated");
            }
            Err(e) => {
                println!("❌ Failed to read decision store: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(url) = matches.get_one::<String>("url") {
        match service.classify(url) {
            Ok(label) => println!("{label}"),
            Err(ClassifyError::EmptyInput) => {
                eprintln!("Please enter a URL.");
                process::exit(1);
            }
            Err(e) => {
                eprintln!("❌ Classification failed: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if matches.get_flag("logs") {
        let format = matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("table");
        show_logs(&service, format);
        return;
    }

    eprintln!("Nothing to do. Use --url <URL> or --logs (see --help).");
    process::exit(2);
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    if let Err(e) = config.to_file(path) {
        eprintln!("❌ Could not write {path}: {e}");
        process::exit(1);
    }
    println!("📝 Wrote {path}");
    println!("   model_path:    {}", config.model_path);
    println!("   database_path: {}", config.database_path);
    println!("Point model_path at a trained classifier before running --url.");
}

/// Load the classifier and open the store. Either failing means the service cannot start.
fn build_service(config: &Config) -> phishwatch::Result<ClassificationService> {
    let model = ForestModel::load(&config.model_path)?;
    let store = DecisionStore::open(&config.database_path)?;
    Ok(ClassificationService::new(Arc::new(model), store))
}

fn show_logs(service: &ClassificationService, format: &str) {
    let records = match service.list_all() {
        Ok(records) => records,
        Err(e) => {
            eprintln!("❌ Failed to read decision log: {e}");
            process::exit(1);
        }
    };

    if format == "json" {
        match serde_json::to_string_pretty(&records) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("❌ Failed to encode decision log: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if records.is_empty() {
        println!("📭 No decisions recorded yet");
        return;
    }

    println!("┌────────┬─────────────────────┬────────────┬──────────────────────────────────────────────┐");
    println!("│     ID │ Timestamp           │ Prediction │ URL                                          │");
    println!("├────────┼─────────────────────┼────────────┼──────────────────────────────────────────────┤");
    for record in &records {
        println!(
            "│ {:>6} │ {} │ {:<10} │ {:<44} │",
            record.id,
            record.timestamp.format(phishwatch::store::TIMESTAMP_FORMAT),
            record.label.as_str(),
            truncate_string(&record.url, 44)
        );
    }
    println!("└────────┴─────────────────────┴────────────┴──────────────────────────────────────────────┘");
    println!("  {} decisions", records.len());
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
