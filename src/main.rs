use clap::Parser;
use topic2crossword::adapters::{LocalStorage, OllamaClient, QuestionsFileSource};
use topic2crossword::core::ClueSource;
use topic2crossword::utils::{logger, validation::Validate};
use topic2crossword::{
    CliConfig, ClueGenerator, CrosswordConfig, CrosswordEngine, CrosswordError, CrosswordPipeline,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::debug!("CLI args: {:?}", args);

    if let Err(e) = run(&args).await {
        tracing::error!(
            "❌ Crossword generation failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

async fn run(args: &CliConfig) -> Result<(), CrosswordError> {
    let config = args.resolve()?;
    config.validate()?;
    tracing::info!("✅ Configuration loaded and validated");

    if args.dry_run {
        display_config_summary(&config, &args.topic);
        return Ok(());
    }

    let source: Box<dyn ClueSource> = match &config.generator.questions_file {
        Some(path) => Box::new(QuestionsFileSource::new(path.clone())),
        None => Box::new(OllamaClient::new(&config.generator)?),
    };
    let generator = ClueGenerator::new(source, config.generator.clone());

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output.output_path.clone());
    let pipeline = CrosswordPipeline::new(storage, generator, config);
    let mut engine = CrosswordEngine::new_with_monitoring(pipeline, monitor_enabled);

    let report = engine.run(&args.topic).await?;

    tracing::info!(
        "✅ Crossword completed: {} words on a {}x{} grid",
        report.placed,
        report.rows,
        report.cols
    );
    if !report.dropped.is_empty() {
        println!("⚠️ Left out: {}", report.dropped.join(", "));
    }
    println!("✅ Crossword for '{}' created!", args.topic);
    for file in &report.files {
        println!("📁 {}", file);
    }

    Ok(())
}

fn display_config_summary(config: &CrosswordConfig, topic: &str) {
    println!("📋 Configuration Summary:");
    println!("  Topic: {}", topic);
    match &config.generator.questions_file {
        Some(path) => println!("  Source: questions file {}", path),
        None => println!(
            "  Source: {} (model {})",
            config.generator.endpoint, config.generator.model
        ),
    }
    println!(
        "  Words: {} requested, {} placed minimum",
        config.generator.word_count, config.layout.min_words
    );
    println!("  Timeout: {}s", config.generator.timeout_seconds);
    println!(
        "  Grid limit: {}x{}",
        config.layout.max_rows, config.layout.max_cols
    );
    println!("  Output: {}", config.output.output_path);
    println!("  Formats: {}", config.output.formats.join(", "));
    if config.output.bundle {
        println!("  Bundle: ZIP");
    }
    println!("  🔍 DRY RUN MODE - nothing generated");
}
