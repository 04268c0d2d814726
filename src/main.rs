use clap::Parser;
use hierarchical_map::core::controls::Notice;
use hierarchical_map::core::ConfigProvider;
use hierarchical_map::utils::error::{ErrorSeverity, MapError};
use hierarchical_map::utils::{logger, validation::Validate};
use hierarchical_map::{
    CliConfig, FlatLayerViewer, HierarchicalControls, HttpLocationSource,
    InMemorySurface, LocalStorage, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting hierarchical-map CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let outcome = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(file_config) => run(&cli, &file_config).await,
            Err(e) => Err(e),
        },
        None => run(&cli, &cli).await,
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ Map session failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run<C: ConfigProvider + Validate>(cli: &CliConfig, config: &C) -> Result<(), MapError> {
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let source = HttpLocationSource::from_config(config)?;
    if cli.legacy {
        run_flat(cli, source).await
    } else {
        run_hierarchical(cli, config, source).await
    }
}

async fn run_hierarchical<C: ConfigProvider>(
    cli: &CliConfig,
    config: &C,
    source: HttpLocationSource,
) -> Result<(), MapError> {
    let options = cli.control_options(config);
    let mut controls = HierarchicalControls::new(source, InMemorySurface::new(), options);

    controls.init().await?;
    if let Some(domain) = &cli.domain {
        controls.select_domain(Some(domain.as_str())).await?;
    }

    if let Some(query) = &cli.search {
        let found = controls.search(query).await?;
        println!("🔎 {} result(s) for \"{}\"", found.len(), query);
        for location in &found {
            println!("  - {} ({}) {}", location.name, location.id, location.address);
        }
        return Ok(());
    }

    if !cli.categories.is_empty() {
        controls.deselect_all_categories();
        for category_id in &cli.categories {
            if let Err(e) = controls.toggle_category(category_id, true) {
                tracing::warn!("Skipping category: {}", e);
            }
        }
    }

    if let Some(location_id) = &cli.zoom_to {
        controls.zoom_to_location(location_id)?;
    }
    if cli.fit {
        controls.fit_to_visible();
    }

    print_summary(&controls);
    if cli.list {
        print_locations(&controls);
    }

    if cli.export.is_some() {
        let storage = LocalStorage::new(cli.export_dir(config));
        let file_name = controls.export_to(&storage).await?;
        println!(
            "📁 Export saved to: {}",
            storage.base_path().join(file_name).display()
        );
    }

    Ok(())
}

fn print_summary(controls: &HierarchicalControls<HttpLocationSource, InMemorySurface>) {
    match controls.engine().selected_domain() {
        Some(domain_id) => println!("🗺  Domain: {}", domain_id),
        None => println!("🗺  No domain selected"),
    }
    if let Some(info) = controls.domain_info() {
        println!("{}", info);
    }
    if let Some(line) = controls.stats_line() {
        println!("📊 {}", line);
    }

    match controls.category_placeholder() {
        Some(placeholder) => println!("{}", placeholder),
        None => {
            for item in controls.category_list() {
                let mark = if item.checked { "x" } else { " " };
                println!(
                    "  [{}] {} {} ({})",
                    mark, item.name, item.color, item.location_count
                );
            }
        }
    }

    let summary = controls.location_summary();
    println!("📍 Showing {} of {} locations", summary.visible, summary.total);

    match controls.notice() {
        Some(Notice::Error(message)) => eprintln!("❌ {}", message),
        Some(Notice::Info(message)) => println!("ℹ️  {}", message),
        None => {}
    }
}

fn print_locations(controls: &HierarchicalControls<HttpLocationSource, InMemorySurface>) {
    if let Some(placeholder) = controls.location_placeholder() {
        println!("{}", placeholder);
        return;
    }
    for item in controls.location_list() {
        println!("  - {} [{}]", item.name, item.categories);
        println!("    {}", item.address);
        if let Some(phone) = &item.phone {
            println!("    📞 {}", phone);
        }
        if let Some(email) = &item.email {
            println!("    ✉️  {}", email);
        }
    }
}

async fn run_flat(cli: &CliConfig, source: HttpLocationSource) -> Result<(), MapError> {
    let mut viewer = FlatLayerViewer::new(source, InMemorySurface::new());
    viewer.init().await?;

    if cli.featured_only {
        viewer.filter_featured_only(true);
    }
    if !cli.categories.is_empty() {
        viewer.show_only_category(&cli.categories[0])?;
        for category_id in &cli.categories[1..] {
            viewer.show_category(category_id)?;
        }
    }

    let counts = viewer.layer_counts();
    for category in viewer.categories() {
        let count = counts
            .iter()
            .find(|(id, _)| id == &category.id)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        let mark = if viewer.is_shown(&category.id) { "x" } else { " " };
        println!("  [{}] {} {} ({})", mark, category.name, category.color, count);
    }
    println!(
        "📍 {} markers drawn",
        viewer.surface().marker_count()
    );
    Ok(())
}
