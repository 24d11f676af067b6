use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use csvdeck::app::{run_browser, SharedStore};
use csvdeck::error_display::user_message_from_report;
use csvdeck::format::{format_file_size, format_timestamp, format_with_commas, CellFormat};
use csvdeck::logging::{init_logging, LogTarget};
use csvdeck::{
    AppConfig, CacheManager, CellValue, ChartType, ColumnKind, ConfigManager, ConsoleNotifier,
    FileSummary, LocalStore, PageResult, RecordingRenderer, SessionController, TableSession,
    APP_NAME,
};
use csvdeck_cli::{Args, Command};
use tracing::debug;

type CliController<'a> = SessionController<LocalStore, &'a mut ConsoleNotifier, RecordingRenderer>;

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error generating config: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                match cache.clear_all() {
                    Ok(0) => println!("No cache to clear"),
                    Ok(_) => println!("Cache cleared successfully"),
                    Err(e) => {
                        eprintln!("Error clearing cache: {}", e);
                        std::process::exit(1);
                    }
                }
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    Ok(None)
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if args.debug {
        config.debug.enabled = true;
    }
    if let Some(dir) = &args.data_dir {
        config.store.data_dir = Some(dir.clone());
    }
}

fn init_tracing(config: &AppConfig, browsing: bool) -> Result<()> {
    if !config.debug.enabled {
        return Ok(());
    }
    let target = if browsing {
        let cache = CacheManager::new(APP_NAME)?;
        LogTarget::File(cache.log_path())
    } else {
        LogTarget::Stderr
    };
    init_logging(&config.debug.log_filter, target)
}

fn print_page(page: &PageResult, session: &TableSession, format: CellFormat, row_numbers: bool) {
    let header: Vec<String> = page.columns.iter().map(|c| c.name.clone()).collect();
    let cells: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&page.columns)
                .map(|(value, col)| format.format(value, col.kind))
                .collect()
        })
        .collect();

    let first_row = session.window().map_or(1, |w| w.start_index);
    let number_width = (first_row + cells.len()).to_string().len();
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |values: &[String], number: Option<String>| {
        let mut out = String::new();
        if row_numbers {
            out.push_str(&format!("{:>width$}  ", number.unwrap_or_default(), width = number_width));
        }
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out
    };

    println!("{}", line(&header, None));
    for (idx, row) in cells.iter().enumerate() {
        println!("{}", line(row, Some((first_row + idx).to_string())));
    }

    match session.window() {
        Some(w) if w.total_pages > 0 => println!(
            "Showing {}-{} of {} rows · Page {}/{}",
            w.start_index,
            w.end_index,
            format_with_commas(page.total_row_count as u64),
            w.page_number,
            w.total_pages
        ),
        _ => println!("No rows"),
    }
}

fn print_summary(summary: &FileSummary, format: CellFormat) {
    println!(
        "{} rows, {} columns",
        format_with_commas(summary.row_count as u64),
        summary.column_count
    );
    for column in &summary.columns {
        println!();
        println!("{} ({})", column.name, column.kind.as_str());
        println!("  nulls: {}", format_with_commas(column.null_count as u64));
        if let Some(numeric) = &column.numeric {
            let number = |v: f64| format.format(&CellValue::Float(v), ColumnKind::Float);
            println!("  min: {}", number(numeric.min));
            println!("  max: {}", number(numeric.max));
            println!("  mean: {}", number(numeric.mean));
        }
        if let Some(categorical) = &column.categorical {
            println!("  unique: {}", format_with_commas(categorical.unique_count as u64));
            if let Some((value, count)) = &categorical.most_frequent {
                println!("  most frequent: {} ({})", value, format_with_commas(*count as u64));
            }
        }
    }
}

fn run_command(command: Command, config: &AppConfig, controller: &mut CliController) -> Result<()> {
    match command {
        Command::Upload { path } => {
            let record = controller.upload_path(&path)?;
            println!("id: {}", record.id);
        }
        Command::List => {
            controller.refresh()?;
            if controller.catalog().is_empty() {
                println!("No files uploaded");
            }
            for file in controller.catalog().iter() {
                println!(
                    "{}  {}  {}  {} rows  {}",
                    file.id,
                    file.display_name,
                    format_file_size(file.size_bytes),
                    format_with_commas(file.row_count as u64),
                    format_timestamp(&file.created_at)
                );
            }
        }
        Command::Show {
            file,
            page,
            page_size,
        } => {
            controller.refresh()?;
            if let Some(size) = page_size {
                controller.set_page_size(size)?;
            }
            let fetch = controller.open_query(&file)?;
            controller.execute(fetch);
            if page != 1 {
                let fetch = controller.go_to(page)?;
                controller.execute_opt(fetch);
            }
            let session = controller.session();
            let page = session
                .page()
                .ok_or_else(|| eyre!("No page could be loaded for {}", file))?;
            print_page(page, session, config.cell_format(), config.display.row_numbers);
        }
        Command::Summary { file } => {
            controller.refresh()?;
            let id = controller
                .catalog()
                .find(&file)
                .map(|f| f.id)
                .ok_or_else(|| csvdeck::Error::UnknownFile(file.clone()))?;
            let summary = controller.summary(id)?;
            print_summary(&summary, config.cell_format());
        }
        Command::Chart {
            file,
            chart_type,
            x,
            y,
        } => {
            controller.refresh()?;
            controller.open_query(&file)?;
            let chart_type = chart_type.as_deref().map(ChartType::from_str).transpose()?;
            let chart = controller.chart_mut();
            chart.set_chart_type(chart_type);
            chart.set_x_column(x);
            chart.set_y_column(y);
            let rendered = controller.generate_chart()?;
            println!("{}", rendered.title());
        }
        Command::Delete { file } => {
            controller.refresh()?;
            let id = controller
                .catalog()
                .find(&file)
                .map(|f| f.id)
                .ok_or_else(|| csvdeck::Error::UnknownFile(file.clone()))?;
            controller.delete_file(id)?;
        }
        // the browser owns the terminal and is started from main
        Command::Browse { .. } => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;

    let mut config = AppConfig::load(APP_NAME)?;
    apply_overrides(&mut config, &args);

    let command = args.command.clone().unwrap_or(Command::Browse { file: None });
    let browsing = matches!(command, Command::Browse { .. });
    init_tracing(&config, browsing)?;

    let data_dir = config.data_dir(APP_NAME)?;
    debug!(data_dir = %data_dir.display(), "using data directory");
    let store = LocalStore::new(data_dir);

    if let Command::Browse { file } = command {
        let shared: SharedStore = Arc::new(store);
        if let Err(e) = run_browser(shared, &config, file.as_deref()) {
            eprintln!("Error: {}", user_message_from_report(&e));
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut notifier = ConsoleNotifier::default();
    let result = {
        let mut controller = SessionController::new(
            store,
            &mut notifier,
            RecordingRenderer::new(),
            config.upload_gate(),
            config.table_session()?,
        );
        run_command(command, &config, &mut controller)
    };
    if let Err(e) = result {
        // failures the controller already reported are not repeated
        if notifier.errors == 0 {
            eprintln!("Error: {}", user_message_from_report(&e));
        }
        std::process::exit(1);
    }
    Ok(())
}
