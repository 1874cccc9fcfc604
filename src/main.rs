// Entry point and high-level CLI flow.
//
// - Option [1] loads the stock and scan exports, printing diagnostics.
// - Option [2] reconciles them under a chosen grouping, writes the reports
//   and previews them.
// - Option [3] watches the exports, re-reconciling on the refresh interval.
use chrono::Local;
use once_cell::sync::Lazy;
use paddy_stock::aggregate::{aggregate, DateWindow};
use paddy_stock::config::StockConfig;
use paddy_stock::loader::{load_records, LoadReport};
use paddy_stock::normalize::normalize_all;
use paddy_stock::refresh::{spawn_refresh, FileSource};
use paddy_stock::series::{daily_series, latest_change, select_period, Period};
use paddy_stock::types::{GroupMode, RawRecord};
use paddy_stock::util::{format_int, format_number};
use paddy_stock::{output, reconcile, reports, summarize_window};
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::error;
use tracing_subscriber::EnvFilter;

// Loaded once via option [1], reused by every report run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    stock: Option<Vec<RawRecord>>,
    scans: Option<Vec<RawRecord>>,
}

/// Print `prompt` and read one trimmed line.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    read_line("Enter choice: ")
}

fn prompt_group_mode() -> GroupMode {
    loop {
        match read_line("Group by (type/date/weekday/none) [type]: ").as_str() {
            "" => return GroupMode::ByType,
            other => match other.parse() {
                Ok(mode) => return mode,
                Err(e) => println!("{}", e),
            },
        }
    }
}

fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Back to main menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn print_load(label: &str, report: &LoadReport) {
    println!(
        "{}: {} rows loaded ({} skipped)",
        label,
        format_int(report.loaded_rows as u64),
        format_int(report.parse_errors as u64)
    );
}

/// Handle option [1]: load both exports into `APP_STATE`.
fn handle_load(config: &StockConfig) {
    let stock = match load_records(&config.stock_path) {
        Ok((records, report)) => {
            print_load("Stock", &report);
            records
        }
        Err(e) => {
            error!(path = %config.stock_path.display(), error = %e, "stock load failed");
            eprintln!("Failed to load {}: {}\n", config.stock_path.display(), e);
            return;
        }
    };
    let scans = match load_records(&config.scans_path) {
        Ok((records, report)) => {
            print_load("Scans", &report);
            records
        }
        Err(e) => {
            error!(path = %config.scans_path.display(), error = %e, "scan load failed");
            eprintln!("Failed to load {}: {}\n", config.scans_path.display(), e);
            return;
        }
    };
    println!();

    let mut state = APP_STATE.lock().unwrap_or_else(|p| p.into_inner());
    state.stock = Some(stock);
    state.scans = Some(scans);
}

/// Handle option [2]: reconcile, write reports, preview them.
fn handle_generate_reports(config: &StockConfig) {
    let (stock, scans) = {
        let state = APP_STATE.lock().unwrap_or_else(|p| p.into_inner());
        (state.stock.clone(), state.scans.clone())
    };
    let (Some(stock), Some(scans)) = (stock, scans) else {
        println!("Error: No data loaded. Please load the files first (option 1).\n");
        return;
    };

    let mode = prompt_group_mode();
    let result = reconcile(&stock, &scans, mode);

    println!("\nGenerating reports...\n");

    let net_rows = reports::net_stock_rows(&result);
    let net_file = config.output_path(&format!("net_stock_{}.csv", mode.label()));
    if let Err(e) = output::write_csv(&net_file, &net_rows) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(
        &format!("Net Available Stock (by {})", mode),
        Some("gross intake minus scanned, clamped at zero"),
        &net_rows,
        config.preview_rows,
    );
    println!("(Full table exported to {})\n", net_file.display());

    let stock_rows = normalize_all(&stock);
    let points = daily_series(&aggregate(&stock_rows, GroupMode::ByDate));
    let week = select_period(&points, Period::ThisWeek);
    let trend = reports::trend_rows(&points);
    let trend_file = config.output_path("daily_trend.csv");
    if let Err(e) = output::write_csv(&trend_file, &trend) {
        eprintln!("Write error: {}", e);
    }
    output::preview_table(
        "Daily Stock Intake",
        Some("this week"),
        &reports::trend_rows(&week),
        7,
    );
    let change = latest_change(&week);
    println!(
        "({}{}%) change compared to the previous day.\n",
        if change >= 0 { "+" } else { "" },
        change
    );

    let today = Local::now().date_naive();
    let scanned_today = summarize_window(&normalize_all(&scans), DateWindow::day(today));
    println!(
        "Scanned today: {} entries, {} bags, {} Qtl\n",
        format_int(scanned_today.entries as u64),
        format_int(scanned_today.bags_count),
        format_number(scanned_today.kilograms / 100.0, 2)
    );

    let summary = reports::summary(&result);
    let summary_file = config.output_path("stock_summary.json");
    if let Err(e) = output::write_json(&summary_file, &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary ({}):", summary_file.display());
    println!(
        "{{\"net_bags\": {}, \"net_kg\": {}, \"net_qtl\": {}}}\n",
        format_int(summary.net.bags),
        format_number(summary.net.kg, 2),
        format_number(summary.net.qtl, 2)
    );
}

/// Handle option [3]: run the refresh loop for a few ticks.
fn handle_watch(config: &StockConfig) {
    let ticks: u64 = match read_line("Number of refreshes [3]: ").as_str() {
        "" => 3,
        s => match s.parse() {
            Ok(n) if n > 0 => n,
            _ => {
                println!("Invalid number.\n");
                return;
            }
        },
    };

    let source = FileSource::from_config(config);
    let handle = match spawn_refresh(source, GroupMode::NoGroup, config.refresh_interval()) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Failed to start refresh: {}\n", e);
            return;
        }
    };

    println!(
        "Watching {} and {} every {}s...",
        config.stock_path.display(),
        config.scans_path.display(),
        config.refresh_secs
    );
    for event in handle.events().iter().take(ticks as usize) {
        let t = &event.result.totals;
        println!(
            "[{}] {} net: {} bags, {} kg, {} Qtl",
            event.tick,
            Local::now().format("%H:%M:%S"),
            format_int(t.net_bags),
            format_number(t.net_kg, 2),
            format_number(t.net_quintals, 2)
        );
    }
    handle.stop();
    println!();
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = match StockConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to read config: {}", e);
            std::process::exit(2);
        }
    };

    loop {
        println!("Paddy Stock Reconciliation");
        println!("[1] Load stock and scan files");
        println!("[2] Generate reports");
        println!("[3] Watch stock");
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&config),
            "2" => {
                println!();
                handle_generate_reports(&config);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => handle_watch(&config),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0, 1, 2 or 3.\n"),
        }
    }
}
