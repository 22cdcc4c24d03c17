use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use securethenews::history::{self, ScanHistory};
use securethenews::output;
use securethenews::scan;
use securethenews::scoring;
use securethenews::sites::{self, LeaderboardQuery, Site, SortKey, SortOrder};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 1;
const EXIT_SCAN: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score an existing pshtt JSON report (reads stdin if no file is given)
    Score {
        /// Path to the report, or "-" for stdin
        report: Option<PathBuf>,
        /// Print the scored scans as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run pshtt against configured sites and record the results
    Scan {
        /// Only scan these sites (name, domain or slug); repeatable
        #[arg(short, long = "site")]
        sites: Vec<String>,
    },
    /// Rank sites by their latest scan (default if no subcommand)
    Leaderboard {
        /// Only show sites whose name or domain contains this text
        #[arg(short, long, default_value = "")]
        search: String,
        /// Column to order by: score, name, domain, valid_https, default_https,
        /// enforces_https, downgrades_https
        #[arg(long, default_value = "score")]
        sort: String,
        /// Ascending order (default is descending)
        #[arg(long)]
        asc: bool,
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Show the scan history of one site, newest first
    History {
        /// Site name, domain or slug
        site: String,
    },
    /// List configured sites
    Sites,
}

#[derive(Parser, Debug)]
#[command(name = "stn")]
#[command(about = "Secure The News: score and rank HTTPS deployment of news sites", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/securethenews/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to scan history (defaults to ~/.config/securethenews/scans.json)
    #[arg(long, global = true)]
    history: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Leaderboard {
        search: String::new(),
        sort: "score".to_string(),
        asc: false,
        format: Format::Table,
    });
    let start_time = Instant::now();
    let use_colors = output::should_use_colors();

    // Scoring a report needs neither config nor history
    if let Commands::Score { report, json } = command {
        run_score(report, json, use_colors);
        std::process::exit(EXIT_SUCCESS);
    }

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match securethenews::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = securethenews::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let all_sites: Vec<Site> = config.sites.iter().map(Site::from).collect();
    if cli.verbose {
        eprintln!("Loaded {} sites from config", all_sites.len());
    }

    // Load scan history
    let history_path = cli
        .history
        .map(PathBuf::from)
        .unwrap_or_else(history::get_history_path);
    let mut scan_history = match history::load_history(&history_path) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("History error: {:#}", e);
            std::process::exit(EXIT_DATA);
        }
    };
    if cli.verbose {
        eprintln!("Loaded {} scans from {}", scan_history.len(), history_path.display());
    }

    // Route based on subcommand
    match command {
        Commands::Score { .. } => unreachable!("handled before loading config"),
        Commands::Scan { sites: selected } => {
            let targets = match select_sites(&all_sites, &selected) {
                Ok(t) => t,
                Err(unknown) => {
                    eprintln!("Unknown site: {}", unknown);
                    std::process::exit(EXIT_CONFIG);
                }
            };

            if targets.is_empty() {
                eprintln!("No sites configured in config file.");
                eprintln!("Add sites to ~/.config/securethenews/config.yaml:");
                eprintln!("  sites:");
                eprintln!("    - name: The Example Times");
                eprintln!("      domain: example.com");
                std::process::exit(EXIT_CONFIG);
            }

            let results = match scan::scan_sites(&targets, &config.pshtt, cli.verbose).await {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{:#}", e);
                    std::process::exit(EXIT_SCAN);
                }
            };

            // Record results and persist before printing
            let scanned: Vec<Site> = results.iter().map(|(site, _)| site.clone()).collect();
            for (_, scan) in results {
                scan_history.record(scan);
            }

            if let Err(e) = history::save_history(&history_path, &scan_history) {
                eprintln!("Failed to save scan history: {:#}", e);
                std::process::exit(EXIT_DATA);
            }

            print_leaderboard(&scanned, &scan_history, &LeaderboardQuery::default(), Format::Table, use_colors, cli.verbose);
        }
        Commands::Leaderboard {
            search,
            sort,
            asc,
            format,
        } => {
            let order_by = match SortKey::parse(&sort) {
                Ok(k) => k,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(EXIT_CONFIG);
                }
            };
            let query = LeaderboardQuery {
                search,
                order_by,
                order: if asc { SortOrder::Asc } else { SortOrder::Desc },
            };
            print_leaderboard(&all_sites, &scan_history, &query, format, use_colors, cli.verbose);
        }
        Commands::History { site } => {
            let Some(site) = all_sites.iter().find(|s| s.matches(&site)) else {
                eprintln!("Unknown site: {}", site);
                std::process::exit(EXIT_CONFIG);
            };
            println!("{} ({})", site.name, site.domain);
            println!(
                "{}",
                output::format_history(scan_history.scans_for(&site.domain), use_colors)
            );
        }
        Commands::Sites => {
            println!("{}", output::format_sites(&all_sites, use_colors));
        }
    }

    if cli.verbose {
        eprintln!();
        eprintln!("Done in {:?}", start_time.elapsed());
    }

    std::process::exit(EXIT_SUCCESS);
}

/// Score every record of a pshtt report and print the breakdowns
fn run_score(report: Option<PathBuf>, json: bool, use_colors: bool) {
    let stdout = match read_report(report.as_ref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read report: {}", e);
            std::process::exit(EXIT_DATA);
        }
    };

    let scans = match scan::scans_from_report(&stdout, "") {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_DATA);
        }
    };

    if json {
        match serde_json::to_string_pretty(&scans) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize scans: {}", e);
                std::process::exit(EXIT_DATA);
            }
        }
        return;
    }

    let details: Vec<String> = scans
        .iter()
        .map(|scan| {
            let scored = scoring::calculate_score(&scan.result);
            output::format_scan_detail(scan, &scored, use_colors)
        })
        .collect();
    println!("{}", details.join("\n\n"));
}

fn read_report(path: Option<&PathBuf>) -> std::io::Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(p),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Resolve `--site` arguments; empty selection means every site.
/// Returns the first identifier that matches no site as the error.
fn select_sites(all: &[Site], selected: &[String]) -> Result<Vec<Site>, String> {
    if selected.is_empty() {
        return Ok(all.to_vec());
    }
    selected
        .iter()
        .map(|ident| {
            all.iter()
                .find(|s| s.matches(ident))
                .cloned()
                .ok_or_else(|| ident.clone())
        })
        .collect()
}

fn print_leaderboard(
    sites: &[Site],
    scan_history: &ScanHistory,
    query: &LeaderboardQuery,
    format: Format,
    use_colors: bool,
    verbose: bool,
) {
    let (summaries, unscanned) = sites::build_summaries(sites, scan_history);
    if verbose {
        for site in &unscanned {
            eprintln!("  No scans yet for {} ({})", site.name, site.domain);
        }
    }

    let rows = sites::leaderboard(summaries, query);
    match format {
        Format::Table => println!("{}", output::format_leaderboard_table(&rows, use_colors)),
        Format::Tsv => {
            let tsv = output::format_leaderboard_tsv(&rows);
            if !tsv.is_empty() {
                println!("{}", tsv);
            }
        }
        Format::Json => match serde_json::to_string_pretty(&rows) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize leaderboard: {}", e);
                std::process::exit(EXIT_DATA);
            }
        },
    }
}
