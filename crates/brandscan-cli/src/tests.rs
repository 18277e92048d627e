use super::*;

use brandscan_core::AnalysisResult;
use brandscan_pipeline::{ProspectOutcome, ProspectReport, ProspectStats, Scope};
use chrono::Utc;

fn analysis_result() -> AnalysisResult {
    AnalysisResult {
        prospect_id: 1,
        key_insight: "Customers love the taste".to_string(),
        themes: vec!["taste".to_string()],
        recommendations: Vec::new(),
        sentiment: None,
        customer_segments: Vec::new(),
        report: None,
        batch_count: 1,
        item_count: 4,
        generated_at: Utc::now(),
    }
}

fn report(outcome: ProspectOutcome) -> ProspectReport {
    ProspectReport {
        brand_name: "Acme".to_string(),
        prospect_id: 1,
        outcome,
        stats: ProspectStats::default(),
        attempts: 1,
    }
}

#[test]
fn production_logs_are_plain() {
    assert!(!colored_logs(&Environment::Production));
    assert!(colored_logs(&Environment::Development));
    assert!(colored_logs(&Environment::Test));
}

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["brandscan", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_and_seed_commands() {
    let cli = Cli::try_parse_from(["brandscan", "db", "migrate"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));

    let cli = Cli::try_parse_from(["brandscan", "db", "seed"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["brandscan"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn run_all_parses() {
    let cli = Cli::try_parse_from(["brandscan", "run", "--all"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Run {
            all: true,
            brand: None,
            dry_run: false,
            ..
        })
    ));
}

#[test]
fn run_brand_with_category_and_dry_run() {
    let cli = Cli::try_parse_from([
        "brandscan",
        "run",
        "--brand",
        "Acme",
        "--category",
        "snacks",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Run {
            all: false,
            brand: Some(ref b),
            category: Some(ref c),
            dry_run: true,
        }) if b == "Acme" && c == "snacks"
    ));
}

#[test]
fn run_requires_all_or_brand() {
    assert!(Cli::try_parse_from(["brandscan", "run"]).is_err());
}

#[test]
fn run_all_and_brand_conflict() {
    assert!(Cli::try_parse_from(["brandscan", "run", "--all", "--brand", "Acme"]).is_err());
}

#[test]
fn category_requires_brand() {
    assert!(Cli::try_parse_from(["brandscan", "run", "--all", "--category", "snacks"]).is_err());
}

#[test]
fn results_defaults_limit() {
    let cli = Cli::try_parse_from(["brandscan", "results"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Results {
            brand: None,
            limit: 10
        })
    ));
}

#[test]
fn prospects_list_parses() {
    let cli = Cli::try_parse_from(["brandscan", "prospects", "list"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Prospects {
            command: ProspectsCommands::List
        })
    ));
}

#[test]
fn scope_from_args_trims_brand_and_drops_blank_category() {
    let scope = run::scope_from_args(false, Some(" Acme ".into()), Some(" ".into())).unwrap();
    assert_eq!(
        scope,
        Scope::Brand {
            name: "Acme".into(),
            category: None
        }
    );
    assert_eq!(
        run::scope_from_args(true, None, None).unwrap(),
        Scope::AllProspects
    );
    assert!(run::scope_from_args(false, Some("  ".into()), None).is_err());
}

#[test]
fn report_lines_name_brand_and_outcome() {
    assert_eq!(
        run::format_report_line(&report(ProspectOutcome::Succeeded(analysis_result()))),
        "Acme: succeeded — Customers love the taste"
    );
    assert_eq!(
        run::format_report_line(&report(ProspectOutcome::Failed {
            reason: "no sources found".into()
        })),
        "Acme: failed — no sources found"
    );
}
