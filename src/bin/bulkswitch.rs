use bulkswitch::harness::builtin::{builtin_scenarios, find_builtin};
use bulkswitch::{DataSink, Entity, Harness, Scenario, ScenarioReport, SinkConfig};
use std::path::Path;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return Err("missing command".into());
    }
    init_tracing(&args);
    match args[1].as_str() {
        "list" => cmd_list(),
        "run" => cmd_run(&args[2..]),
        "check" => cmd_check(&args[2..]),
        other => {
            print_usage();
            Err(format!("unknown command: {other}"))
        }
    }
}

fn init_tracing(args: &[String]) {
    let level = parse_flag_value(args, "--log-level").unwrap_or_else(|| "info".into());
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("bulkswitch={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cmd_list() -> Result<(), String> {
    for scenario in builtin_scenarios() {
        let expected = scenario
            .expected
            .map(|o| o.as_str())
            .unwrap_or("unspecified");
        println!("{}\t{}\t{}", scenario.name, expected, scenario.description);
    }
    Ok(())
}

fn cmd_run(args: &[String]) -> Result<(), String> {
    let scenarios = select_scenarios(args)?;
    let reports = run_scenarios(&scenarios)?;
    print_reports(&reports, has_flag(args, "--json"))
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    let reports = run_scenarios(&builtin_scenarios())?;
    print_reports(&reports, has_flag(args, "--json"))?;
    let mismatched: Vec<&str> = reports
        .iter()
        .filter(|r| !r.matches_expectation())
        .map(|r| r.scenario_name.as_str())
        .collect();
    if mismatched.is_empty() {
        Ok(())
    } else {
        Err(format!("unexpected outcome: {}", mismatched.join(", ")))
    }
}

fn select_scenarios(args: &[String]) -> Result<Vec<Scenario>, String> {
    if has_flag(args, "--all") {
        return Ok(builtin_scenarios());
    }
    if let Some(path) = parse_flag_value(args, "--file") {
        let scenario =
            Scenario::load(Path::new(&path)).map_err(|e| format!("load {path}: {e}"))?;
        return Ok(vec![scenario]);
    }
    let mut names = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--file" | "--log-level" => {
                iter.next();
            }
            flag if flag.starts_with("--") => {}
            name => names.push(name),
        }
    }
    if names.is_empty() {
        return Err("run needs scenario names, --all or --file <path>".into());
    }
    names
        .into_iter()
        .map(|name| find_builtin(name).ok_or_else(|| format!("unknown scenario: {name}")))
        .collect()
}

fn run_scenarios(scenarios: &[Scenario]) -> Result<Vec<ScenarioReport>, String> {
    let config = SinkConfig::from_env().map_err(|e| format!("sink config: {e}"))?;
    let sink = DataSink::connect(config).map_err(|e| format!("connect: {e}"))?;
    let harness = Harness::new(sink, Entity::test_model());
    harness
        .run_all(scenarios)
        .map_err(|e| format!("run scenarios: {e}"))
}

fn print_reports(reports: &[ScenarioReport], json: bool) -> Result<(), String> {
    for report in reports {
        if json {
            println!("{}", report.to_json().map_err(|e| e.to_string())?);
        } else {
            println!(
                "{}\t{}\t{}",
                report.scenario_name,
                report.outcome,
                report.error_kind.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|idx| args.get(idx + 1))
        .cloned()
}

fn print_usage() {
    eprintln!("usage:");
    eprintln!("  bulkswitch list");
    eprintln!("  bulkswitch run <scenario>... [--json] [--log-level <level>]");
    eprintln!("  bulkswitch run --all [--json]");
    eprintln!("  bulkswitch run --file <scenario.json> [--json]");
    eprintln!("  bulkswitch check [--json]");
    eprintln!("sink address comes from DB_PORT_5432_TCP_ADDR / DB_PORT_5432_TCP_PORT");
}
