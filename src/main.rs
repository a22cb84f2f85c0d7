/* 3rd party libraries */
use clap::{Arg, ArgMatches, Command};
use log::{error, info};
use std::path::Path;
use std::thread::{sleep, Builder};
use std::time::Duration;

/* Custom libraries */
use elevator_dispatch::unwrap_or_exit;
use elevator_dispatch::{Config, Coordinator, RunReport, SimResult, SimulationError};

/* Main */
fn main() {
    let matches = cli().get_matches();

    // Initialize logging, RUST_LOG takes precedence over --log-level
    let log_level = matches.value_of("log-level").unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    // Load the configuration
    let config = unwrap_or_exit!(load_config(&matches));
    let inject = unwrap_or_exit!(parse_flag::<usize>(&matches, "inject")).unwrap_or(0);

    // Build the run
    let coordinator = unwrap_or_exit!(Coordinator::new(&config));
    let handle = coordinator.handle();

    // Add live riders from the side once the run is going
    if inject > 0 {
        let injector = Builder::new().name("rider_injector".into()).spawn(move || {
            while !handle.is_active() {
                sleep(Duration::from_millis(10));
            }
            match handle.inject_riders(inject) {
                Ok(ids) => info!("Injected riders {:?}", ids),
                Err(e) => error!("Failed to inject riders: {}", e),
            }
        });
        let _injector = unwrap_or_exit!(injector);
    }

    // Run the simulation
    let report = unwrap_or_exit!(coordinator.run());

    if matches.is_present("json") {
        println!("{}", unwrap_or_exit!(serde_json::to_string_pretty(&report)));
    } else {
        print_summary(&report);
    }

    if !report.is_clean() {
        std::process::exit(1);
    }
}

fn cli() -> Command<'static> {
    Command::new("elevator-dispatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Simulates a fleet of elevators serving riders with closest-accept dispatch")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .help("TOML configuration file [default: config.toml if present]"),
        )
        .arg(Arg::new("elevators").long("elevators").takes_value(true).help("Number of elevators"))
        .arg(Arg::new("floors").long("floors").takes_value(true).help("Number of floors"))
        .arg(Arg::new("riders").long("riders").takes_value(true).help("Number of generated riders"))
        .arg(Arg::new("timeout").long("timeout").takes_value(true).help("Run time in seconds"))
        .arg(Arg::new("seed").long("seed").takes_value(true).help("Seed for rider generation"))
        .arg(
            Arg::new("inject")
                .long("inject")
                .takes_value(true)
                .help("Riders to add while the simulation is running"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .takes_value(true)
                .help("Log filter when RUST_LOG is unset [default: info]"),
        )
        .arg(Arg::new("json").long("json").help("Print the run report as JSON"))
}

fn load_config(matches: &ArgMatches) -> SimResult<Config> {
    let mut config = match matches.value_of("config") {
        Some(path) => Config::load(path)?,
        None if Path::new("config.toml").exists() => Config::load("config.toml")?,
        None => Config::default(),
    };

    if let Some(elevators) = parse_flag(matches, "elevators")? {
        config.building.elevator_count = elevators;
    }
    if let Some(floors) = parse_flag(matches, "floors")? {
        config.building.floor_count = floors;
    }
    if let Some(riders) = parse_flag(matches, "riders")? {
        config.simulation.rider_count = Some(riders);
        config.simulation.riders = None;
    }
    if let Some(timeout) = parse_flag(matches, "timeout")? {
        config.simulation.timeout_secs = timeout;
    }
    if let Some(seed) = parse_flag(matches, "seed")? {
        config.simulation.seed = Some(seed);
    }

    Ok(config)
}

fn parse_flag<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> SimResult<Option<T>> {
    matches
        .value_of(name)
        .map(|value| {
            value.parse::<T>().map_err(|_| {
                SimulationError::Configuration(format!("invalid value '{}' for --{}", value, name))
            })
        })
        .transpose()
}

fn print_summary(report: &RunReport) {
    println!("Simulation finished in {} ms ({})", report.elapsed_ms, report.policy);
    for elevator in &report.elevators {
        println!(
            "  elevator {:>2}: transported {:>3}, at floor {:>2}, {} aboard, {} assigned",
            elevator.id,
            elevator.total_transported,
            elevator.current_floor,
            elevator.riders_aboard.len(),
            elevator.riders_assigned.len()
        );
    }

    let arrived = report
        .riders
        .iter()
        .filter(|r| matches!(r.state, elevator_dispatch::shared::BoardingState::Arrived(_)))
        .count();
    println!(
        "  {} of {} riders arrived, {} transported in total",
        arrived,
        report.riders.len(),
        report.total_transported()
    );

    for failure in &report.failures {
        println!("  elevator {} failed: {}", failure.elevator, failure.error);
    }
}
