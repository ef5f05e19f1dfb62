mod display;
mod parser;
mod schedule;
mod web;

use display::{print_schedule, write_schedule_to_file};
use parser::{parse_clock_time, parse_matches};
use schedule::{LifecycleState, SchedulerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let port = args
            .get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);

        println!("Starting web server on port {}...", port);
        println!("Access the API at http://localhost:{}/api/state", port);

        web::start_server(port).await?;
        return Ok(());
    }

    // CLI mode: one-shot schedule from a match-log file.
    let Some(path) = args.get(1) else {
        eprintln!("Usage: judging-scheduler <match-log.json> [start] [end]");
        eprintln!("       judging-scheduler web [port]");
        std::process::exit(2);
    };
    let start = args.get(2).map(String::as_str).unwrap_or("9:00 AM");
    let end = args.get(3).map(String::as_str).unwrap_or("12:00 PM");

    println!("Loading match schedule from {}...", path);
    let raw = std::fs::read_to_string(path)?;
    let matches = parse_matches(&raw)?;
    println!("Loaded {} matches", matches.len());

    let config = SchedulerConfig {
        judge_pairs: 4,
        slot_minutes: 10,
        block_minutes: 8,
        start_time: parse_clock_time(start, "judging start time")?,
        end_time: parse_clock_time(end, "judging end time")?,
    };

    let mut state = LifecycleState::new();
    state.generate(config, &matches)?;

    if let Some(schedule) = state.active_schedule() {
        print_schedule(schedule, &state.unassigned);
        write_schedule_to_file(schedule, "schedule_judging.txt")?;
        println!("\nSchedule saved to schedule_judging.txt");
    }

    Ok(())
}
