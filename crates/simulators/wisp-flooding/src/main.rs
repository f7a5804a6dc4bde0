use std::process::ExitCode;

use clap::Parser;

use wisp_flooding::simulation::builder::SimulationBuilder;
use wisp_runner::runner::{run_headless, run_simulation};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
struct CliArgs {
    #[arg(short = 'c', long, value_name = "CONFIG_FILE")]
    config: String,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let start = std::time::Instant::now();
    let mut builder = SimulationBuilder::new(&args.config);
    let mut sim = builder.build();
    let outcome = if builder.headless() {
        run_headless(&mut sim, builder.driver(), builder.rounds(), builder.results())
    } else {
        run_simulation(
            &mut sim,
            builder.driver(),
            builder.rounds(),
            builder.results(),
            builder.metadata(),
            builder.renderer(),
        )
    };
    let elapsed = start.elapsed();
    match outcome {
        Ok(state) => {
            println!(
                "Simulation {} after round {} in {} ms.",
                state,
                sim.now().as_round(),
                elapsed.as_millis()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Simulation failed after {} ms: {}", elapsed.as_millis(), e);
            ExitCode::FAILURE
        }
    }
}
