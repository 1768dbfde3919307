// Synthetic SIRN data generator
use clap::Parser;

use sirn_visualizer::infrastructure::generator::{GeneratorParams, format_preview, generate_dataset};
use sirn_visualizer::infrastructure::json_loader::save_dataset;
use sirn_visualizer::presentation::cli::GenerateArgs;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = GenerateArgs::parse();

    let params = GeneratorParams {
        cities: args.cities,
        max_time: args.max_time,
        time_step: args.time_step,
        initial_infected: args.initial_infected,
        vary_params: !args.fixed_params,
        populations: args.populations,
        seed: args.seed,
        stochastic: args.stochastic,
    };
    let dataset = generate_dataset(&params)?;
    save_dataset(&dataset, &args.output)?;
    println!(
        "Generated SIRN data for {} cities saved to {}",
        params.cities,
        args.output.display()
    );

    if args.preview {
        print!("{}", format_preview(&dataset, 3, 3));
    }
    Ok(())
}
