use ar3sto::cli::{args::Args, commands};
use clap::Parser;
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            _ = shutdown_signal() => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(anyhow::anyhow!("Interrupted by user"))
            }
        }
    });

    // Drop in-flight simulator processes before exiting
    runtime.shutdown_background();

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Resolves on CTRL+C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("ar3sto - AltaRica 3 Stochastic Simulator Study Toolkit");
    println!("======================================================");
    println!();
    println!("Parse simulator result reports, export indicator series as tables,");
    println!("and generate or run studies from TOML/JSON definitions.");
    println!();
    println!("USAGE:");
    println!("    ar3sto <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    inspect     Parse a result report and print its contents");
    println!("    export      Export indicator series of reports as CSV or Parquet tables");
    println!("    generate    Generate the IDF and MDF documents of a study");
    println!("    simulate    Generate a study, run the simulator and parse its report");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    ar3sto inspect result.csv --indicator pump_down");
    println!("    ar3sto export 'runs/*/result.csv' --output tables --format parquet");
    println!("    ar3sto generate study.toml --output work/");
    println!("    ar3sto simulate study.toml model.gts --work-dir work/ --export tables/");
    println!();
    println!("For detailed help on any command, use:");
    println!("    ar3sto <COMMAND> --help");
}
