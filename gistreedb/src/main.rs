use clap::{Parser, Subcommand};

/// gistreedb command-line interface (MVP).
#[derive(Parser)]
#[command(name = "gistreedb", author, version, about = "gistreedb CLI", long_about = None)]
struct Cli {
    /// Subcommands placeholder
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log at DEBUG instead of INFO.
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run health check and exit.
    HealthCheck,
}

fn main() {
    let cli = Cli::parse();
    gistree_log::init(cli.verbose);

    match cli.command {
        Some(Commands::HealthCheck) => {
            if gistreedb::health_check() {
                println!("OK");
            } else {
                println!("FAILED");
            }
        }
        None => {
            // Default behavior: print help (handled by clap auto) if no subcommand
        }
    }
}
