use clap::Parser;
use habit_app::app::{run, Cli};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("habits: {err:#}");
        std::process::exit(1);
    }
}
