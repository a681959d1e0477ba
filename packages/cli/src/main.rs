use clap::Parser;

use memoires_cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    memoires_cli::init_tracing(args.verbose);

    if let Err(e) = memoires_cli::run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
