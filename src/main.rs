mod cli;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::run(cli) {
        eprintln!("Error: {}", e);
        // 2: the server or network failed the action; 1: it failed locally.
        std::process::exit(if e.is_remote() { 2 } else { 1 });
    }
}
