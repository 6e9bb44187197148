use clap::Parser;
use log::{info, LevelFilter};

mod args;
mod draw;

fn main() {
    let args = args::Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    } else if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(LevelFilter::Info);
    }
    builder.init();

    match draw::run_draw(&args) {
        Ok(out_path) => {
            info!("Draw saved to {}", out_path.display());
            println!("Data saved to {}", out_path.display());
        }
        Err(e) => {
            eprintln!("An error occured: {}", e);
            std::process::exit(1);
        }
    }
}
