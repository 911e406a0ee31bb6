use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::{path::PathBuf, process::ExitCode};
use yamljson::{convert, Config, Error};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a YAML file to a JSON file
    Convert {
        /// Input YAML file
        #[clap(long)]
        input: PathBuf,
        /// Output JSON file
        #[clap(long)]
        output: PathBuf,
        /// Prettify JSON
        #[clap(long)]
        prettify: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{} {}", "error:".red().bold(), e.white());
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    match args.command {
        Command::Convert {
            input,
            output,
            prettify,
        } => {
            let config = Config {
                input,
                output,
                prettify,
            };
            convert(&config)?;
            println!(
                "{} yaml file {} to json file {}",
                "Converted".green().bold(),
                config.input.display().dimmed(),
                config.output.display().dimmed()
            );
        }
    }
    Ok(())
}
