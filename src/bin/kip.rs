use std::io::{self, Write};

use clap::{Parser as ClapParser, Subcommand};
use kip_lang::config::Config;
use kip_lang::{evaluate, evaluator, new_environment, parse};
use log::{debug, error};

#[derive(ClapParser, Debug)]
#[command(author, version, about = "The Kip programming language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a source string given directly on the command line.
    String { source: String },
    /// Evaluate a `.newpl` source file.
    File { path: std::path::PathBuf },
}

fn main() {
    simple_logger::init_with_level(log::Level::Warn).unwrap();
    let config = Config::load();
    evaluator::configure(&config);

    match Cli::parse().command {
        Some(Command::String { source }) => run_once(&source),
        Some(Command::File { path }) => run_file(&path),
        None => repl(&config),
    }
}

fn run_file(path: &std::path::Path) {
    if path.extension().and_then(|ext| ext.to_str()) != Some("newpl") {
        error!("expected a .newpl source file, got {}", path.display());
        std::process::exit(1);
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            error!("could not read {}: {err}", path.display());
            std::process::exit(1);
        }
    };
    run_once(&contents);
}

fn run_once(source: &str) {
    let env = new_environment();
    let (program, errors) = parse(source);
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("\t{err}");
        }
        return;
    }
    debug!("parsed {} top-level statement(s)", program.len());
    let result = evaluate(&program, &env);
    println!("{result}");
}

fn repl(config: &Config) {
    println!("This is the Kip programming language!");
    println!("Feel free to type in commands");

    let env = new_environment();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("{}", config.prompt);
        let _ = io::stdout().flush();

        line.clear();
        if stdin.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }

        let (program, errors) = parse(&line);
        if !errors.is_empty() {
            for err in &errors {
                println!("\t{err}");
            }
            continue;
        }

        let result = evaluate(&program, &env);
        print_result(&result, config.color);
    }
}

fn print_result(result: &kip_lang::object::Object, color: bool) {
    if color && result.is_error() {
        println!("\x1b[31m{result}\x1b[0m");
    } else {
        println!("{result}");
    }
}
