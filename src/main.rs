use clap::{Arg, Command};
use spud::{repl, runner};
use std::fs;
use std::io::{self, Read};

fn main() {
    let matches = Command::new("spud")
        .about("Tree-walking interpreter for the spud scripting language")
        .arg(
            Arg::new("file")
                .help("Script file to parse or run")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("input")
                .help("File bound to the global 'input' variable ('-' reads stdin)")
                .value_name("INPUT")
                .index(2),
        )
        .arg(
            Arg::new("run")
                .short('r')
                .long("run")
                .help("Execute the script instead of printing its syntax tree")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let file = match matches.get_one::<String>("file") {
        Some(file) => file,
        None => {
            repl::start();
            return;
        }
    };

    let source = read_file_or_exit(file);
    let mut out = io::stdout();
    let mut err = io::stderr();

    let status = if matches.get_flag("run") {
        let input = match matches.get_one::<String>("input") {
            Some(path) if path == "-" => read_stdin_or_exit(),
            Some(path) => read_file_or_exit(path),
            None => String::new(),
        };
        runner::run_script(&source, &input, &mut out, &mut err)
    } else {
        runner::parse_only(&source, &mut out, &mut err)
    };

    std::process::exit(status);
}

fn read_file_or_exit(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path, e);
            std::process::exit(1);
        }
    }
}

fn read_stdin_or_exit() -> String {
    let mut buffer = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buffer) {
        eprintln!("Error reading stdin: {}", e);
        std::process::exit(1);
    }
    buffer
}
