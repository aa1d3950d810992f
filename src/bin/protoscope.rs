//! CLI for inspecting import resolution.
//!
//! Usage:
//!   protoscope <imports.toml> <name>...   # Resolve each name against the config
//!   protoscope <imports.toml>             # Start REPL (one name per line)

use protoscope::runner::plugin::config::ImportConfig;
use protoscope::runner::plugin::registry::{Import, ImportRegistry};
use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "-h" || args[1] == "--help" {
        print_usage();
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let config = match ImportConfig::load(Path::new(&args[1])) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    let mut registry = ImportRegistry::from_config(&config);

    if args.len() == 2 {
        run_repl(&mut registry);
        return;
    }

    let mut failed = false;
    for name in &args[2..] {
        failed |= !report(&mut registry, name);
    }
    if failed {
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("protoscope - import resolution inspector");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  protoscope <imports.toml> <name>...   Resolve each name");
    eprintln!("  protoscope <imports.toml>             Start REPL (interactive mode)");
}

/// Print how `name` resolves. Returns false if resolution failed with an error.
fn report(registry: &mut ImportRegistry, name: &str) -> bool {
    match registry.has_import(name) {
        Ok(true) => {
            match registry.get_static_or_class_import(name) {
                Some(Import::Type(ty)) => println!("{} -> {}", name, ty),
                Some(Import::Callable(stub)) => println!("{} -> callable {}", name, stub.name()),
                None => println!("{} -> (resolved)", name),
            }
            true
        }
        Ok(false) => {
            println!("{}: unresolved", name);
            true
        }
        Err(e) => {
            eprintln!("{}: {}", name, e);
            false
        }
    }
}

fn run_repl(registry: &mut ImportRegistry) {
    println!("protoscope v0.1.0 - import resolution");
    println!("Type a name and press Enter. Type .exit to quit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut input = String::new();
        match stdin.read_line(&mut input) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }

        let input = input.trim();
        if input == ".exit" || input == ".quit" {
            break;
        }
        if input.is_empty() {
            continue;
        }
        report(registry, input);
    }
}
