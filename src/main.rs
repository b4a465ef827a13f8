use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::Result;
use log::LevelFilter;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use tinylisp::config::{Command, Config, USAGE};
use tinylisp::reader;
use tinylisp::Interp;

fn main() -> Result<()> {
    let mut config = match Config::from_args(std::env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print!("{}", USAGE);
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Try 'tinylisp --help' for usage information.");
            std::process::exit(1);
        }
    };
    config.apply_env();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if config.trace {
        logger.filter_level(LevelFilter::Trace);
    }
    logger.init();

    let mut interp = Interp::with_config(&config)?;

    for path in &config.load_files {
        load_file(&mut interp, path, &config);
    }

    if io::stdin().is_terminal() {
        println!("tinylisp");
        run_interactive(&mut interp, &config)
    } else {
        run_piped(&mut interp, &config)
    }
}

/// Evaluate a source file form by form before the REPL starts.
/// Unreadable files, syntax errors and exhaustion are fatal here.
fn load_file(interp: &mut Interp, path: &Path, config: &Config) {
    let input = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let mut pos = 0;
    let mut count = 0;
    loop {
        match reader::read_one_at(&input, pos, &mut interp.arena) {
            Ok(Some((expr, next))) => {
                pos = next;
                count += 1;
                if let Err(e) = interp.eval_global(expr) {
                    eprintln!("Error at expression {} of {}: {}", count, path.display(), e);
                    std::process::exit(1);
                }
                if config.reclaim {
                    interp.reclaim();
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("Error in {} at byte {}: {}", path.display(), pos, e);
                std::process::exit(1);
            }
        }
    }
    log::info!("loaded {} expressions from {}", count, path.display());
}

/// Interactive REPL: accumulate lines until parens are balanced.
fn run_interactive(interp: &mut Interp, config: &Config) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut buf = String::new();
    let mut depth: i32 = 0;

    loop {
        let prompt = if depth == 0 {
            format!("{}> ", interp.free_cells())
        } else {
            "  ".to_string()
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                depth += paren_depth(&line);
                buf.push_str(&line);
                buf.push('\n');

                if depth <= 0 {
                    depth = 0;
                    let input = std::mem::take(&mut buf);
                    if input.trim().is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input.trim());
                    eval_and_print(&input, interp, config);
                }
            }
            Err(ReadlineError::Interrupted) => {
                buf.clear();
                depth = 0;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Piped mode: read all input, then evaluate one form at a time.
fn run_piped(interp: &mut Interp, config: &Config) -> Result<()> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    eval_and_print(&input, interp, config);
    Ok(())
}

/// Read, evaluate and print each form in `input`, reclaiming after each.
/// Forms are parsed one at a time so unread text holds no arena cells
/// when the watermark moves.
fn eval_and_print(input: &str, interp: &mut Interp, config: &Config) {
    let mut pos = 0;
    loop {
        match reader::read_one_at(input, pos, &mut interp.arena) {
            Ok(Some((expr, next))) => {
                pos = next;
                match interp.eval_global(expr) {
                    Ok(val) => println!("{}", interp.print(val)),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("{}", e);
                break;
            }
        }
        if config.reclaim {
            interp.reclaim();
        }
    }
    if config.reclaim {
        interp.reclaim();
    }
}

/// Net parenthesis depth of a line, ignoring `;` comments.
fn paren_depth(line: &str) -> i32 {
    let code = line.split(';').next().unwrap_or("");
    code.chars().fold(0, |depth, ch| match ch {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}
