use std::path::PathBuf;

use crate::error::{LispError, LispResult};

/// Default arena size in cell slots. The byte region gets `cells * 8` bytes.
pub const DEFAULT_CELLS: usize = 65_536;

/// Setting this to `1` turns on evaluation tracing.
pub const TRACE_ENV: &str = "TINYLISP_TRACE";

pub const USAGE: &str = "\
Usage: tinylisp [OPTIONS]

Options:
  --cells <n>      Arena size in cell slots (default 65536)
  --load <file>    Evaluate a file before starting the REPL (repeatable)
  --trace          Log every eval/apply step
  --no-reclaim     Keep garbage between top-level forms
  --help, -h       Show this help message

Environment variables:
  TINYLISP_TRACE=1   Same as --trace
  RUST_LOG           Log filter when not tracing (default: warn)
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub cells: usize,
    pub trace: bool,
    /// Reclaim the arena after every top-level form.
    pub reclaim: bool,
    pub load_files: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cells: DEFAULT_CELLS,
            trace: false,
            reclaim: true,
            load_files: Vec::new(),
        }
    }
}

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Run(Config),
    Help,
}

impl Config {
    /// Parse command-line flags (without the program name).
    pub fn from_args<I>(args: I) -> LispResult<Command>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--cells" => {
                    let n = args
                        .next()
                        .ok_or_else(|| LispError::Usage("--cells requires a number".into()))?;
                    config.cells = match n.parse::<usize>() {
                        Ok(cells) if cells > 0 => cells,
                        _ => {
                            return Err(LispError::Usage(format!(
                                "--cells expects a positive integer, got {:?}",
                                n
                            )))
                        }
                    };
                }
                "--load" => {
                    let path = args
                        .next()
                        .ok_or_else(|| LispError::Usage("--load requires a file path".into()))?;
                    config.load_files.push(PathBuf::from(path));
                }
                "--trace" => config.trace = true,
                "--no-reclaim" => config.reclaim = false,
                "--help" | "-h" => return Ok(Command::Help),
                other => {
                    return Err(LispError::Usage(format!("unknown argument: {}", other)));
                }
            }
        }
        Ok(Command::Run(config))
    }

    /// Pick up settings from the environment.
    pub fn apply_env(&mut self) {
        if std::env::var(TRACE_ENV).map(|v| v == "1").unwrap_or(false) {
            self.trace = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> LispResult<Command> {
        Config::from_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults() {
        assert_eq!(parse(&[]).unwrap(), Command::Run(Config::default()));
    }

    #[test]
    fn all_flags() {
        let cmd = parse(&[
            "--cells", "4096", "--load", "a.lisp", "--trace", "--load", "b.lisp", "--no-reclaim",
        ])
        .unwrap();
        let Command::Run(config) = cmd else {
            panic!("expected Run");
        };
        assert_eq!(config.cells, 4096);
        assert!(config.trace);
        assert!(!config.reclaim);
        assert_eq!(
            config.load_files,
            vec![PathBuf::from("a.lisp"), PathBuf::from("b.lisp")]
        );
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse(&["--trace", "-h"]).unwrap(), Command::Help);
    }

    #[test]
    fn bad_arguments() {
        let cases: [&[&str]; 5] = [
            &["--cells"],
            &["--cells", "0"],
            &["--cells", "lots"],
            &["--load"],
            &["--bogus"],
        ];
        for args in cases {
            assert!(matches!(parse(args), Err(LispError::Usage(_))), "{:?}", args);
        }
    }
}
