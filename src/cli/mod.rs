use std::env;
use std::error;
use std::fmt::{self, Display};

use getopts::Options;

use crate::netwalk::{Error, Field, SolveResult};

#[derive(Debug)]
pub enum CliError {
    Getopts(getopts::Fail),
    Usage,
    BadNumber(&'static str),
    Puzzle(Error),
}

impl From<getopts::Fail> for CliError {
    fn from(err: getopts::Fail) -> CliError {
        CliError::Getopts(err)
    }
}

impl From<Error> for CliError {
    fn from(err: Error) -> CliError {
        CliError::Puzzle(err)
    }
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match *self {
            CliError::Puzzle(Error::Unsolvable) => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CliError::Getopts(ref err) => Display::fmt(err, f),
            CliError::Usage => write!(f, "expected <width> <height> <puzzle>"),
            CliError::BadNumber(name) => {
                write!(f, "'{}' must be a positive integer", name)
            }
            CliError::Puzzle(ref err) => Display::fmt(err, f),
        }
    }
}

impl error::Error for CliError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            CliError::Getopts(ref err) => Some(err),
            CliError::Puzzle(ref err) => Some(err),
            _ => None,
        }
    }
}

struct Args {
    width: i32,
    height: i32,
    puzzle: String,
    max_depth: i32,
}

fn build_opts() -> Options {
    let mut opts = Options::new();
    opts.optopt(
        "d",
        "max-depth",
        "bound the speculative search depth",
        "DEPTH",
    );
    opts.optflag("h", "help", "print this help");
    opts
}

fn usage(program: &str, opts: &Options) -> String {
    opts.usage(&format!(
        "Usage: {} [options] <width> <height> <puzzle>",
        program
    ))
}

fn parse_args(opts: &Options, args: &[String]) -> Result<Option<Args>, CliError> {
    let matches = opts.parse(args)?;
    if matches.opt_present("h") {
        return Ok(None);
    }
    if matches.free.len() != 3 {
        return Err(CliError::Usage);
    }
    let width = parse_number(&matches.free[0], "width")?;
    let height = parse_number(&matches.free[1], "height")?;
    let max_depth = match matches.opt_str("d") {
        Some(raw) => parse_number(&raw, "max-depth")?,
        None => i32::MAX,
    };
    Ok(Some(Args {
        width,
        height,
        puzzle: matches.free[2].clone(),
        max_depth,
    }))
}

fn parse_number(raw: &str, name: &'static str) -> Result<i32, CliError> {
    raw.parse::<i32>()
        .ok()
        .filter(|&v| v > 0)
        .ok_or(CliError::BadNumber(name))
}

fn solve_and_print(args: &Args) -> Result<i32, CliError> {
    let mut field = Field::new(args.width, args.height, &args.puzzle)?;
    match field.solve(args.max_depth)? {
        SolveResult::Solved(solved) => {
            print!("{}", solved);
            Ok(0)
        }
        SolveResult::Exhausted => {
            print!("{}", field);
            eprintln!("error: search depth exhausted before the puzzle was solved");
            Ok(3)
        }
    }
}

pub fn run_cli() -> i32 {
    let argv: Vec<String> = env::args().collect();
    let program = argv
        .first()
        .map(String::as_str)
        .unwrap_or("netwalk_sol")
        .to_string();
    let opts = build_opts();

    let args = match parse_args(&opts, argv.get(1..).unwrap_or(&[])) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print!("{}", usage(&program, &opts));
            return 0;
        }
        Err(err) => {
            eprintln!("error: {}", err);
            eprint!("{}", usage(&program, &opts));
            return err.exit_code();
        }
    };

    match solve_and_print(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err);
            err.exit_code()
        }
    }
}
