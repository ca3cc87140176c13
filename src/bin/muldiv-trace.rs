use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use clap_num::{maybe_hex, number_range};
use muldiv_model::driver::{divide_traced, multiply_traced};
use muldiv_model::logging::init_tracing;
use muldiv_model::trace::{LogSink, PrintSink};
use muldiv_model::width::{Width, MAX_WIDTH};

/// Print the accumulator of the multiply/divide datapath cycle by cycle
///
/// Runs one division or multiplication through the sequential
/// datapath model and prints one line per cycle in the form
///
/// Step NN: accum BEFORE -> AFTER
///
/// with the accumulator in hexadecimal, followed by the result
/// pair. Operands may be given in decimal or as 0x-prefixed hex. With
/// -vv the same steps are also logged as debug events on stderr.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Operation to run
    #[arg(value_enum)]
    op: TraceOp,

    /// Dividend (div) or multiplicand (mul)
    #[arg(value_parser = maybe_hex::<u64>)]
    lhs: u64,

    /// Divisor (div) or multiplier (mul)
    #[arg(value_parser = maybe_hex::<u64>)]
    rhs: u64,

    /// Operand width in bits
    #[arg(short, long, value_parser = parse_width, default_value_t = 4)]
    width: u32,

    /// Pad the accumulator to w/2 hex digits, as the original
    /// diagnostic print did
    #[arg(long)]
    legacy: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TraceOp {
    Div,
    Mul,
}

fn parse_width(s: &str) -> Result<u32, String> {
    number_range(s, 1, MAX_WIDTH)
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let width = Width::new(args.width)?;
    let mut print = PrintSink::stdout(args.legacy);
    let mut sink = (&mut print, LogSink);
    let result = match args.op {
        TraceOp::Div => divide_traced(width, args.lhs, args.rhs, &mut sink)?,
        TraceOp::Mul => multiply_traced(width, args.lhs, args.rhs, &mut sink)?,
    };
    print.finish()?;
    match args.op {
        TraceOp::Div => println!("remainder = {}, quotient = {}", result.high, result.low),
        TraceOp::Mul => println!("high = {}, low = {}", result.high, result.low),
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
