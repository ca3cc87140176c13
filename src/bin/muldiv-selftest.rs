use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use clap_num::number_range;
use muldiv_model::harness::{verify_op, verify_op_parallel};
use muldiv_model::logging::init_tracing;
use muldiv_model::width::{Width, MAX_WIDTH};
use muldiv_model::Op;

/// Widths above this take a long time to enumerate
const SLOW_WIDTH: u32 = 12;

/// Exhaustively check the multiply/divide datapath model
///
/// For each requested width w, every dividend is divided by every
/// non-zero divisor, and every pair of w-bit values is multiplied,
/// and each result is compared against native arithmetic. Checking
/// stops at the first mismatch, which is printed, and the exit status
/// is non-zero.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Operand width in bits (can be repeated)
    #[arg(short, long = "width", value_parser = parse_width, default_values_t = [4, 8])]
    widths: Vec<u32>,

    /// Which operations to check
    #[arg(long, value_enum, default_value_t = Ops::Both)]
    op: Ops,

    /// Spread the operand space over all cores
    #[arg(long)]
    parallel: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Ops {
    Div,
    Mul,
    Both,
}

impl Ops {
    fn ops(self) -> &'static [Op] {
        match self {
            Ops::Div => &[Op::Divide],
            Ops::Mul => &[Op::Multiply],
            Ops::Both => &[Op::Divide, Op::Multiply],
        }
    }
}

fn parse_width(s: &str) -> Result<u32, String> {
    number_range(s, 1, MAX_WIDTH)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    for &bits in &args.widths {
        let width = match Width::new(bits) {
            Ok(width) => width,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        };
        if bits > SLOW_WIDTH {
            tracing::warn!(%width, "exhaustive check covers 2^{} pairs", 2 * bits);
        }

        for &op in args.op.ops() {
            let result = if args.parallel {
                verify_op_parallel(width, op)
            } else {
                verify_op(width, op)
            };
            match result {
                Ok(checked) => println!("w={width} {op}: PASS ({checked} pairs)"),
                Err(e) => {
                    println!("w={width} {op}: FAIL");
                    eprintln!("{e}");
                    return ExitCode::FAILURE;
                }
            }
        }
    }
    ExitCode::SUCCESS
}
