//! N-Queens driver, grounded on `examples/original_source/benchs/queens.py`.
//!
//! ```text
//! queens <N> [-s|--search 2|3] [-b|--branch-and-bound] [-v|--verbose 0|2|4|5]
//!            [-f|--var-choice 0|1] [-t|--timeout SECONDS]
//! ```
//!
//! `-b` mirrors the original script's inverted flag: passing it selects
//! chronological backtracking (search every leaf) rather than the default
//! "stop at the first solution" root mode.

use std::time::Duration;

use cobra::{BacktrackMode, Optimizer, SearchMode, SolverConfig, SolverContext, VariableChoice};

/// Parsed command-line arguments.
struct Args {
	n: i64,
	search: SearchMode,
	branch_and_bound: bool,
	verbose: u8,
	var_choice: VariableChoice,
	timeout: Option<Duration>,
}

fn parse_args() -> Args {
	let mut n = None;
	let mut search = SearchMode::Enumerate;
	let mut branch_and_bound = false;
	let mut verbose = 0u8;
	let mut var_choice = VariableChoice::Declaration;
	let mut timeout = None;

	let mut argv = std::env::args().skip(1);
	while let Some(arg) = argv.next() {
		match arg.as_str() {
			"-s" | "--search" => {
				search = match argv.next().as_deref() {
					Some("2") => SearchMode::Enumerate,
					Some("3") => SearchMode::Dichotomy,
					other => panic!("--search expects 2 or 3, got {other:?}"),
				};
			}
			"-b" | "--branch-and-bound" => branch_and_bound = true,
			"-v" | "--verbose" => {
				verbose = argv.next().and_then(|v| v.parse().ok()).expect("--verbose expects an integer");
			}
			"-f" | "--var-choice" => {
				var_choice = match argv.next().as_deref() {
					Some("0") => VariableChoice::Declaration,
					Some("1") => VariableChoice::SmallestDomain,
					other => panic!("--var-choice expects 0 or 1, got {other:?}"),
				};
			}
			"-t" | "--timeout" => {
				let secs: f64 = argv.next().and_then(|v| v.parse().ok()).expect("--timeout expects a number of seconds");
				timeout = Some(Duration::from_secs_f64(secs));
			}
			positional => {
				n = Some(positional.parse().unwrap_or_else(|_| panic!("expected N, got {positional:?}")));
			}
		}
	}

	Args { n: n.expect("usage: queens N [options]"), search, branch_and_bound, verbose, var_choice, timeout }
}

/// One variable per row, holding the queen's column; pairwise not-equal on
/// column and both diagonals for every pair of rows.
fn model(n: i64) -> SolverContext {
	let mut ctx = SolverContext::new();
	let q: Vec<_> = (0..n).map(|i| ctx.new_var(format!("Q{}", i + 1), 1, n).expect("posting a fresh variable cannot fail")).collect();
	for i in 0..q.len() {
		for j in (i + 1)..q.len() {
			let d = (j - i) as i64;
			ctx.nequxyc(q[i], q[j], 0).expect("posting a fresh constraint cannot fail");
			ctx.nequxyc(q[i], q[j], d).expect("posting a fresh constraint cannot fail");
			ctx.nequxyc(q[j], q[i], d).expect("posting a fresh constraint cannot fail");
		}
	}
	ctx
}

fn main() {
	let args = parse_args();
	tracing_subscriber::fmt()
		.with_max_level(match args.verbose {
			0 => tracing::Level::WARN,
			2 => tracing::Level::INFO,
			4 | 5 => tracing::Level::DEBUG,
			v => panic!("--verbose expects 0, 2, 4 or 5, got {v}"),
		})
		.init();

	let mut ctx = model(args.n);
	let backtrack_mode = if args.branch_and_bound { BacktrackMode::Chronological } else { BacktrackMode::RestartFromRoot };
	let config = SolverConfig::new(args.search).with_backtrack_mode(backtrack_mode).with_var_choice(args.var_choice);
	let mut optimizer = Optimizer::new(&ctx, config);
	let solution = optimizer.optimize(&mut ctx, args.timeout).expect("SetTimes is never selected by this driver");

	if solution.nsol == 1 {
		let mut vars: Vec<_> = solution.vars.iter().collect();
		vars.sort_by(|a, b| a.0.cmp(b.0));
		for (name, value) in vars {
			println!("{name} = {value}");
		}
	}
	println!("number of solutions: {}", solution.nsol);
	println!("backtracks: {}", solution.backtracks);
	println!("runtime: {:?}", solution.duration);
}
