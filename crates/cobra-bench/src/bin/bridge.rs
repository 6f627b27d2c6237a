//! Bridge construction schedule driver, grounded on
//! `examples/original_source/benchs/sched_bridge_direct_simple.py`: a
//! 5-segment bridge (Martin Bartusch's 1983 PhD thesis) with seven
//! unary-resource non-overlap constraints, minimising the makespan.
//!
//! ```text
//! bridge [-b|--branch-and-bound] [-v|--verbose 0|2|3|4|5]
//!        [-x|--disj-static 0..4] [-y|--disj-choice 0..5] [-z|--disj-side 0..6]
//!        [-t|--timeout SECONDS]
//! ```

use std::time::Duration;

use cobra::{DisjunctionChoice, DisjunctionSide, DisjunctionStaticOrder, IntervalId, Optimizer, SearchMode, SolverConfig, SolverContext};

const HORIZON: i64 = 1_000_000;

/// Parsed command-line arguments.
struct Args {
	branch_and_bound: bool,
	verbose: u8,
	disj_static: DisjunctionStaticOrder,
	disj_choice: DisjunctionChoice,
	disj_side: DisjunctionSide,
	timeout: Option<Duration>,
}

fn parse_args() -> Args {
	let mut branch_and_bound = false;
	let mut verbose = 0u8;
	let mut disj_static = DisjunctionStaticOrder::Reverse;
	let mut disj_choice = DisjunctionChoice::MaxMinEst;
	let mut disj_side = DisjunctionSide::Declaration;
	let mut timeout = None;

	let mut argv = std::env::args().skip(1);
	while let Some(arg) = argv.next() {
		match arg.as_str() {
			"-b" | "--branch-and-bound" => branch_and_bound = true,
			"-v" | "--verbose" => {
				verbose = argv.next().and_then(|v| v.parse().ok()).expect("--verbose expects an integer");
			}
			"-x" | "--disj-static" => {
				disj_static = match argv.next().as_deref() {
					Some("0") => DisjunctionStaticOrder::Keep,
					Some("1") => DisjunctionStaticOrder::Reverse,
					Some("2") => DisjunctionStaticOrder::Earliest,
					Some("3") => DisjunctionStaticOrder::Latest,
					Some("4") => DisjunctionStaticOrder::SmallestProximity,
					other => panic!("--disj-static expects 0..4, got {other:?}"),
				};
			}
			"-y" | "--disj-choice" => {
				disj_choice = match argv.next().as_deref() {
					Some("0") => DisjunctionChoice::Implementation,
					Some("1") => DisjunctionChoice::MaxWeight,
					Some("2") => DisjunctionChoice::MaxProximity,
					Some("3") => DisjunctionChoice::WeightThenEarliest,
					Some("4") => DisjunctionChoice::MaxMinEst,
					Some("5") => DisjunctionChoice::SmallestProxOfMaxMinEst,
					other => panic!("--disj-choice expects 0..5, got {other:?}"),
				};
			}
			"-z" | "--disj-side" => {
				disj_side = match argv.next().as_deref() {
					Some("0") => DisjunctionSide::Declaration,
					Some("1") => DisjunctionSide::Heavier,
					Some("2") => DisjunctionSide::Lighter,
					Some("3") => DisjunctionSide::LatestStart,
					Some("4") => DisjunctionSide::EarliestStart,
					Some("5") => DisjunctionSide::LatestEnd,
					Some("6") => DisjunctionSide::EarliestEnd,
					other => panic!("--disj-side expects 0..6, got {other:?}"),
				};
			}
			"-t" | "--timeout" => {
				let secs: f64 = argv.next().and_then(|v| v.parse().ok()).expect("--timeout expects a number of seconds");
				timeout = Some(Duration::from_secs_f64(secs));
			}
			other => panic!("unrecognised argument {other:?}"),
		}
	}

	Args { branch_and_bound, verbose, disj_static, disj_choice, disj_side, timeout }
}

/// Every task in the schedule, keyed by name for building `Resource` groups.
struct Tasks {
	start: IntervalId,
	a: [IntervalId; 6],
	p: [IntervalId; 2],
	ue: IntervalId,
	s: [IntervalId; 6],
	b: [IntervalId; 6],
	ab: [IntervalId; 6],
	m: [IntervalId; 6],
	l: IntervalId,
	t: [IntervalId; 5],
	ua: IntervalId,
	v: [IntervalId; 2],
	k: [IntervalId; 2],
	stop: IntervalId,
}

fn model() -> (SolverContext, Tasks) {
	let mut ctx = SolverContext::new();
	let iv = |ctx: &mut SolverContext, name: &str, duration: i64| ctx.new_interval(name, 0, duration, HORIZON).expect("posting a fresh interval cannot fail");

	let start = iv(&mut ctx, "Start", 0);
	let a = [iv(&mut ctx, "A1", 4), iv(&mut ctx, "A2", 2), iv(&mut ctx, "A3", 2), iv(&mut ctx, "A4", 2), iv(&mut ctx, "A5", 2), iv(&mut ctx, "A6", 5)];
	let p = [iv(&mut ctx, "P1", 20), iv(&mut ctx, "P2", 13)];
	let ue = iv(&mut ctx, "UE", 10);
	let s = [iv(&mut ctx, "S1", 8), iv(&mut ctx, "S2", 4), iv(&mut ctx, "S3", 4), iv(&mut ctx, "S4", 4), iv(&mut ctx, "S5", 4), iv(&mut ctx, "S6", 10)];
	let b = [iv(&mut ctx, "B1", 1), iv(&mut ctx, "B2", 1), iv(&mut ctx, "B3", 1), iv(&mut ctx, "B4", 1), iv(&mut ctx, "B5", 1), iv(&mut ctx, "B6", 1)];
	let ab = [iv(&mut ctx, "AB1", 1), iv(&mut ctx, "AB2", 1), iv(&mut ctx, "AB3", 1), iv(&mut ctx, "AB4", 1), iv(&mut ctx, "AB5", 1), iv(&mut ctx, "AB6", 1)];
	let m = [iv(&mut ctx, "M1", 16), iv(&mut ctx, "M2", 8), iv(&mut ctx, "M3", 8), iv(&mut ctx, "M4", 8), iv(&mut ctx, "M5", 8), iv(&mut ctx, "M6", 20)];
	let l = iv(&mut ctx, "L", 2);
	let t = [iv(&mut ctx, "T1", 12), iv(&mut ctx, "T2", 12), iv(&mut ctx, "T3", 12), iv(&mut ctx, "T4", 12), iv(&mut ctx, "T5", 12)];
	let ua = iv(&mut ctx, "UA", 10);
	let v = [iv(&mut ctx, "V1", 15), iv(&mut ctx, "V2", 10)];
	let k = [iv(&mut ctx, "K1", 0), iv(&mut ctx, "K2", 0)];
	let stop = iv(&mut ctx, "STOP", 0);

	for &task in a.iter().chain([&ue]) {
		ctx.end_before_start(start, task, 0).unwrap();
	}
	ctx.end_before_start(a[0], s[0], 0).unwrap();
	ctx.end_before_start(a[1], s[1], 0).unwrap();
	ctx.end_before_start(a[4], s[4], 0).unwrap();
	ctx.end_before_start(a[5], s[5], 0).unwrap();
	ctx.end_before_start(a[2], p[0], 0).unwrap();
	ctx.end_before_start(a[3], p[1], 0).unwrap();

	ctx.end_before_start(p[0], s[2], 0).unwrap();
	ctx.end_before_start(p[1], s[3], 0).unwrap();
	ctx.end_before_start(p[0], k[0], 0).unwrap();
	ctx.end_before_start(p[1], k[0], 0).unwrap();

	for i in 0..6 {
		ctx.end_before_start(s[i], b[i], 0).unwrap();
		ctx.end_before_start(b[i], ab[i], 0).unwrap();
		ctx.end_before_start(ab[i], m[i], 0).unwrap();
		ctx.end_before_start(m[i], k[1], 0).unwrap();
		ctx.end_before_start(m[i], ua, -2).unwrap();
	}

	ctx.end_before_start(m[0], t[0], 0).unwrap();
	ctx.end_before_start(m[1], t[0], 0).unwrap();
	ctx.end_before_start(m[1], t[1], 0).unwrap();
	ctx.end_before_start(m[2], t[1], 0).unwrap();
	ctx.end_before_start(m[2], t[2], 0).unwrap();
	ctx.end_before_start(m[3], t[2], 0).unwrap();
	ctx.end_before_start(m[3], t[3], 0).unwrap();
	ctx.end_before_start(m[4], t[3], 0).unwrap();
	ctx.end_before_start(m[4], t[4], 0).unwrap();
	ctx.end_before_start(m[5], t[4], 0).unwrap();

	for &task in &t {
		ctx.end_before_start(l, task, 0).unwrap();
	}

	ctx.end_before_start(t[0], v[0], 0).unwrap();
	ctx.end_before_start(t[4], v[1], 0).unwrap();

	ctx.end_before_start(t[1], stop, 0).unwrap();
	ctx.end_before_start(t[2], stop, 0).unwrap();
	ctx.end_before_start(t[3], stop, 0).unwrap();
	ctx.end_before_start(v[0], stop, 0).unwrap();
	ctx.end_before_start(v[1], stop, 0).unwrap();
	ctx.end_before_start(ua, stop, 0).unwrap();
	ctx.end_before_start(k[0], stop, 0).unwrap();
	ctx.end_before_start(k[1], stop, 0).unwrap();

	ctx.start_before_end(l, start, -30).unwrap();
	ctx.start_before_end(s[0], a[0], -3).unwrap();
	ctx.start_before_end(s[1], a[1], -3).unwrap();
	ctx.start_before_end(s[4], a[4], -3).unwrap();
	ctx.start_before_end(s[5], a[5], -3).unwrap();
	ctx.start_before_end(s[2], p[0], -3).unwrap();
	ctx.start_before_end(s[3], p[1], -3).unwrap();

	for i in 0..6 {
		ctx.end_before_end(b[i], s[i], -4).unwrap();
	}
	for i in 0..6 {
		ctx.start_before_start(ue, s[i], 6).unwrap();
	}

	ctx.end_before_start(start, l, 30).unwrap();

	(ctx, Tasks { start, a, p, ue, s, b, ab, m, l, t, ua, v, k, stop })
}

fn nonoverlap(ctx: &mut SolverContext, tasks: &[IntervalId]) {
	for i in 0..tasks.len() {
		for &t2 in &tasks[i + 1..] {
			let t1 = tasks[i];
			let (v1, d1) = { let iv = &ctx.intervals()[t2]; (iv.start, iv.duration) };
			let (v2, d2) = { let iv = &ctx.intervals()[t1]; (iv.start, iv.duration) };
			ctx.ordering(v1, d1, v2, d2).expect("posting a fresh ordering cannot fail");
		}
	}
}

fn main() {
	let args = parse_args();
	tracing_subscriber::fmt()
		.with_max_level(match args.verbose {
			0 => tracing::Level::WARN,
			2 | 3 => tracing::Level::INFO,
			4 | 5 => tracing::Level::DEBUG,
			v => panic!("--verbose expects 0, 2, 3, 4 or 5, got {v}"),
		})
		.init();

	let (mut ctx, tasks) = model();
	nonoverlap(&mut ctx, &tasks.t);
	nonoverlap(&mut ctx, &tasks.m);
	nonoverlap(&mut ctx, &tasks.s);
	nonoverlap(&mut ctx, &tasks.a);
	nonoverlap(&mut ctx, &tasks.p);
	nonoverlap(&mut ctx, &tasks.b);
	nonoverlap(&mut ctx, &tasks.v);
	let _ = (tasks.ue, tasks.ua, tasks.l, tasks.k, tasks.ab, tasks.start);

	let stop_start = ctx.intervals()[tasks.stop].start;
	let backtrack_mode = if args.branch_and_bound { cobra::BacktrackMode::Chronological } else { cobra::BacktrackMode::RestartFromRoot };
	let config = SolverConfig::new(SearchMode::Disjunctive)
		.with_objective(stop_start, true)
		.with_backtrack_mode(backtrack_mode)
		.with_disj_static(args.disj_static)
		.with_disj_choice(args.disj_choice)
		.with_disj_side(args.disj_side);
	let mut optimizer = Optimizer::new(&ctx, config);
	let solution = optimizer.optimize(&mut ctx, args.timeout).expect("SetTimes is never selected by this driver");

	println!(
		"Optimization {}, {} in {:>8} backtracks ({:>8} for proof) and {:?}",
		if solution.completion { "completed" } else { "interrupted" },
		match solution.objective_value {
			Some(value) => format!("min({})={}", solution.objective_name.as_deref().unwrap_or("?"), value),
			None => "no solution found".to_string(),
		},
		solution.backtracks,
		solution.proof_backtracks,
		solution.duration,
	);
}
