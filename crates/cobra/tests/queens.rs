//! N-Queens scenarios, grounded on `examples/original_source/benchs/queens.py`
//! and its documented reference results (a queen per row, one variable per
//! row holding its column).

use cobra::{BacktrackMode, Optimizer, SearchMode, SolverConfig, SolverContext, VariableChoice};

/// Builds the classic model: `q[i]` holds row `i`'s column, `1..=n`; for
/// every `i < j`, `q[i]` may not share `j`'s column nor either diagonal.
fn queens(n: i64) -> SolverContext {
	let mut ctx = SolverContext::new();
	let q: Vec<_> = (0..n).map(|i| ctx.new_var(format!("Q{}", i + 1), 1, n).unwrap()).collect();
	for i in 0..q.len() {
		for j in (i + 1)..q.len() {
			let d = (j - i) as i64;
			ctx.nequxyc(q[i], q[j], 0).unwrap();
			ctx.nequxyc(q[i], q[j], d).unwrap();
			ctx.nequxyc(q[j], q[i], d).unwrap();
		}
	}
	ctx
}

#[test]
fn four_queens_has_two_solutions() {
	let mut ctx = queens(4);
	let config = SolverConfig::new(SearchMode::Enumerate).with_backtrack_mode(BacktrackMode::Chronological);
	let mut opt = Optimizer::new(&ctx, config);
	let solution = opt.optimize(&mut ctx, None).unwrap();
	assert_eq!(solution.nsol, 2);
	assert!(solution.completion);
}

#[test]
fn eight_queens_has_ninety_two_solutions() {
	let mut ctx = queens(8);
	let config = SolverConfig::new(SearchMode::Enumerate).with_backtrack_mode(BacktrackMode::Chronological);
	let mut opt = Optimizer::new(&ctx, config);
	let solution = opt.optimize(&mut ctx, None).unwrap();
	assert_eq!(solution.nsol, 92);
	assert!(solution.completion);
}

#[test]
fn eleven_queens_declaration_order_matches_the_documented_backtrack_count() {
	let mut ctx = queens(11);
	let config = SolverConfig::new(SearchMode::Enumerate)
		.with_backtrack_mode(BacktrackMode::Chronological)
		.with_var_choice(VariableChoice::Declaration);
	let mut opt = Optimizer::new(&ctx, config);
	let solution = opt.optimize(&mut ctx, None).unwrap();
	assert_eq!(solution.nsol, 2680);
	assert_eq!(solution.backtracks, 29947);
}

#[test]
fn eleven_queens_smallest_domain_first_matches_the_documented_backtrack_count() {
	let mut ctx = queens(11);
	let config = SolverConfig::new(SearchMode::Enumerate)
		.with_backtrack_mode(BacktrackMode::Chronological)
		.with_var_choice(VariableChoice::SmallestDomain);
	let mut opt = Optimizer::new(&ctx, config);
	let solution = opt.optimize(&mut ctx, None).unwrap();
	assert_eq!(solution.nsol, 2680);
	assert_eq!(solution.backtracks, 28405);
}
