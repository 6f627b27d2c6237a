//! Depth-first branch-and-bound search over a [`SolverContext`]: disjunctive
//! branching, variable labeling (enumeration or dichotomy), bound
//! enforcement, and the pluggable heuristics that pick what to branch on and
//! which side to try first.
//!
//! Grounded on `examples/original_source/cobra/solver.py`'s `Optimizer`
//! class. The original signals every one of "propagation failed", "a
//! solution was found and the caller should keep searching" and "this
//! subtree is exhausted" with the same `FAIL` exception, caught identically
//! one level up the call stack; [`Unwind`] is the uniform `Result` stand-in
//! for all three. A genuinely different condition — a timeout firing between
//! propagation steps — gets its own variant so it can bypass "try the other
//! branch" and unwind straight to [`Optimizer::optimize`], mirroring the
//! original's separate `KeyboardInterrupt` handling around the top-level
//! `solve()` call.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use itertools::Itertools;
use tracing::{debug, info};

use crate::{
	context::SolverContext,
	disjunction::DisjunctionId,
	error::{Contradiction, ModelError},
	variable::{IntVal, VarId},
};

/// Which branching strategy the search uses at each node.
///
/// The ordinal layout matches the documented external option codes exactly;
/// `1` is reserved for `SetTimes` and deliberately has no corresponding
/// search behaviour (see [`SearchMode::SetTimes`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SearchMode {
	/// Binary choice on the next unresolved disjunction.
	Disjunctive = 0,
	/// Reserved, unimplemented: a timetabling-style search over resource
	/// profiles, present in the original source only as a dead code path
	/// never reached from its own benchmarks. [`Optimizer::optimize`]
	/// rejects this variant with [`ModelError::Unimplemented`].
	SetTimes = 1,
	/// Labeling: fix the next variable to its current lower bound, or
	/// exclude it and retry.
	Enumerate = 2,
	/// Labeling: split the next variable's domain at its midpoint.
	Dichotomy = 3,
}

/// Once-applied reordering of the disjunction list before search starts.
/// Only consulted when an objective is configured, matching the original
/// source's reordering block being nested inside `if self.OBJECTIVE:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DisjunctionStaticOrder {
	/// Declaration order, unchanged.
	Keep = 0,
	/// Declaration order, reversed.
	Reverse = 1,
	/// Increasing minimum earliest-start of the two sides.
	Earliest = 2,
	/// Decreasing minimum earliest-start of the two sides.
	Latest = 3,
	/// Increasing proximity.
	SmallestProximity = 4,
}

/// Which unresolved disjunction the dynamic branching heuristic picks next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DisjunctionChoice {
	/// The first unresolved disjunction in (possibly reordered) declaration
	/// order.
	Implementation = 0,
	/// The unresolved disjunction of maximum weight (first tie wins).
	MaxWeight = 1,
	/// The unresolved disjunction of maximum proximity (first tie wins).
	MaxProximity = 2,
	/// Among those tied for maximum weight, the one of smallest
	/// minimum-earliest-start (first tie wins).
	WeightThenEarliest = 3,
	/// The unresolved disjunction of maximum minimum-earliest-start (first
	/// tie wins).
	MaxMinEst = 4,
	/// Among those tied for maximum minimum-earliest-start, the one of
	/// smallest proximity (first tie wins).
	SmallestProxOfMaxMinEst = 5,
}

/// Which side of a chosen disjunction is tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DisjunctionSide {
	/// Always the left child.
	Declaration = 0,
	/// The heavier (by weight) child.
	Heavier = 1,
	/// The lighter (by weight) child.
	Lighter = 2,
	/// The child whose task starts latest.
	LatestStart = 3,
	/// The child whose task starts earliest.
	EarliestStart = 4,
	/// The child whose task ends latest.
	LatestEnd = 5,
	/// The child whose task ends earliest.
	EarliestEnd = 6,
}

/// Which unfixed variable the labeling search picks next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VariableChoice {
	/// The first unfixed variable in declaration order.
	Declaration = 0,
	/// The unfixed variable of smallest current domain (first tie wins).
	SmallestDomain = 1,
}

/// Whether a found solution unwinds all the way to [`Optimizer::optimize`]'s
/// top-level loop (tightening the bound and restarting the whole search from
/// the root) or only bubbles up one level of the recursive search (so the
/// bound is re-asserted and the search continues from where it stood).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktrackMode {
	/// A solution unwinds to the top of [`Optimizer::optimize`]; the whole
	/// tree is searched again from scratch under the tightened bound.
	RestartFromRoot,
	/// A solution is treated as an ordinary failure one level up; the
	/// bound is re-asserted after every single backtrack, not just after a
	/// solution.
	Chronological,
}

/// Builder-style configuration for an [`Optimizer`], matching the original
/// `Optimizer` constructor's parameter list and default values.
#[derive(Debug, Clone)]
pub struct SolverConfig {
	objective: Option<VarId>,
	search: SearchMode,
	minimise: bool,
	initial_bound: Option<IntVal>,
	bound_increment: Option<IntVal>,
	backtrack_mode: BacktrackMode,
	disj_static: DisjunctionStaticOrder,
	disj_choice: DisjunctionChoice,
	disj_side: DisjunctionSide,
	var_choice: VariableChoice,
}

impl SolverConfig {
	/// A configuration running `search` with every heuristic at its
	/// default, no objective, and "restart from root" backtracking.
	pub fn new(search: SearchMode) -> Self {
		Self {
			objective: None,
			search,
			minimise: true,
			initial_bound: None,
			bound_increment: None,
			backtrack_mode: BacktrackMode::RestartFromRoot,
			disj_static: DisjunctionStaticOrder::Earliest,
			disj_choice: DisjunctionChoice::MaxWeight,
			disj_side: DisjunctionSide::Declaration,
			var_choice: VariableChoice::Declaration,
		}
	}

	/// Minimise (or, with `minimise = false`, maximise) `objective`.
	pub fn with_objective(mut self, objective: VarId, minimise: bool) -> Self {
		self.objective = Some(objective);
		self.minimise = minimise;
		self
	}

	/// Seed the bound from `value` rather than from the objective's own
	/// current extreme bound.
	pub fn with_initial_bound(mut self, value: IntVal) -> Self {
		self.initial_bound = Some(value);
		self
	}

	/// Tighten the bound by `increment` (rather than [`crate::UN`]) after
	/// each solution.
	pub fn with_bound_increment(mut self, increment: IntVal) -> Self {
		self.bound_increment = Some(increment);
		self
	}

	/// Select the backtracking discipline.
	pub fn with_backtrack_mode(mut self, mode: BacktrackMode) -> Self {
		self.backtrack_mode = mode;
		self
	}

	/// Select the static disjunction reordering applied once before search.
	pub fn with_disj_static(mut self, order: DisjunctionStaticOrder) -> Self {
		self.disj_static = order;
		self
	}

	/// Select the dynamic disjunction-choice heuristic.
	pub fn with_disj_choice(mut self, choice: DisjunctionChoice) -> Self {
		self.disj_choice = choice;
		self
	}

	/// Select the disjunction side-selection heuristic.
	pub fn with_disj_side(mut self, side: DisjunctionSide) -> Self {
		self.disj_side = side;
		self
	}

	/// Select the variable-choice heuristic used by labeling search.
	pub fn with_var_choice(mut self, choice: VariableChoice) -> Self {
		self.var_choice = choice;
		self
	}
}

/// An immutable snapshot of the best (or, in a decision problem, the first)
/// solution found, plus the search statistics accumulated along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
	/// Every searched variable's fixed value, keyed by name.
	pub vars: HashMap<String, IntVal>,
	/// Name of the objective variable, if one was configured.
	pub objective_name: Option<String>,
	/// Value of the objective variable in this solution, if one was
	/// configured and a solution was found.
	pub objective_value: Option<IntVal>,
	/// Total backtracks across the whole search.
	pub backtracks: u64,
	/// Backtracks accumulated strictly after the last (best) solution was
	/// found, i.e. spent proving no better solution exists.
	pub proof_backtracks: u64,
	/// Wall-clock time spent inside [`Optimizer::optimize`].
	pub duration: Duration,
	/// Whether the search ran to completion (proved optimality / exhausted
	/// the tree) rather than being cut short by a timeout.
	pub completion: bool,
	/// Number of feasible leaves visited.
	pub nsol: u64,
}

/// Depth-first branch-and-bound search over a fixed snapshot of a
/// [`SolverContext`]'s registered variables and disjunctions.
pub struct Optimizer {
	config: SolverConfig,
	vars: Vec<VarId>,
	disjunctions: Vec<DisjunctionId>,
}

/// Signal threaded through the recursive search in place of the original
/// implementation's overloaded `FAIL` exception: [`Unwind::Fail`] covers all
/// three of "propagation failed", "a solution was accepted, keep searching"
/// and "this subtree is exhausted"; [`Unwind::TimedOut`] is the one case the
/// original handles as a genuinely distinct exception and must bypass
/// "try the other branch" entirely.
enum Unwind {
	/// Ordinary failure: backtrack and try the alternative, or propagate if
	/// there is none.
	Fail(Contradiction),
	/// The deadline passed; unwind straight to [`Optimizer::optimize`]
	/// without attempting any alternative branch.
	TimedOut,
}

impl From<Contradiction> for Unwind {
	fn from(e: Contradiction) -> Self {
		Unwind::Fail(e)
	}
}

/// Mutable search progress, reset at the top of every [`Optimizer::optimize`]
/// call. Kept separate from `Optimizer` itself so a single `Optimizer` can be
/// reused across repeated `optimize()` calls against evolving contexts.
struct Run {
	bound: Option<IntVal>,
	all_sol: bool,
	total_backtracks: u64,
	run_backtracks: u64,
	nsol: u64,
	current_solution: HashMap<String, IntVal>,
}

impl Run {
	fn new(all_sol: bool) -> Self {
		Self { bound: None, all_sol, total_backtracks: 0, run_backtracks: 0, nsol: 0, current_solution: HashMap::new() }
	}
}

impl Optimizer {
	/// Snapshot every variable and disjunction currently registered in `ctx`
	/// and configure a search over them.
	pub fn new(ctx: &SolverContext, config: SolverConfig) -> Self {
		let vars: Vec<VarId> = ctx.vars().iter_enumerated().map(|(id, _)| id).collect();
		let disjunctions: Vec<DisjunctionId> = ctx.disjunctions().iter_enumerated().map(|(id, _)| id).collect();
		Self { config, vars, disjunctions }
	}

	/// Run the search to completion or until `timeout` elapses.
	///
	/// Restores `ctx`'s trail to its pre-search depth before returning,
	/// regardless of how the search ended.
	pub fn optimize(&mut self, ctx: &mut SolverContext, timeout: Option<Duration>) -> Result<Solution, ModelError> {
		if matches!(self.config.search, SearchMode::SetTimes) {
			return Err(ModelError::Unimplemented(SearchMode::SetTimes));
		}

		if self.config.objective.is_some() {
			self.reorder_disjunctions(ctx);
		}

		let mut run = Run::new(matches!(self.config.backtrack_mode, BacktrackMode::Chronological));
		if let Some(obj) = self.config.objective {
			let current = ctx.var(obj);
			run.bound = Some(if self.config.minimise {
				self.config.initial_bound.map_or(current.sup, |b| b.min(current.sup))
			} else {
				self.config.initial_bound.map_or(current.inf, |b| b.max(current.inf))
			});
		}

		let start = Instant::now();
		let deadline = timeout.map(|d| start + d);
		let entry_world = ctx.trail_depth();

		info!(search = ?self.config.search, objective = ?self.config.objective, "optimize: start");
		let completion = self.solve(ctx, &mut run, deadline);
		ctx.backtrack_to(entry_world);
		run.total_backtracks += run.run_backtracks;
		info!(nsol = run.nsol, backtracks = run.total_backtracks, completion, "optimize: done");

		let objective_name = self.config.objective.map(|id| ctx.var(id).name.clone());
		let objective_value = objective_name.as_ref().and_then(|name| run.current_solution.get(name).copied());

		Ok(Solution {
			vars: run.current_solution,
			objective_name,
			objective_value,
			backtracks: run.total_backtracks,
			proof_backtracks: if completion { run.run_backtracks } else { 0 },
			duration: start.elapsed(),
			completion,
			nsol: run.nsol,
		})
	}

	/// Replay `solution` against `vars` by asserting `isEQ` for each in
	/// turn, restoring the trail regardless of outcome. Returns whether
	/// every assertion succeeded. Grounded on
	/// `examples/original_source/cobra/solver.py`'s `validate`.
	pub fn validate(ctx: &mut SolverContext, vars: &[VarId], solution: &Solution) -> bool {
		let world = ctx.trail_depth();
		let guard = ctx.open_world();
		let mut ok = true;
		for &v in vars {
			let name = ctx.var(v).name.clone();
			let accepted = match solution.vars.get(&name) {
				Some(&value) => ctx.var_is_eq(v, value).is_ok(),
				None => false,
			};
			if !accepted {
				ok = false;
				break;
			}
		}
		ctx.close_world(guard);
		debug_assert_eq!(ctx.trail_depth(), world, "validate must restore the trail it opened");
		ok
	}

	/// Top-level search loop: repeatedly runs one search attempt under the
	/// current bound. In "restart from root" mode a successful attempt
	/// (`Ok`) means a solution unwound all the way up and the bound has
	/// been tightened, so the loop tries again from scratch; in
	/// "chronological" mode the single top-level attempt already visited
	/// every leaf, so `Ok` ends the loop. Returns whether the search
	/// completed (as opposed to timing out).
	fn solve(&self, ctx: &mut SolverContext, run: &mut Run, deadline: Option<Instant>) -> bool {
		let world = ctx.open_world();
		let completion = loop {
			if self.enforce_bound(ctx, run).is_err() {
				break true;
			}
			let outcome = match self.config.search {
				SearchMode::Disjunctive => self.search_disjunctive(ctx, run, deadline),
				SearchMode::Enumerate => self.enumerate(ctx, run, deadline),
				SearchMode::Dichotomy => self.dichotomy(ctx, run, deadline),
				SearchMode::SetTimes => unreachable!("rejected before solve() is reached"),
			};
			match outcome {
				Ok(()) => {
					if self.config.objective.is_none() {
						break true;
					}
					// A solution unwound to the top under "restart from
					// root": try again from scratch under the tightened
					// bound.
				}
				Err(Unwind::Fail(_)) => break true,
				Err(Unwind::TimedOut) => break false,
			}
		};
		ctx.close_world(world);
		completion
	}

	/// Disjunctive branching: pick the next unresolved disjunction, commit
	/// one side under a new trail frame, recurse; on failure, backtrack,
	/// count the attempt, re-assert the bound, try the other side.
	fn search_disjunctive(&self, ctx: &mut SolverContext, run: &mut Run, deadline: Option<Instant>) -> Result<(), Unwind> {
		check_deadline(deadline)?;
		let Some(d) = self.next_disjunction(ctx) else {
			return self.accept_leaf(ctx, run);
		};
		let left = self.left_first(ctx, d);

		let world = ctx.open_world();
		let first = match ctx.settle(d, left) {
			Err(e) => Err(Unwind::from(e)),
			Ok(()) => self.search_disjunctive(ctx, run, deadline),
		};
		match first {
			Ok(()) => {
				ctx.close_world(world);
				Ok(())
			}
			Err(Unwind::TimedOut) => {
				ctx.close_world(world);
				Err(Unwind::TimedOut)
			}
			Err(Unwind::Fail(_)) => {
				ctx.close_world(world);
				run.run_backtracks += 1;
				self.enforce_backtrack_bound(ctx, run)?;

				let world2 = ctx.open_world();
				let second = match ctx.settle(d, !left) {
					Err(e) => Err(Unwind::from(e)),
					Ok(()) => self.search_disjunctive(ctx, run, deadline),
				};
				match second {
					Ok(()) => {
						ctx.close_world(world2);
						Ok(())
					}
					Err(Unwind::TimedOut) => {
						ctx.close_world(world2);
						Err(Unwind::TimedOut)
					}
					Err(Unwind::Fail(e)) => {
						ctx.close_world(world2);
						run.run_backtracks += 1;
						Err(Unwind::Fail(e))
					}
				}
			}
		}
	}

	/// Labeling by enumeration: fix the next unfixed variable to its
	/// current lower bound; on failure, exclude that value and retry.
	fn enumerate(&self, ctx: &mut SolverContext, run: &mut Run, deadline: Option<Instant>) -> Result<(), Unwind> {
		check_deadline(deadline)?;
		let Some(x) = self.next_var(ctx) else {
			return self.accept_leaf(ctx, run);
		};
		let v = ctx.var(x).inf;

		let world = ctx.open_world();
		let first = match ctx.var_is_eq(x, v) {
			Err(e) => Err(Unwind::from(e)),
			Ok(()) => self.enumerate(ctx, run, deadline),
		};
		match first {
			Ok(()) => {
				ctx.close_world(world);
				Ok(())
			}
			Err(Unwind::TimedOut) => {
				ctx.close_world(world);
				Err(Unwind::TimedOut)
			}
			Err(Unwind::Fail(_)) => {
				ctx.close_world(world);
				run.run_backtracks += 1;
				match ctx.var_is_ge(x, v + crate::UN) {
					Err(e) => Err(Unwind::from(e)),
					Ok(()) => {
						self.enforce_backtrack_bound(ctx, run)?;
						self.enumerate(ctx, run, deadline)
					}
				}
			}
		}
	}

	/// Labeling by dichotomy: split the next unfixed variable's domain at
	/// its midpoint; on failure, try the upper half.
	fn dichotomy(&self, ctx: &mut SolverContext, run: &mut Run, deadline: Option<Instant>) -> Result<(), Unwind> {
		check_deadline(deadline)?;
		let Some(x) = self.next_var(ctx) else {
			return self.accept_leaf(ctx, run);
		};
		let var = ctx.var(x);
		// Floor division, matching the original's `//`: Rust's `/` truncates
		// toward zero, which for a negative sum would pick a midpoint equal
		// to `sup` and stall the split.
		let mid = (var.inf + var.sup).div_euclid(crate::DEUX);

		let world = ctx.open_world();
		let first = match ctx.var_is_le(x, mid) {
			Err(e) => Err(Unwind::from(e)),
			Ok(()) => self.dichotomy(ctx, run, deadline),
		};
		match first {
			Ok(()) => {
				ctx.close_world(world);
				Ok(())
			}
			Err(Unwind::TimedOut) => {
				ctx.close_world(world);
				Err(Unwind::TimedOut)
			}
			Err(Unwind::Fail(_)) => {
				ctx.close_world(world);
				run.run_backtracks += 1;
				self.enforce_backtrack_bound(ctx, run)?;

				let world2 = ctx.open_world();
				let second = match ctx.var_is_ge(x, mid + crate::UN) {
					Err(e) => Err(Unwind::from(e)),
					Ok(()) => self.dichotomy(ctx, run, deadline),
				};
				match second {
					Ok(()) => {
						ctx.close_world(world2);
						Ok(())
					}
					Err(Unwind::TimedOut) => {
						ctx.close_world(world2);
						Err(Unwind::TimedOut)
					}
					Err(Unwind::Fail(e)) => {
						ctx.close_world(world2);
						run.run_backtracks += 1;
						Err(Unwind::Fail(e))
					}
				}
			}
		}
	}

	/// A feasible leaf was reached: record it, and either keep searching
	/// (`ALLSOL`, i.e. anything but root-mode-with-no-objective) or accept
	/// it as the final answer.
	fn accept_leaf(&self, ctx: &SolverContext, run: &mut Run) -> Result<(), Unwind> {
		debug!(nsol = run.nsol + 1, "solution");
		run.nsol += 1;
		for &v in &self.vars {
			let var = ctx.var(v);
			run.current_solution.insert(var.name.clone(), var.inf);
		}
		self.update_bound(ctx, run);
		run.total_backtracks += run.run_backtracks;
		run.run_backtracks = 0;
		if run.all_sol {
			Err(Unwind::Fail(Contradiction::message("solution accepted, continuing search")))
		} else {
			Ok(())
		}
	}

	/// Assert `objective <= bound` (or the maximising mirror), once per
	/// search descent.
	fn enforce_bound(&self, ctx: &mut SolverContext, run: &Run) -> Result<(), Contradiction> {
		match (self.config.objective, run.bound) {
			(Some(obj), Some(bound)) => {
				if self.config.minimise {
					ctx.var_is_le(obj, bound)
				} else {
					ctx.var_is_ge(obj, bound)
				}
			}
			_ => Ok(()),
		}
	}

	/// In chronological mode the bound is re-asserted after every single
	/// backtrack, not only after a solution; in root mode it is not
	/// (the next bound tightening only happens when a solution itself
	/// unwinds to the top).
	fn enforce_backtrack_bound(&self, ctx: &mut SolverContext, run: &Run) -> Result<(), Unwind> {
		if matches!(self.config.backtrack_mode, BacktrackMode::Chronological) {
			self.enforce_bound(ctx, run).map_err(Unwind::from)
		} else {
			Ok(())
		}
	}

	/// `bound := min(bound, objective.inf) - increment` (maximising
	/// mirror: `max(bound, objective.sup) + increment`). Deliberately the
	/// exact original formula, not a tighter-looking "fix": reproducing the
	/// reference backtrack counts depends on it.
	fn update_bound(&self, ctx: &SolverContext, run: &mut Run) {
		let Some(obj) = self.config.objective else { return };
		let current = ctx.var(obj);
		let increment = self.config.bound_increment.unwrap_or(crate::UN);
		let bound = run.bound.expect("bound is seeded whenever an objective is configured");
		run.bound = Some(if self.config.minimise { bound.min(current.inf) - increment } else { bound.max(current.sup) + increment });
	}

	/// Apply the once-only static disjunction reordering configured by
	/// [`SolverConfig::with_disj_static`]. Only called when an objective is
	/// configured, matching the original source nesting this block inside
	/// `if self.OBJECTIVE:`.
	fn reorder_disjunctions(&mut self, ctx: &SolverContext) {
		match self.config.disj_static {
			DisjunctionStaticOrder::Keep => {}
			DisjunctionStaticOrder::Reverse => self.disjunctions.reverse(),
			DisjunctionStaticOrder::Earliest => {
				self.disjunctions.sort_by_key(|&d| disjunction_min_est(ctx, d));
			}
			DisjunctionStaticOrder::Latest => {
				self.disjunctions.sort_by_key(|&d| std::cmp::Reverse(disjunction_min_est(ctx, d)));
			}
			DisjunctionStaticOrder::SmallestProximity => {
				self.disjunctions.sort_by_key(|&d| ctx.disjunction_proximity(d));
			}
		}
	}

	/// The next unresolved disjunction to branch on, per
	/// [`SolverConfig::with_disj_choice`]. `None` once every disjunction is
	/// settled.
	fn next_disjunction(&self, ctx: &SolverContext) -> Option<DisjunctionId> {
		let candidates = || {
			self.disjunctions.iter().copied().filter(|&d| {
				let dd = &ctx.disjunctions()[d];
				dd.active && (dd.left == crate::Tri::Unknown || dd.right == crate::Tri::Unknown)
			})
		};
		match self.config.disj_choice {
			DisjunctionChoice::Implementation => candidates().next(),
			DisjunctionChoice::MaxWeight => first_max_by_key(candidates(), |&d| ctx.disjunction_weight(d)),
			DisjunctionChoice::MaxProximity => first_max_by_key(candidates(), |&d| ctx.disjunction_proximity(d)),
			DisjunctionChoice::WeightThenEarliest => {
				let tied = tied_max_by_key(candidates(), |&d| ctx.disjunction_weight(d));
				first_min_by_key(tied.into_iter(), |&d| disjunction_min_est(ctx, d))
			}
			DisjunctionChoice::MaxMinEst => first_max_by_key(candidates(), |&d| disjunction_min_est(ctx, d)),
			DisjunctionChoice::SmallestProxOfMaxMinEst => {
				let tied = tied_max_by_key(candidates(), |&d| disjunction_min_est(ctx, d));
				first_min_by_key(tied.into_iter(), |&d| ctx.disjunction_proximity(d))
			}
		}
	}

	/// Whether `d`'s left child should be tried before its right child, per
	/// [`SolverConfig::with_disj_side`].
	fn left_first(&self, ctx: &SolverContext, d: DisjunctionId) -> bool {
		match self.config.disj_side {
			DisjunctionSide::Declaration => true,
			DisjunctionSide::Heavier => ctx.disjunction_child_weight(d, 0) >= ctx.disjunction_child_weight(d, 1),
			DisjunctionSide::Lighter => ctx.disjunction_child_weight(d, 1) >= ctx.disjunction_child_weight(d, 0),
			DisjunctionSide::LatestStart => side_est(ctx, d, 0) >= side_est(ctx, d, 1),
			DisjunctionSide::EarliestStart => side_est(ctx, d, 0) <= side_est(ctx, d, 1),
			DisjunctionSide::LatestEnd => side_ect(ctx, d, 0) >= side_ect(ctx, d, 1),
			DisjunctionSide::EarliestEnd => side_ect(ctx, d, 0) <= side_ect(ctx, d, 1),
		}
	}

	/// The next unfixed variable to label, per
	/// [`SolverConfig::with_var_choice`]. `None` once every variable is
	/// fixed.
	fn next_var(&self, ctx: &SolverContext) -> Option<VarId> {
		let candidates = || self.vars.iter().copied().filter(|&v| !ctx.var(v).is_fixed());
		match self.config.var_choice {
			VariableChoice::Declaration => candidates().next(),
			VariableChoice::SmallestDomain => first_min_by_key(candidates(), |&v| {
				let var = ctx.var(v);
				var.sup - var.inf
			}),
		}
	}
}

/// Bail out with [`Unwind::TimedOut`] if `deadline` has passed.
fn check_deadline(deadline: Option<Instant>) -> Result<(), Unwind> {
	match deadline {
		Some(dl) if Instant::now() >= dl => Err(Unwind::TimedOut),
		_ => Ok(()),
	}
}

/// `min(est(side 0), est(side 1))`: the minimum earliest-start across a
/// disjunction's two sides, used by the `Earliest`/`Latest` static ordering
/// and the `MaxMinEst`/`SmallestProxOfMaxMinEst` dynamic choice heuristics.
fn disjunction_min_est(ctx: &SolverContext, d: DisjunctionId) -> IntVal {
	side_est(ctx, d, 0).min(side_est(ctx, d, 1))
}

/// Current lower bound of `d`'s `side`-th child's own task-start variable.
fn side_est(ctx: &SolverContext, d: DisjunctionId, side: usize) -> IntVal {
	ctx.var(ctx.disjunction_side_var(d, side)).inf
}

/// `side_est(d, side) + d`'s `side`-th child's own weight: a proxy for that
/// side's earliest completion, used by the `LatestEnd`/`EarliestEnd` side
/// heuristics.
fn side_ect(ctx: &SolverContext, d: DisjunctionId, side: usize) -> IntVal {
	side_est(ctx, d, side) + ctx.disjunction_child_weight(d, side)
}

/// First element of maximum `key` (ties keep the earliest-seen element),
/// matching Python's `max()` tie-breaking. Rust's `Iterator::max_by_key`
/// keeps the *last* tied element, so this is reimplemented by hand rather
/// than reused, per `examples/original_source/cobra/solver.py`'s reliance on
/// `max()`'s stability for exact backtrack-count reproduction.
fn first_max_by_key<T: Copy>(iter: impl Iterator<Item = T>, key: impl Fn(&T) -> IntVal) -> Option<T> {
	let mut best: Option<(IntVal, T)> = None;
	for item in iter {
		let k = key(&item);
		if best.as_ref().map_or(true, |(bk, _)| k > *bk) {
			best = Some((k, item));
		}
	}
	best.map(|(_, item)| item)
}

/// First element of minimum `key` (ties keep the earliest-seen element);
/// this already matches `Iterator::min_by_key`'s own tie-breaking, but is
/// kept alongside [`first_max_by_key`] for symmetry with the original
/// source's paired `min()`/`max()` calls.
fn first_min_by_key<T: Copy>(iter: impl Iterator<Item = T>, key: impl Fn(&T) -> IntVal) -> Option<T> {
	let mut best: Option<(IntVal, T)> = None;
	for item in iter {
		let k = key(&item);
		if best.as_ref().map_or(true, |(bk, _)| k < *bk) {
			best = Some((k, item));
		}
	}
	best.map(|(_, item)| item)
}

/// Every element tied for the maximum `key`, in original relative order.
/// Reimplements `examples/original_source/cobra/solver.py`'s four-line
/// `maxs` helper (there is no single `itertools` combinator for "all maxima,
/// not just one"): sort descending by `key`, then take the leading run of
/// equal keys via `chunk_by`.
fn tied_max_by_key<T: Copy>(iter: impl Iterator<Item = T>, key: impl Fn(&T) -> IntVal) -> Vec<T> {
	iter.sorted_by_key(|item| std::cmp::Reverse(key(item)))
		.chunk_by(|item| key(item))
		.into_iter()
		.next()
		.map(|(_, group)| group.collect())
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	/// The classic N-Queens model: one variable per row holding the queen's
	/// column, with pairwise not-equal/not-on-diagonal constraints.
	fn queens(n: i64) -> (SolverContext, Vec<VarId>) {
		let mut ctx = SolverContext::new();
		let vars: Vec<VarId> = (0..n).map(|i| ctx.new_var(format!("q{i}"), 0, n - 1).unwrap()).collect();
		for i in 0..vars.len() {
			for j in (i + 1)..vars.len() {
				let d = (j - i) as i64;
				ctx.nequxyc(vars[i], vars[j], 0).unwrap();
				ctx.nequxyc(vars[i], vars[j], -d).unwrap();
				ctx.nequxyc(vars[i], vars[j], d).unwrap();
			}
		}
		(ctx, vars)
	}

	#[test]
	fn enumerate_finds_all_solutions_for_four_queens() {
		let (mut ctx, _vars) = queens(4);
		let config = SolverConfig::new(SearchMode::Enumerate).with_backtrack_mode(BacktrackMode::Chronological);
		let mut opt = Optimizer::new(&ctx, config);
		let solution = opt.optimize(&mut ctx, None).unwrap();
		assert_eq!(solution.nsol, 2);
		assert!(solution.completion);
	}

	#[test]
	fn disjunctive_search_visits_both_sides_of_an_unconstrained_ordering() {
		// With a, b left otherwise unconstrained, both sequencings of the
		// ordering are independently feasible, so exhaustive disjunctive
		// search visits both as leaves (a leaf is "no unresolved
		// disjunction remains", not "every variable is fixed").
		let mut ctx = SolverContext::new();
		let a = ctx.new_var("a", 0, 10).unwrap();
		let b = ctx.new_var("b", 0, 10).unwrap();
		ctx.ordering(a, 3, b, 2).unwrap();
		let config = SolverConfig::new(SearchMode::Disjunctive).with_backtrack_mode(BacktrackMode::Chronological);
		let mut opt = Optimizer::new(&ctx, config);
		let solution = opt.optimize(&mut ctx, None).unwrap();
		assert_eq!(solution.nsol, 2);
	}

	#[test]
	fn set_times_is_rejected() {
		let ctx = SolverContext::new();
		let config = SolverConfig::new(SearchMode::SetTimes);
		let mut opt = Optimizer::new(&ctx, config);
		let mut ctx = ctx;
		assert!(matches!(opt.optimize(&mut ctx, None), Err(ModelError::Unimplemented(SearchMode::SetTimes))));
	}

	#[test]
	fn validate_accepts_and_restores() {
		let mut ctx = SolverContext::new();
		let v = ctx.new_var("v", 0, 10).unwrap();
		let mut sol = HashMap::new();
		sol.insert("v".to_string(), 4);
		let solution = Solution {
			vars: sol,
			objective_name: None,
			objective_value: None,
			backtracks: 0,
			proof_backtracks: 0,
			duration: Duration::from_secs(0),
			completion: true,
			nsol: 1,
		};
		let depth = ctx.trail_depth();
		assert!(Optimizer::validate(&mut ctx, &[v], &solution));
		assert_eq!(ctx.trail_depth(), depth);
		assert_eq!((ctx.var(v).inf, ctx.var(v).sup), (0, 10));
	}

	#[test]
	fn validate_rejects_a_value_outside_the_domain() {
		let mut ctx = SolverContext::new();
		let v = ctx.new_var("v", 0, 3).unwrap();
		let mut sol = HashMap::new();
		sol.insert("v".to_string(), 9);
		let solution = Solution {
			vars: sol,
			objective_name: None,
			objective_value: None,
			backtracks: 0,
			proof_backtracks: 0,
			duration: Duration::from_secs(0),
			completion: true,
			nsol: 1,
		};
		assert!(!Optimizer::validate(&mut ctx, &[v], &solution));
	}
}
