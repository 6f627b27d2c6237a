//! [`SolverContext`]: the arena owning every variable, constraint,
//! disjunction and interval posted against a model.
//!
//! The original implementation keeps these as process-wide class-level
//! lists (`Var.instances`, `Disjunction.instances`, `Interval.instances`)
//! populated by every constructor and wiped by a module-level `clear()`.
//! `SolverContext` is the explicit, non-global replacement: every
//! constructor takes `&mut SolverContext` and pushes into one of its
//! arenas, and [`SolverContext::clear`] (or simply dropping the context)
//! takes the place of the original's global reset.

use index_vec::IndexVec;

use crate::{
	constraint::{ConstraintId, ConstraintKind},
	disjunction::{Disjunction, DisjunctionId},
	interval::{Interval, IntervalId},
	trail::Trail,
	variable::{VarId, Variable},
};

/// Owns every arena a model posts into, plus the trail backing
/// backtrackable mutation across all of them.
#[derive(Debug, Default)]
pub struct SolverContext {
	/// The undo log shared by every trailed field in every arena below.
	pub(crate) trail: Trail,
	/// All variables posted so far, in declaration order.
	pub(crate) vars: IndexVec<VarId, Variable>,
	/// All unary/arithmetic constraints posted so far.
	pub(crate) constraints: IndexVec<ConstraintId, ConstraintKind>,
	/// All exclusive disjunctions posted so far, in declaration order.
	pub(crate) disjunctions: IndexVec<DisjunctionId, Disjunction>,
	/// All scheduling intervals posted so far, in declaration order.
	pub(crate) intervals: IndexVec<IntervalId, Interval>,
}

impl SolverContext {
	/// An empty context with no variables, constraints, disjunctions or
	/// intervals posted.
	pub fn new() -> Self {
		Self::default()
	}

	/// Discard every posted variable, constraint, disjunction and interval,
	/// and reset the trail. Equivalent to building a fresh
	/// [`SolverContext::new`], kept as a named operation to match the
	/// original implementation's `clear()` primitive.
	pub fn clear(&mut self) {
		*self = Self::default();
	}

	/// The variables posted so far, in declaration order. Used by the
	/// optimizer's variable-choice heuristics and by
	/// [`crate::optimizer::Optimizer::validate`].
	pub fn vars(&self) -> &IndexVec<VarId, Variable> {
		&self.vars
	}

	/// The scheduling intervals posted so far, in declaration order.
	pub fn intervals(&self) -> &IndexVec<IntervalId, Interval> {
		&self.intervals
	}

	/// The exclusive disjunctions posted so far, in declaration order.
	pub fn disjunctions(&self) -> &IndexVec<DisjunctionId, Disjunction> {
		&self.disjunctions
	}

	/// Read-only access to a posted variable's current bounds.
	pub fn var(&self, id: VarId) -> &Variable {
		&self.vars[id]
	}

	/// The trail's current world depth, i.e. the number of open `push`
	/// frames. Exposed so callers (chiefly [`crate::optimizer::Optimizer`])
	/// can snapshot a restore point before a speculative mutation.
	pub fn trail_depth(&self) -> usize {
		self.trail.current()
	}

	/// Open a new trailed world: every trailed mutation performed before the
	/// matching [`Self::close_world`] call is undone when it runs. Mirrors
	/// the original implementation's `store.push()`.
	pub(crate) fn open_world(&mut self) -> crate::trail::TrailGuard {
		crate::trail::TrailGuard::open(&mut self.trail)
	}

	/// Undo every trailed mutation performed since the matching
	/// [`Self::open_world`] call. Mirrors the original implementation's
	/// `store.back()`.
	pub(crate) fn close_world(&mut self, guard: crate::trail::TrailGuard) {
		guard.back(&mut self.vars, &mut self.disjunctions, &mut self.trail);
	}

	/// Undo every trailed mutation back to world `depth`, closing all frames
	/// opened since. Mirrors the original implementation's
	/// `store.backtrack(depth)`.
	pub(crate) fn backtrack_to(&mut self, depth: usize) {
		self.trail.backtrack(depth, &mut self.vars, &mut self.disjunctions);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clear_resets_every_arena() {
		let mut ctx = SolverContext::new();
		let _ = ctx.new_var("v", 0, 10).unwrap();
		assert_eq!(ctx.vars().len(), 1);
		ctx.clear();
		assert_eq!(ctx.vars().len(), 0);
		assert_eq!(ctx.trail_depth(), 0);
	}
}
