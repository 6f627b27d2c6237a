//! Module containing the trailing store used to undo scalar mutations made
//! during search.
//!
//! Every bound tightened on a [`Variable`](crate::variable::Variable) or
//! flag flipped on a [`Disjunction`](crate::disjunction::Disjunction) is
//! recorded here before being overwritten, so that [`Trail::back`] can
//! restore the exact prior state. This is a direct translation of
//! `examples/original_source/store/store.py`'s `assign`/`push`/`back`
//! trio: the untyped `(obj, att, getattr(obj, att))` record becomes a
//! closed [`TrailEvent`] enum naming exactly the trailed fields that exist
//! in the model, so the trail stays statically typed without losing the
//! original's "record prior value, then overwrite" shape.

use tracing::trace;

use crate::{
	disjunction::{Disjunction, DisjunctionId},
	variable::{IntVal, VarId, Variable},
	Tri,
};

/// One undone-and-redoable mutation recorded on the trail.
///
/// Each variant carries the identity of the field that changed and the value
/// it held immediately before the change, mirroring
/// `store.assign(obj, att, value)` in the original implementation.
#[derive(Debug, Clone, Copy)]
enum TrailEvent {
	/// Prior value of [`Variable::inf`](crate::variable::Variable).
	VarInf(VarId, IntVal),
	/// Prior value of [`Variable::sup`](crate::variable::Variable).
	VarSup(VarId, IntVal),
	/// Prior value of [`Disjunction::left`](crate::disjunction::Disjunction).
	DisjLeft(DisjunctionId, Tri),
	/// Prior value of [`Disjunction::right`](crate::disjunction::Disjunction).
	DisjRight(DisjunctionId, Tri),
	/// Prior value of [`Disjunction::active`](crate::disjunction::Disjunction).
	DisjActive(DisjunctionId, bool),
}

/// A stack of undo-logs partitioned into scoped "worlds".
///
/// `push` opens a new world; `assign_*` records the prior value of a trailed
/// field before it is overwritten; `back` restores the top world's records,
/// in reverse insertion order, and discards the world.
#[derive(Debug, Default)]
pub struct Trail {
	/// Flat log of events across all currently open worlds.
	events: Vec<TrailEvent>,
	/// For each open world, the length of `events` when it was opened.
	frames: Vec<usize>,
}

impl Trail {
	/// Create an empty trail at world 0.
	pub fn new() -> Self {
		Self::default()
	}

	/// The index of the currently open world (0 before any `push`).
	pub fn current(&self) -> usize {
		self.frames.len()
	}

	/// Open a new world. Every mutation recorded after this call is undone by
	/// the matching [`Trail::back`].
	pub fn push(&mut self) {
		trace!(world = self.frames.len() + 1, "push");
		self.frames.push(self.events.len());
	}

	/// Restore the most recently opened world to its state before the
	/// matching [`Trail::push`], and close it.
	///
	/// # Panics
	/// Panics if called with no world open; closing a world that was never
	/// opened is a programming error, not a recoverable condition.
	pub fn back(&mut self, vars: &mut index_vec::IndexVec<VarId, Variable>, disjunctions: &mut index_vec::IndexVec<DisjunctionId, Disjunction>) {
		let start = self.frames.pop().expect("back on an empty trail");
		trace!(world = self.frames.len() + 1, "back");
		while self.events.len() > start {
			match self.events.pop().expect("checked by loop condition") {
				TrailEvent::VarInf(id, v) => vars[id].inf = v,
				TrailEvent::VarSup(id, v) => vars[id].sup = v,
				TrailEvent::DisjLeft(id, v) => disjunctions[id].left = v,
				TrailEvent::DisjRight(id, v) => disjunctions[id].right = v,
				TrailEvent::DisjActive(id, v) => disjunctions[id].active = v,
			}
		}
	}

	/// Repeatedly [`Trail::back`] until [`Trail::current`] equals `world`.
	pub fn backtrack(&mut self, world: usize, vars: &mut index_vec::IndexVec<VarId, Variable>, disjunctions: &mut index_vec::IndexVec<DisjunctionId, Disjunction>) {
		while self.current() > world {
			self.back(vars, disjunctions);
		}
	}

	/// Record the prior value of `Variable::inf` before it is overwritten.
	///
	/// No-op (and nothing is recorded) before the first `push`, since those
	/// mutations can never be undone.
	pub(crate) fn assign_var_inf(&mut self, id: VarId, prior: IntVal) {
		if !self.frames.is_empty() {
			self.events.push(TrailEvent::VarInf(id, prior));
		}
	}

	/// Record the prior value of `Variable::sup` before it is overwritten.
	pub(crate) fn assign_var_sup(&mut self, id: VarId, prior: IntVal) {
		if !self.frames.is_empty() {
			self.events.push(TrailEvent::VarSup(id, prior));
		}
	}

	/// Record the prior value of `Disjunction::left` before it is overwritten.
	pub(crate) fn assign_disj_left(&mut self, id: DisjunctionId, prior: Tri) {
		if !self.frames.is_empty() {
			self.events.push(TrailEvent::DisjLeft(id, prior));
		}
	}

	/// Record the prior value of `Disjunction::right` before it is overwritten.
	pub(crate) fn assign_disj_right(&mut self, id: DisjunctionId, prior: Tri) {
		if !self.frames.is_empty() {
			self.events.push(TrailEvent::DisjRight(id, prior));
		}
	}

	/// Record the prior value of `Disjunction::active` before it is
	/// overwritten.
	pub(crate) fn assign_disj_active(&mut self, id: DisjunctionId, prior: bool) {
		if !self.frames.is_empty() {
			self.events.push(TrailEvent::DisjActive(id, prior));
		}
	}
}

/// A scoped token standing for one open trail world.
///
/// Opening a world via [`TrailGuard::open`] and closing it via
/// [`TrailGuard::back`] on every exit path (including a `?`-propagated
/// [`Contradiction`](crate::error::Contradiction)) keeps push/back strictly
/// paired even through deep recursive propagation. The token carries no
/// data of its own; it exists so the borrow checker flags a call site that
/// opened a world
/// and forgot to close it.
pub(crate) struct TrailGuard;

impl TrailGuard {
	/// Open a new trail world and return a token for it.
	pub(crate) fn open(trail: &mut Trail) -> Self {
		trail.push();
		TrailGuard
	}

	/// Restore the world this token stands for.
	pub(crate) fn back(self, vars: &mut index_vec::IndexVec<VarId, Variable>, disjunctions: &mut index_vec::IndexVec<DisjunctionId, Disjunction>, trail: &mut Trail) {
		trail.back(vars, disjunctions);
	}
}

#[cfg(test)]
mod tests {
	use index_vec::IndexVec;

	use super::*;
	use crate::variable::Variable;

	#[test]
	fn push_back_restores_bit_identical_state() {
		let mut trail = Trail::new();
		let mut vars: IndexVec<VarId, Variable> = IndexVec::new();
		let disjunctions: IndexVec<DisjunctionId, Disjunction> = IndexVec::new();
		let id = vars.push(Variable::new("v".into(), 0, 10));

		assert_eq!(trail.current(), 0);
		trail.push();
		trail.assign_var_inf(id, vars[id].inf);
		vars[id].inf = 5;
		trail.assign_var_inf(id, vars[id].inf);
		vars[id].inf = 7;
		trail.push();
		trail.assign_var_sup(id, vars[id].sup);
		vars[id].sup = 9;
		let mut disjunctions = disjunctions;
		trail.back(&mut vars, &mut disjunctions);
		trail.back(&mut vars, &mut disjunctions);

		assert_eq!(vars[id].inf, 0);
		assert_eq!(vars[id].sup, 10);
		assert_eq!(trail.current(), 0);
	}

	#[test]
	fn backtrack_to_world_restores_current() {
		let mut trail = Trail::new();
		let mut vars: IndexVec<VarId, Variable> = IndexVec::new();
		let mut disjunctions: IndexVec<DisjunctionId, Disjunction> = IndexVec::new();
		let id = vars.push(Variable::new("v".into(), 0, 10));

		let w = trail.current();
		trail.push();
		trail.assign_var_inf(id, vars[id].inf);
		vars[id].inf = 3;
		trail.push();
		trail.assign_var_inf(id, vars[id].inf);
		vars[id].inf = 4;
		trail.push();
		trail.assign_var_inf(id, vars[id].inf);
		vars[id].inf = 5;

		trail.backtrack(w, &mut vars, &mut disjunctions);
		assert_eq!(trail.current(), w);
		assert_eq!(vars[id].inf, 0);
	}

	#[test]
	#[should_panic(expected = "back on an empty trail")]
	fn back_on_empty_trail_panics() {
		let mut trail = Trail::new();
		let mut vars: IndexVec<VarId, Variable> = IndexVec::new();
		let mut disjunctions: IndexVec<DisjunctionId, Disjunction> = IndexVec::new();
		trail.back(&mut vars, &mut disjunctions);
	}
}
