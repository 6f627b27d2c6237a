//! Unary and arithmetic bound-consistency propagators.
//!
//! Each [`ConstraintKind`] variant is a closed-form propagator over one,
//! two, or three variables plus a constant offset. There is no trait
//! object here: `ask`/`tell`/`incMin`/`decMax`/`setVal` are dispatched by
//! matching on the enum inside [`SolverContext`] methods, preferring a
//! small enum for the constraint role plus an index into the constraint's
//! own argument table over a trait object per propagator kind.
//!
//! `Ge`/`Le`/`Eq` never register a subscriber: once posted they only ever
//! re-assert the same bound, so there is nothing to gain from being
//! notified again. `Ne` and every arithmetic kind do subscribe, since their
//! satisfaction depends on both sides and must be re-checked as either
//! side's bounds move.

use index_vec::define_index_type;
use tracing::debug;

use crate::{
	context::SolverContext,
	error::Contradiction,
	variable::{IntVal, Slot, SubscriberRef, VarId},
	Tri, UN,
};

define_index_type! {
	/// Identifies a [`ConstraintKind`] inside a [`SolverContext`]'s arena.
	pub struct ConstraintId = u32;
}

/// A unary or arithmetic bound-consistency propagator.
#[derive(Debug, Clone, Copy)]
pub enum ConstraintKind {
	/// `v >= c`.
	Ge { v: VarId, c: IntVal },
	/// `v <= c`.
	Le { v: VarId, c: IntVal },
	/// `v == c`.
	Eq { v: VarId, c: IntVal },
	/// `v != c`.
	Ne { v: VarId, c: IntVal },
	/// `u != v + c`.
	Neq2 { u: VarId, v: VarId, c: IntVal },
	/// `u >= v + c`.
	Ge2 { u: VarId, v: VarId, c: IntVal },
	/// `u <= v + c`.
	Le2 { u: VarId, v: VarId, c: IntVal },
	/// `u == v + c`.
	Eq2 { u: VarId, v: VarId, c: IntVal },
	/// `u + v == w + c`.
	Eq3 { u: VarId, v: VarId, w: VarId, c: IntVal },
}

impl ConstraintKind {
	/// The variables this constraint ranges over, in slot order (slot `1`
	/// is the first element, etc.).
	fn slot_vars(&self) -> Vec<VarId> {
		match *self {
			ConstraintKind::Ge { v, .. }
			| ConstraintKind::Le { v, .. }
			| ConstraintKind::Eq { v, .. }
			| ConstraintKind::Ne { v, .. } => vec![v],
			ConstraintKind::Neq2 { u, v, .. }
			| ConstraintKind::Ge2 { u, v, .. }
			| ConstraintKind::Le2 { u, v, .. }
			| ConstraintKind::Eq2 { u, v, .. } => vec![u, v],
			ConstraintKind::Eq3 { u, v, w, .. } => vec![u, v, w],
		}
	}

	/// The offset constant `c`, used by the default weight/proximity
	/// formulas.
	fn offset(&self) -> IntVal {
		match *self {
			ConstraintKind::Ge { c, .. }
			| ConstraintKind::Le { c, .. }
			| ConstraintKind::Eq { c, .. }
			| ConstraintKind::Ne { c, .. }
			| ConstraintKind::Neq2 { c, .. }
			| ConstraintKind::Ge2 { c, .. }
			| ConstraintKind::Le2 { c, .. }
			| ConstraintKind::Eq2 { c, .. }
			| ConstraintKind::Eq3 { c, .. } => c,
		}
	}
}

impl SolverContext {
	/// Register `id`'s single argument on its variable at slot 1.
	fn link_unary(&mut self, id: ConstraintId) {
		let v = self.constraints[id].slot_vars()[0];
		self.vars[v].subscribers.push((SubscriberRef::Constraint(id), Slot(1)));
	}

	/// Register each of `id`'s arguments on its variable at slots `1..=n`.
	pub(crate) fn link_constraint(&mut self, id: ConstraintId) {
		for (i, v) in self.constraints[id].slot_vars().into_iter().enumerate() {
			self.vars[v].subscribers.push((SubscriberRef::Constraint(id), Slot(i + 1)));
		}
	}

	/// Post `v >= c`, tightening immediately.
	pub fn supxc(&mut self, v: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		let id = self.constraints.push(ConstraintKind::Ge { v, c });
		self.constraint_tell(id)?;
		Ok(id)
	}

	/// Post `v <= c`, tightening immediately.
	pub fn infxc(&mut self, v: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		let id = self.constraints.push(ConstraintKind::Le { v, c });
		self.constraint_tell(id)?;
		Ok(id)
	}

	/// Post `v == c`, tightening immediately.
	pub fn equxc(&mut self, v: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		let id = self.constraints.push(ConstraintKind::Eq { v, c });
		self.constraint_tell(id)?;
		Ok(id)
	}

	/// Post `v != c`, tightening immediately.
	pub fn nequxc(&mut self, v: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		let id = self.constraints.push(ConstraintKind::Ne { v, c });
		self.link_unary(id);
		self.constraint_tell(id)?;
		Ok(id)
	}

	/// Post `u != v + c`, tightening immediately.
	pub fn nequxyc(&mut self, u: VarId, v: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		let id = self.constraints.push(ConstraintKind::Neq2 { u, v, c });
		self.link_constraint(id);
		self.constraint_tell(id)?;
		Ok(id)
	}

	/// Post `u >= v + c`, tightening immediately.
	pub fn supxyc(&mut self, u: VarId, v: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		let id = self.constraints.push(ConstraintKind::Ge2 { u, v, c });
		self.link_constraint(id);
		self.constraint_tell(id)?;
		Ok(id)
	}

	/// Post `u <= v + c`, tightening immediately.
	pub fn infxyc(&mut self, u: VarId, v: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		let id = self.constraints.push(ConstraintKind::Le2 { u, v, c });
		self.link_constraint(id);
		self.constraint_tell(id)?;
		Ok(id)
	}

	/// Post `u > v + c`, i.e. `u >= v + c + 1`.
	pub fn strictsupxyc(&mut self, u: VarId, v: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		self.supxyc(u, v, c + UN)
	}

	/// Post `u < v + c`, i.e. `v >= u - c + 1`.
	pub fn strictinfxyc(&mut self, u: VarId, v: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		self.supxyc(v, u, -c + UN)
	}

	/// Post `u == v + c`, tightening immediately.
	pub fn equxyc(&mut self, u: VarId, v: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		let id = self.constraints.push(ConstraintKind::Eq2 { u, v, c });
		self.link_constraint(id);
		self.constraint_tell(id)?;
		Ok(id)
	}

	/// Post `u + v == w + c`, tightening immediately.
	pub fn equxyzc(&mut self, u: VarId, v: VarId, w: VarId, c: IntVal) -> Result<ConstraintId, Contradiction> {
		let id = self.constraints.push(ConstraintKind::Eq3 { u, v, w, c });
		self.link_constraint(id);
		self.constraint_tell(id)?;
		Ok(id)
	}

	/// Build a [`ConstraintKind`] without linking or telling it. Used when
	/// the constraint will instead be wired up as a disjunction child,
	/// whose own `link` registers the *disjunction* (not this constraint)
	/// as the subscriber.
	pub(crate) fn push_unlinked(&mut self, kind: ConstraintKind) -> ConstraintId {
		self.constraints.push(kind)
	}

	/// The variables this constraint ranges over, in slot order.
	pub(crate) fn constraint_vars(&self, id: ConstraintId) -> Vec<VarId> {
		self.constraints[id].slot_vars()
	}

	/// `abs(c)`, the weight shared by every constraint kind.
	pub(crate) fn constraint_weight(&self, id: ConstraintId) -> IntVal {
		self.constraints[id].offset().abs()
	}

	/// The proximity heuristic score: `abs(c)` by default, overridden to
	/// `abs(lv[0].inf - lv[1].inf)` for `Ge2` and `Eq2`, matching
	/// `Supxyc`/`Equxyc` in the original implementation (`Infxyc`, `Neq2`
	/// and `Eq3` are not overridden there and keep the default).
	pub(crate) fn constraint_proximity(&self, id: ConstraintId) -> IntVal {
		match self.constraints[id] {
			ConstraintKind::Ge2 { u, v, .. } | ConstraintKind::Eq2 { u, v, .. } => {
				(self.vars[u].inf - self.vars[v].inf).abs()
			}
			ref kind => kind.offset().abs(),
		}
	}

	/// Evaluate `id`'s current truth value without mutating any domain.
	pub(crate) fn constraint_ask(&self, id: ConstraintId) -> Tri {
		match self.constraints[id] {
			ConstraintKind::Ge { v, c } => {
				let v = &self.vars[v];
				if v.is_it_more(c) {
					Tri::True
				} else if v.can_not_be_more(c) {
					Tri::False
				} else {
					Tri::Unknown
				}
			}
			ConstraintKind::Le { v, c } => {
				let v = &self.vars[v];
				if v.is_it_less(c) {
					Tri::True
				} else if v.can_not_be_less(c) {
					Tri::False
				} else {
					Tri::Unknown
				}
			}
			ConstraintKind::Eq { v, c } => {
				let v = &self.vars[v];
				if v.is_it(c) {
					Tri::True
				} else if v.can_not_be(c) {
					Tri::False
				} else {
					Tri::Unknown
				}
			}
			ConstraintKind::Ne { v, c } => {
				let v = &self.vars[v];
				if v.is_it(c) {
					Tri::False
				} else if v.can_not_be(c) {
					Tri::True
				} else {
					Tri::Unknown
				}
			}
			ConstraintKind::Neq2 { u, v, c } => {
				let (u, v) = (&self.vars[u], &self.vars[v]);
				if u.sup < v.inf + c || v.sup < u.inf - c {
					Tri::True
				} else if u.is_fixed() && v.is_fixed() && u.inf == v.inf + c {
					Tri::False
				} else {
					Tri::Unknown
				}
			}
			ConstraintKind::Ge2 { u, v, c } => {
				let (u, v) = (&self.vars[u], &self.vars[v]);
				if u.sup < v.inf + c {
					Tri::False
				} else if u.inf >= v.sup + c {
					Tri::True
				} else {
					Tri::Unknown
				}
			}
			ConstraintKind::Le2 { u, v, c } => {
				let (u, v) = (&self.vars[u], &self.vars[v]);
				if v.inf >= u.sup + c {
					Tri::True
				} else if v.sup < u.inf + c {
					Tri::False
				} else {
					Tri::Unknown
				}
			}
			ConstraintKind::Eq2 { u, v, c } => {
				let (u, v) = (&self.vars[u], &self.vars[v]);
				if u.sup < v.inf + c || u.inf > v.sup + c {
					Tri::False
				} else if u.is_fixed() && v.is_fixed() && u.inf == v.inf + c {
					Tri::True
				} else {
					Tri::Unknown
				}
			}
			ConstraintKind::Eq3 { u, v, w, c } => {
				let (u, v, w) = (&self.vars[u], &self.vars[v], &self.vars[w]);
				if w.sup + c < u.inf + v.inf || w.inf + c > u.sup + v.sup {
					Tri::False
				} else if u.is_fixed() && v.is_fixed() && w.is_fixed() && w.inf + c == u.inf + v.inf {
					Tri::True
				} else {
					Tri::Unknown
				}
			}
		}
	}

	/// Re-assert `id` against the current domains of its variables.
	pub(crate) fn constraint_tell(&mut self, id: ConstraintId) -> Result<(), Contradiction> {
		debug!(?id, "constraint tell");
		match self.constraints[id] {
			ConstraintKind::Ge { v, c } => self.var_is_ge(v, c),
			ConstraintKind::Le { v, c } => self.var_is_le(v, c),
			ConstraintKind::Eq { v, c } => self.var_is_eq(v, c),
			ConstraintKind::Ne { v, c } => {
				if self.vars[v].can_be(c) {
					self.var_is_neq(v, c)
				} else {
					Ok(())
				}
			}
			ConstraintKind::Neq2 { u, v, c } => self.neq2_propagate(u, v, c),
			ConstraintKind::Ge2 { u, v, c } => {
				self.var_is_ge(u, self.vars[v].inf + c)?;
				self.var_is_le(v, self.vars[u].sup - c)
			}
			ConstraintKind::Le2 { u, v, c } => {
				self.var_is_le(u, self.vars[v].sup + c)?;
				self.var_is_ge(v, self.vars[u].inf - c)
			}
			ConstraintKind::Eq2 { .. } => {
				self.constraint_inc_min(id, Slot(1))?;
				self.constraint_dec_max(id, Slot(1))?;
				self.constraint_inc_min(id, Slot(2))?;
				self.constraint_dec_max(id, Slot(2))
			}
			ConstraintKind::Eq3 { u, v, w, c } => {
				self.var_is_ge(u, self.vars[w].inf + c - self.vars[v].sup)?;
				self.var_is_le(u, self.vars[w].sup + c - self.vars[v].inf)?;
				self.var_is_ge(v, self.vars[w].inf + c - self.vars[u].sup)?;
				self.var_is_le(v, self.vars[w].sup + c - self.vars[u].inf)?;
				self.var_is_ge(w, self.vars[v].inf + self.vars[u].inf - c)?;
				self.var_is_le(w, self.vars[v].sup + self.vars[u].sup - c)
			}
		}
	}

	/// `u != v + c` narrows the other side the moment either side fixes.
	fn neq2_propagate(&mut self, u: VarId, v: VarId, c: IntVal) -> Result<(), Contradiction> {
		if self.vars[u].is_fixed() {
			self.var_is_neq(v, self.vars[u].inf - c)
		} else if self.vars[v].is_fixed() {
			self.var_is_neq(u, self.vars[v].inf + c)
		} else {
			Ok(())
		}
	}

	/// Handle an `inf` raise on the variable at `slot`.
	pub(crate) fn constraint_inc_min(&mut self, id: ConstraintId, slot: Slot) -> Result<(), Contradiction> {
		match self.constraints[id] {
			ConstraintKind::Ge { .. } | ConstraintKind::Le { .. } | ConstraintKind::Eq { .. } => {
				self.constraint_tell(id)
			}
			ConstraintKind::Ne { v, c } => {
				if self.vars[v].can_be_less(c) {
					self.var_is_neq(v, c)
				} else {
					Ok(())
				}
			}
			ConstraintKind::Neq2 { u, v, c } => self.neq2_propagate(u, v, c),
			ConstraintKind::Ge2 { u, v, c } => {
				if slot == Slot(2) {
					self.var_is_ge(u, self.vars[v].inf + c)
				} else {
					Ok(())
				}
			}
			ConstraintKind::Le2 { u, v, c } => {
				if slot == Slot(1) {
					self.var_is_ge(v, self.vars[u].inf - c)
				} else {
					Ok(())
				}
			}
			ConstraintKind::Eq2 { u, v, c } => {
				if slot == Slot(1) {
					self.var_is_ge(v, self.vars[u].inf - c)
				} else {
					self.var_is_ge(u, self.vars[v].inf + c)
				}
			}
			ConstraintKind::Eq3 { u, v, w, c } => match slot {
				Slot(1) => {
					self.var_is_ge(w, self.vars[u].inf + self.vars[v].inf - c)?;
					self.var_is_le(v, self.vars[w].sup + c - self.vars[u].inf)
				}
				Slot(2) => {
					self.var_is_ge(w, self.vars[v].inf + self.vars[u].inf - c)?;
					self.var_is_le(u, self.vars[w].sup + c - self.vars[v].inf)
				}
				_ => {
					self.var_is_ge(u, self.vars[w].inf + c - self.vars[v].sup)?;
					self.var_is_ge(v, self.vars[w].inf + c - self.vars[u].sup)
				}
			},
		}
	}

	/// Handle a `sup` lower on the variable at `slot`.
	pub(crate) fn constraint_dec_max(&mut self, id: ConstraintId, slot: Slot) -> Result<(), Contradiction> {
		match self.constraints[id] {
			ConstraintKind::Ge { .. } | ConstraintKind::Le { .. } | ConstraintKind::Eq { .. } => {
				self.constraint_tell(id)
			}
			ConstraintKind::Ne { v, c } => {
				if self.vars[v].can_be_more(c) {
					self.var_is_neq(v, c)
				} else {
					Ok(())
				}
			}
			ConstraintKind::Neq2 { u, v, c } => self.neq2_propagate(u, v, c),
			ConstraintKind::Ge2 { u, v, c } => {
				if slot == Slot(1) {
					self.var_is_le(v, self.vars[u].sup - c)
				} else {
					Ok(())
				}
			}
			ConstraintKind::Le2 { u, v, c } => {
				if slot == Slot(2) {
					self.var_is_le(u, self.vars[v].sup + c)
				} else {
					Ok(())
				}
			}
			ConstraintKind::Eq2 { u, v, c } => {
				if slot == Slot(1) {
					self.var_is_le(v, self.vars[u].sup - c)
				} else {
					self.var_is_le(u, self.vars[v].sup + c)
				}
			}
			ConstraintKind::Eq3 { u, v, w, c } => match slot {
				Slot(1) => {
					self.var_is_le(w, self.vars[u].sup + self.vars[v].sup - c)?;
					self.var_is_ge(v, self.vars[w].inf + c - self.vars[u].sup)
				}
				Slot(2) => {
					self.var_is_le(w, self.vars[v].sup + self.vars[u].sup - c)?;
					self.var_is_ge(u, self.vars[w].inf + c - self.vars[v].sup)
				}
				_ => {
					self.var_is_le(u, self.vars[w].sup + c - self.vars[v].inf)?;
					self.var_is_le(v, self.vars[w].sup + c - self.vars[u].inf)
				}
			},
		}
	}

	/// Handle `slot`'s variable becoming fixed.
	pub(crate) fn constraint_set_val(&mut self, id: ConstraintId, slot: Slot) -> Result<(), Contradiction> {
		match self.constraints[id] {
			ConstraintKind::Ge { .. } | ConstraintKind::Le { .. } | ConstraintKind::Eq { .. } => {
				self.constraint_tell(id)
			}
			ConstraintKind::Ne { v, c } => {
				if self.vars[v].inf == c {
					Err(Contradiction::new(self.vars[v].name.clone(), c, c))
				} else {
					Ok(())
				}
			}
			ConstraintKind::Neq2 { u, v, c } => {
				if slot == Slot(1) {
					self.var_is_neq(v, self.vars[u].inf - c)
				} else {
					self.var_is_neq(u, self.vars[v].inf + c)
				}
			}
			ConstraintKind::Ge2 { u, v, c } => {
				if slot == Slot(1) {
					self.var_is_le(v, self.vars[u].inf - c)
				} else {
					self.var_is_ge(u, self.vars[v].inf + c)
				}
			}
			ConstraintKind::Le2 { u, v, c } => {
				if slot == Slot(1) {
					self.var_is_ge(v, self.vars[u].inf - c)
				} else {
					self.var_is_le(u, self.vars[v].sup + c)
				}
			}
			ConstraintKind::Eq2 { u, v, c } => {
				if slot == Slot(1) {
					self.var_is_eq(v, self.vars[u].inf - c)
				} else {
					self.var_is_eq(u, self.vars[v].inf + c)
				}
			}
			ConstraintKind::Eq3 { u, v, w, c } => match slot {
				Slot(1) => {
					self.var_is_ge(v, self.vars[w].inf + c - self.vars[u].inf)?;
					self.var_is_le(v, self.vars[w].sup + c - self.vars[u].inf)?;
					self.var_is_ge(w, self.vars[u].inf + self.vars[v].inf - c)?;
					self.var_is_le(w, self.vars[u].inf + self.vars[v].sup - c)
				}
				Slot(2) => {
					self.var_is_ge(u, self.vars[w].inf + c - self.vars[v].inf)?;
					self.var_is_le(u, self.vars[w].sup + c - self.vars[v].inf)?;
					self.var_is_ge(w, self.vars[v].inf + self.vars[u].inf - c)?;
					self.var_is_le(w, self.vars[v].inf + self.vars[u].sup - c)
				}
				_ => {
					self.var_is_ge(u, self.vars[w].inf + c - self.vars[v].sup)?;
					self.var_is_le(u, self.vars[w].inf + c - self.vars[v].inf)?;
					self.var_is_ge(v, self.vars[w].inf + c - self.vars[u].sup)?;
					self.var_is_le(v, self.vars[w].inf + c - self.vars[u].inf)
				}
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ge2_tell_propagates_both_ways() {
		let mut ctx = SolverContext::new();
		let u = ctx.new_var("u", 0, 10).unwrap();
		let v = ctx.new_var("v", 5, 8).unwrap();
		ctx.supxyc(u, v, 2).unwrap(); // u >= v + 2
		assert_eq!(ctx.vars[u].inf, 7);
	}

	#[test]
	fn eq2_keeps_both_sides_in_lockstep() {
		let mut ctx = SolverContext::new();
		let u = ctx.new_var("u", 0, 10).unwrap();
		let v = ctx.new_var("v", 3, 3).unwrap();
		ctx.equxyc(u, v, 1).unwrap(); // u == v + 1
		assert_eq!((ctx.vars[u].inf, ctx.vars[u].sup), (4, 4));
	}

	#[test]
	fn ne_excludes_only_at_a_bound_and_fails_when_pinned() {
		let mut ctx = SolverContext::new();
		let v = ctx.new_var("v", 4, 4).unwrap();
		assert!(ctx.nequxc(v, 4).is_err());
	}

	#[test]
	fn eq3_propagates_sum_both_directions() {
		let mut ctx = SolverContext::new();
		let u = ctx.new_var("u", 0, 10).unwrap();
		let v = ctx.new_var("v", 0, 10).unwrap();
		let w = ctx.new_var("w", 7, 7).unwrap();
		ctx.equxyzc(u, v, w, 0).unwrap(); // u + v == w
		ctx.var_is_eq(u, 3).unwrap();
		assert_eq!(ctx.vars[v].inf, 4);
		assert_eq!(ctx.vars[v].sup, 4);
	}

	#[test]
	fn strict_helpers_add_the_unit_offset() {
		let mut ctx = SolverContext::new();
		let u = ctx.new_var("u", 0, 10).unwrap();
		let v = ctx.new_var("v", 5, 5).unwrap();
		ctx.strictsupxyc(u, v, 0).unwrap(); // u > v, i.e. u >= v + 1
		assert_eq!(ctx.vars[u].inf, 6);
	}
}
