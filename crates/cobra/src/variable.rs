//! Domain variables: a trailed `[inf, sup]` interval plus the list of
//! constraints subscribed to its bound changes.

use index_vec::define_index_type;
use tracing::debug;

use crate::{context::SolverContext, error::Contradiction, Tri};

/// The integer type used for every variable bound, constant offset, and
/// duration in the solver.
pub type IntVal = i64;

define_index_type! {
	/// Identifies a [`Variable`] inside a [`SolverContext`]'s arena.
	pub struct VarId = u32;
}

/// A 1-based position identifying which argument of a constraint a
/// notification concerns, matching the original source's `c[1]` slot
/// convention (`c[0]` is always the constraint itself, `c[1]` the slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(pub usize);

/// Something a [`Variable`] can notify when its bounds change: either a
/// plain constraint or the top-level [`Disjunction`](crate::disjunction::Disjunction)
/// that owns the constraint a nested link ultimately resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubscriberRef {
	/// A unary or arithmetic propagator.
	Constraint(crate::constraint::ConstraintId),
	/// The top-level disjunction a variable's owning constraint is nested
	/// under.
	Disjunction(crate::disjunction::DisjunctionId),
}

/// A finite-domain integer variable.
#[derive(Debug, Clone)]
pub struct Variable {
	/// Name used only for diagnostics (contradiction messages, `Display`).
	pub name: String,
	/// Current lower bound, trailed.
	pub inf: IntVal,
	/// Current upper bound, trailed.
	pub sup: IntVal,
	/// Constraints to notify on a bound change, in registration order.
	/// Append-only: populated at model-build time, never trailed.
	pub(crate) subscribers: Vec<(SubscriberRef, Slot)>,
}

impl Variable {
	/// Create a variable over `[inf, sup]`. Callers go through
	/// [`SolverContext::new_var`]; this is the validated inner constructor.
	pub(crate) fn new(name: String, inf: IntVal, sup: IntVal) -> Self {
		debug_assert!(inf <= sup, "variable {name} created with inf > sup");
		Self { name, inf, sup, subscribers: Vec::new() }
	}

	/// Whether the domain has collapsed to a single value.
	pub fn is_fixed(&self) -> bool {
		self.inf == self.sup
	}

	/// Whether this variable could still be made equal to `other + offset`.
	pub fn can_be_eq(&self, other: &Variable, offset: IntVal) -> bool {
		self.inf + offset <= other.sup && self.sup + offset >= other.inf
	}

	/// Whether the domain is fixed to exactly `x`.
	pub fn is_it(&self, x: IntVal) -> bool {
		self.inf == self.sup && self.inf == x
	}

	/// Whether `x` is still within `[inf, sup]`.
	pub fn can_be(&self, x: IntVal) -> bool {
		self.inf <= x && self.sup >= x
	}

	/// Whether `x` has already fallen outside `[inf, sup]`.
	pub fn can_not_be(&self, x: IntVal) -> bool {
		self.inf > x || self.sup < x
	}

	/// Whether `inf >= x` already holds.
	pub fn is_it_more(&self, x: IntVal) -> bool {
		self.inf >= x
	}

	/// Whether `sup <= x` already holds.
	pub fn is_it_less(&self, x: IntVal) -> bool {
		self.sup <= x
	}

	/// Whether the domain could still be tightened down to `<= x`.
	pub fn can_be_less(&self, x: IntVal) -> bool {
		self.inf <= x
	}

	/// Whether the domain has already been pushed entirely above `x`.
	pub fn can_not_be_less(&self, x: IntVal) -> bool {
		self.inf > x
	}

	/// Whether the domain could still be tightened up to `>= x`.
	pub fn can_be_more(&self, x: IntVal) -> bool {
		self.sup >= x
	}

	/// Whether the domain has already been pushed entirely below `x`.
	pub fn can_not_be_more(&self, x: IntVal) -> bool {
		self.sup < x
	}
}

impl SolverContext {
	/// Register a new variable over `[inf, sup]`.
	///
	/// # Errors
	/// Returns [`ModelError::InvalidDomain`] if `inf > sup`. The bound order
	/// is often a caller-supplied value derived from a benchmark or input
	/// file rather than a literal, so it is checked and reported like any
	/// other model-construction mistake instead of being asserted away.
	pub fn new_var(&mut self, name: impl Into<String>, inf: IntVal, sup: IntVal) -> Result<VarId, crate::error::ModelError> {
		let name = name.into();
		if inf > sup {
			return Err(crate::error::ModelError::InvalidDomain { name, inf, sup });
		}
		Ok(self.vars.push(Variable::new(name, inf, sup)))
	}

	/// Tighten `var`'s lower bound to at least `x`, notifying subscribers.
	///
	/// Mirrors `Var.isGE` in the original implementation: a no-op if `x`
	/// does not raise `inf`, a [`Contradiction`] if it would cross `sup`,
	/// otherwise the bound is trailed and subscribers are notified with
	/// `setVal` (if the variable became fixed) or `incMin` otherwise.
	pub fn var_is_ge(&mut self, id: VarId, x: IntVal) -> Result<(), Contradiction> {
		let var = &self.vars[id];
		if x <= var.inf {
			return Ok(());
		}
		if x > var.sup {
			return Err(Contradiction::new(var.name.clone(), x, var.sup));
		}
		debug!(var = %self.vars[id].name, to = x, "isGE");
		self.trail.assign_var_inf(id, self.vars[id].inf);
		self.vars[id].inf = x;
		self.notify(id)
	}

	/// Tighten `var`'s upper bound to at most `x`, notifying subscribers.
	/// Mirrors `Var.isLE`.
	pub fn var_is_le(&mut self, id: VarId, x: IntVal) -> Result<(), Contradiction> {
		let var = &self.vars[id];
		if x >= var.sup {
			return Ok(());
		}
		if x < var.inf {
			return Err(Contradiction::new(var.name.clone(), var.inf, x));
		}
		debug!(var = %self.vars[id].name, to = x, "isLE");
		self.trail.assign_var_sup(id, self.vars[id].sup);
		self.vars[id].sup = x;
		self.notify(id)
	}

	/// Fix `var` to exactly `x`, notifying subscribers. Mirrors `Var.isEQ`.
	pub fn var_is_eq(&mut self, id: VarId, x: IntVal) -> Result<(), Contradiction> {
		let var = &self.vars[id];
		if var.inf > x || var.sup < x {
			return Err(Contradiction::new(var.name.clone(), var.inf, var.sup));
		}
		if var.inf == var.sup {
			return Ok(());
		}
		debug!(var = %self.vars[id].name, to = x, "isEQ");
		self.trail.assign_var_inf(id, self.vars[id].inf);
		self.trail.assign_var_sup(id, self.vars[id].sup);
		self.vars[id].inf = x;
		self.vars[id].sup = x;
		self.notify_set_val(id)
	}

	/// Exclude `x` from `var`'s domain, notifying subscribers only when `x`
	/// sits at a current bound (a hole in the middle is inexpressible in a
	/// bounds-only domain). Mirrors `Var.isNEQ`.
	pub fn var_is_neq(&mut self, id: VarId, x: IntVal) -> Result<(), Contradiction> {
		let var = &self.vars[id];
		if var.inf == x {
			self.var_is_ge(id, x + crate::UN)
		} else if var.sup == x {
			self.var_is_le(id, x - crate::UN)
		} else {
			Ok(())
		}
	}

	/// Dispatch the right notification kind (`setVal` if `id` became fixed,
	/// `incMin`/`decMax` otherwise is decided by the caller) after `inf` was
	/// raised.
	fn notify(&mut self, id: VarId) -> Result<(), Contradiction> {
		if self.vars[id].inf == self.vars[id].sup {
			self.notify_set_val(id)
		} else {
			self.notify_subscribers(id, Notification::IncMin)
		}
	}

	/// Notify every subscriber of `id` with `setVal`.
	fn notify_set_val(&mut self, id: VarId) -> Result<(), Contradiction> {
		self.notify_subscribers(id, Notification::SetVal)
	}

	/// Fan a bound-change notification out to every subscriber of `id`, in
	/// registration order, propagating the first [`Contradiction`] raised.
	fn notify_subscribers(&mut self, id: VarId, kind: Notification) -> Result<(), Contradiction> {
		// Index rather than iterate-by-value: `subscribers` is append-only
		// and never touched by the constraint/disjunction calls below, but
		// borrowing it directly across those `&mut self` calls doesn't
		// type-check, so walk it by position instead of cloning the whole
		// `Vec` on every notification.
		for i in 0..self.vars[id].subscribers.len() {
			let (target, slot) = self.vars[id].subscribers[i];
			match target {
				SubscriberRef::Constraint(c) => match kind {
					Notification::IncMin => self.constraint_inc_min(c, slot)?,
					Notification::DecMax => self.constraint_dec_max(c, slot)?,
					Notification::SetVal => self.constraint_set_val(c, slot)?,
				},
				SubscriberRef::Disjunction(d) => match kind {
					Notification::IncMin => self.disjunction_inc_min(d, slot)?,
					Notification::DecMax => self.disjunction_dec_max(d, slot)?,
					Notification::SetVal => self.disjunction_set_val(d, slot)?,
				},
			}
		}
		Ok(())
	}
}

/// Which bound-change notification a subscriber should receive. Only used
/// internally to share the fan-out loop across `isGE`/`isLE`/`isEQ`.
#[derive(Debug, Clone, Copy)]
enum Notification {
	/// `inf` was raised and the variable is not yet fixed.
	IncMin,
	/// `sup` was lowered and the variable is not yet fixed.
	DecMax,
	/// The variable became fixed.
	SetVal,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn is_ge_tightens_and_is_idempotent_below_current_inf() {
		let mut ctx = SolverContext::new();
		let v = ctx.new_var("v", 0, 10).unwrap();
		ctx.var_is_ge(v, 3).unwrap();
		assert_eq!(ctx.vars[v].inf, 3);
		ctx.var_is_ge(v, 1).unwrap();
		assert_eq!(ctx.vars[v].inf, 3);
	}

	#[test]
	fn is_ge_past_sup_is_contradiction() {
		let mut ctx = SolverContext::new();
		let v = ctx.new_var("v", 0, 10).unwrap();
		assert!(ctx.var_is_ge(v, 11).is_err());
	}

	#[test]
	fn is_eq_fixes_both_bounds() {
		let mut ctx = SolverContext::new();
		let v = ctx.new_var("v", 0, 10).unwrap();
		ctx.var_is_eq(v, 4).unwrap();
		assert_eq!(ctx.vars[v].inf, 4);
		assert_eq!(ctx.vars[v].sup, 4);
	}

	#[test]
	fn is_neq_only_narrows_at_a_bound() {
		let mut ctx = SolverContext::new();
		let v = ctx.new_var("v", 0, 10).unwrap();
		ctx.var_is_neq(v, 5).unwrap();
		assert_eq!((ctx.vars[v].inf, ctx.vars[v].sup), (0, 10));
		ctx.var_is_neq(v, 0).unwrap();
		assert_eq!(ctx.vars[v].inf, 1);
	}
}
