//! Scheduling intervals: a thin façade over a start-time variable plus a
//! fixed, non-negative duration, and the eight precedence helpers that post
//! `Ge2`/`Eq2` constraints between two intervals' starts.
//!
//! Grounded on `examples/original_source/cobra/interval.py`.

use index_vec::define_index_type;

use crate::{context::SolverContext, error::Contradiction, variable::{IntVal, VarId}};

define_index_type! {
	/// Identifies an [`Interval`] inside a [`SolverContext`]'s arena.
	pub struct IntervalId = u32;
}

/// A task with a variable earliest-start time and a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
	/// The start-time variable.
	pub start: VarId,
	/// Fixed, non-negative task duration.
	pub duration: IntVal,
}

impl SolverContext {
	/// Create an interval named `name` with earliest start `est`, fixed
	/// `duration`, and latest completion time `lct`. The start variable's
	/// domain is `[est, lct - duration]`.
	pub fn new_interval(&mut self, name: impl Into<String>, est: IntVal, duration: IntVal, lct: IntVal) -> Result<IntervalId, crate::error::ModelError> {
		let name = name.into();
		if duration < 0 {
			return Err(crate::error::ModelError::NegativeDuration { name, duration });
		}
		let start = self.new_var(format!("ST{name}"), est, lct - duration)?;
		Ok(self.intervals.push(Interval { start, duration }))
	}

	/// Earliest start time.
	pub fn est(&self, id: IntervalId) -> IntVal {
		self.vars[self.intervals[id].start].inf
	}

	/// Latest start time.
	pub fn lst(&self, id: IntervalId) -> IntVal {
		self.vars[self.intervals[id].start].sup
	}

	/// Earliest completion time.
	pub fn ect(&self, id: IntervalId) -> IntVal {
		self.vars[self.intervals[id].start].inf + self.intervals[id].duration
	}

	/// Latest completion time.
	pub fn lct(&self, id: IntervalId) -> IntVal {
		self.vars[self.intervals[id].start].sup + self.intervals[id].duration
	}

	/// Post `start(a) + z <= start(b)`.
	pub fn start_before_start(&mut self, a: IntervalId, b: IntervalId, z: IntVal) -> Result<crate::constraint::ConstraintId, Contradiction> {
		let (sa, sb) = (self.intervals[a].start, self.intervals[b].start);
		self.supxyc(sb, sa, z)
	}

	/// Post `start(a) + z <= end(b)`.
	pub fn start_before_end(&mut self, a: IntervalId, b: IntervalId, z: IntVal) -> Result<crate::constraint::ConstraintId, Contradiction> {
		let (sa, sb, db) = (self.intervals[a].start, self.intervals[b].start, self.intervals[b].duration);
		self.supxyc(sb, sa, z - db)
	}

	/// Post `end(a) + z <= start(b)`.
	pub fn end_before_start(&mut self, a: IntervalId, b: IntervalId, z: IntVal) -> Result<crate::constraint::ConstraintId, Contradiction> {
		let (sa, sb, da) = (self.intervals[a].start, self.intervals[b].start, self.intervals[a].duration);
		self.supxyc(sb, sa, da + z)
	}

	/// Post `end(a) + z <= end(b)`.
	pub fn end_before_end(&mut self, a: IntervalId, b: IntervalId, z: IntVal) -> Result<crate::constraint::ConstraintId, Contradiction> {
		let (sa, sb, da, db) = (self.intervals[a].start, self.intervals[b].start, self.intervals[a].duration, self.intervals[b].duration);
		self.supxyc(sb, sa, da + z - db)
	}

	/// Post `start(a) + z == start(b)`.
	pub fn start_at_start(&mut self, a: IntervalId, b: IntervalId, z: IntVal) -> Result<crate::constraint::ConstraintId, Contradiction> {
		let (sa, sb) = (self.intervals[a].start, self.intervals[b].start);
		self.equxyc(sb, sa, z)
	}

	/// Post `start(a) + z == end(b)`.
	pub fn start_at_end(&mut self, a: IntervalId, b: IntervalId, z: IntVal) -> Result<crate::constraint::ConstraintId, Contradiction> {
		let (sa, sb, db) = (self.intervals[a].start, self.intervals[b].start, self.intervals[b].duration);
		self.equxyc(sb, sa, z - db)
	}

	/// Post `end(a) + z == start(b)`.
	pub fn end_at_start(&mut self, a: IntervalId, b: IntervalId, z: IntVal) -> Result<crate::constraint::ConstraintId, Contradiction> {
		let (sa, sb, da) = (self.intervals[a].start, self.intervals[b].start, self.intervals[a].duration);
		self.equxyc(sb, sa, da + z)
	}

	/// Post `end(a) + z == end(b)`.
	pub fn end_at_end(&mut self, a: IntervalId, b: IntervalId, z: IntVal) -> Result<crate::constraint::ConstraintId, Contradiction> {
		let (sa, sb, da, db) = (self.intervals[a].start, self.intervals[b].start, self.intervals[a].duration, self.intervals[b].duration);
		self.equxyc(sb, sa, da + z - db)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_interval_bounds_the_start_variable() {
		let mut ctx = SolverContext::new();
		let a = ctx.new_interval("A", 0, 5, 20).unwrap();
		assert_eq!(ctx.est(a), 0);
		assert_eq!(ctx.lst(a), 15);
		assert_eq!(ctx.ect(a), 5);
		assert_eq!(ctx.lct(a), 20);
	}

	#[test]
	fn negative_duration_is_rejected() {
		let mut ctx = SolverContext::new();
		assert!(ctx.new_interval("A", 0, -1, 20).is_err());
	}

	#[test]
	fn end_before_start_pushes_the_successor_out() {
		let mut ctx = SolverContext::new();
		let a = ctx.new_interval("A", 0, 5, 100).unwrap();
		let b = ctx.new_interval("B", 0, 3, 100).unwrap();
		ctx.end_before_start(a, b, 0).unwrap();
		assert_eq!(ctx.est(b), 5);
	}

	#[test]
	fn start_at_start_keeps_two_starts_in_lockstep() {
		let mut ctx = SolverContext::new();
		let a = ctx.new_interval("A", 3, 5, 100).unwrap();
		let b = ctx.new_interval("B", 0, 3, 100).unwrap();
		ctx.start_at_start(a, b, 0).unwrap();
		assert_eq!(ctx.est(b), 3);
	}
}
