//! Error types returned by the solver.

use thiserror::Error;

use crate::variable::IntVal;

/// Signals a propagation failure: a bound tightening that would empty a
/// domain, or an exclusive disjunction whose both sides were refuted.
///
/// This is the typed replacement for the original implementation's `FAIL`
/// exception: every `ask`/`tell`/`incMin`/`decMax`/`setVal` call that would
/// have raised `FAIL` instead returns `Err(Contradiction)`, and propagation
/// unwinds through `?` exactly where the original unwound through the
/// exception. The message carries the same diagnostic the original
/// exception's string argument did.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct Contradiction(String);

impl Contradiction {
	/// Build a contradiction report for a variable whose bounds would
	/// cross: `inf` would end up above `sup`.
	pub(crate) fn new(variable: impl Into<String>, inf: IntVal, sup: IntVal) -> Self {
		let variable = variable.into();
		Self(format!("contradiction on {variable}: inf {inf} > sup {sup}"))
	}

	/// Build a contradiction report carrying an arbitrary diagnostic, for
	/// failures that are not a single variable's bounds crossing (e.g. an
	/// exclusive disjunction with both sides refuted).
	pub(crate) fn message(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// Errors raised by misuse of the solver's API, as opposed to a failed
/// search (see [`Contradiction`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
	/// A variable was created with `inf > sup`.
	#[error("variable {name} created with inf {inf} > sup {sup}")]
	InvalidDomain {
		/// Name of the offending variable.
		name: String,
		/// The requested lower bound.
		inf: IntVal,
		/// The requested upper bound.
		sup: IntVal,
	},
	/// An interval was created with a negative duration.
	#[error("interval {name} created with negative duration {duration}")]
	NegativeDuration {
		/// Name of the offending interval.
		name: String,
		/// The requested duration.
		duration: IntVal,
	},
	/// The `SetTimes` search mode was selected; it is reserved on the
	/// external interface but has no implementation.
	#[error("search mode {0:?} is reserved but not implemented")]
	Unimplemented(crate::optimizer::SearchMode),
}
