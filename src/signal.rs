//! The materialized form of a stream event.
//!
//! A [`Signal`] is the value-level counterpart of the three [`Observer`]
//! callbacks (`next`/`complete`/`error`): a single event on a stream,
//! captured as data. The two representations must agree.
//!
//! [`Observer`]: crate::observer::Observer

/// One materialized event on a stream.
///
/// `Value(item)` carries a payload; `Completed` and `Failed(err)` are the
/// two terminal signals. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal<Item, Err> {
  /// A payload-carrying value signal.
  Value(Item),
  /// The stream completed successfully; no further signals follow.
  Completed,
  /// The stream failed; no further signals follow.
  Failed(Err),
}

impl<Item, Err> Signal<Item, Err> {
  /// True for the terminal signals (`Completed` / `Failed`).
  pub fn is_terminal(&self) -> bool { !matches!(self, Signal::Value(_)) }

  /// The payload of a `Value` signal, if this is one.
  pub fn value(&self) -> Option<&Item> {
    match self {
      Signal::Value(v) => Some(v),
      _ => None,
    }
  }

  /// The error of a `Failed` signal, if this is one.
  pub fn err(&self) -> Option<&Err> {
    match self {
      Signal::Failed(e) => Some(e),
      _ => None,
    }
  }
}
