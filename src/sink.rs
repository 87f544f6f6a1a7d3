//! Terminal subscribers.

use crate::{observer::Observer, signal::Signal};

/// A terminal consumer of a stream, fed materialized [`Signal`]s.
///
/// This is the extension point for arbitrary end-of-pipeline consumers:
/// anything that reacts to values, completion, and failure. A sink must not
/// panic; a failing consumer is a defect in the consumer, not in the
/// stream.
///
/// Any `FnMut(Signal<Item, Err>)` closure is a sink.
pub trait Sink<Item, Err> {
  fn on_signal(&mut self, signal: Signal<Item, Err>);
}

impl<F, Item, Err> Sink<Item, Err> for F
where
  F: FnMut(Signal<Item, Err>),
{
  fn on_signal(&mut self, signal: Signal<Item, Err>) { self(signal) }
}

/// Adapts a [`Sink`] to the [`Observer`] interface, folding the three
/// observer callbacks into signals.
pub struct SinkObserver<S>(pub(crate) S);

impl<S> SinkObserver<S> {
  pub fn new(sink: S) -> Self { Self(sink) }
}

impl<S, Item, Err> Observer<Item, Err> for SinkObserver<S>
where
  S: Sink<Item, Err>,
{
  fn next(&mut self, value: Item) { self.0.on_signal(Signal::Value(value)); }

  fn error(mut self, err: Err) { self.0.on_signal(Signal::Failed(err)); }

  fn complete(mut self) { self.0.on_signal(Signal::Completed); }

  fn is_closed(&self) -> bool { false }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn closure_sink_sees_all_signals() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let mut ob = SinkObserver::new(move |s: Signal<i32, &'static str>| {
      c_seen.borrow_mut().push(s);
    });

    ob.next(1);
    ob.next(2);
    ob.complete();

    assert_eq!(
      *seen.borrow(),
      vec![Signal::Value(1), Signal::Value(2), Signal::Completed]
    );
  }

  #[test]
  fn failure_reaches_the_sink() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let ob = SinkObserver::new(move |s: Signal<i32, &'static str>| {
      c_seen.borrow_mut().push(s);
    });

    ob.error("broken");
    assert_eq!(*seen.borrow(), vec![Signal::Failed("broken")]);
  }
}
