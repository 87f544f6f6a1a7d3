//! The subscribe capability and the user-facing composition surface.

use crate::{
  observer::Observer,
  ops::flat_map::{FlatMapOp, FlatMapOpThreads},
  signal::Signal,
  sink::{Sink, SinkObserver},
  subscription::Subscription,
};

/// Core subscribe contract: a value source that accepts an observer `O`
/// and returns a disposal handle.
///
/// `actual_subscribe` consumes `self`; clonable sources such as subjects
/// are subscribed through a clone.
pub trait Observable<Item, Err, O: Observer<Item, Err>> {
  type Unsub: Subscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// The user-facing surface: composition plus the subscribe family.
///
/// Implemented per source type rather than blanket, so each source only
/// advertises subscriptions it can actually serve.
pub trait ObservableExt<Item, Err>: Sized {
  /// Map every value to an inner stream and merge all inner streams'
  /// values into one downstream stream.
  ///
  /// See [`FlatMapOp`] for the completion and failure rules.
  fn flat_map<'a, F, Inner>(self, project: F) -> FlatMapOp<'a, Self, F, Item, Inner>
  where
    F: FnMut(Item) -> Inner,
  {
    FlatMapOp::new(self, project)
  }

  /// Thread-safe flavor of [`flat_map`], for pipelines whose observers
  /// cross threads.
  ///
  /// [`flat_map`]: Self::flat_map
  fn flat_map_threads<F, Inner>(self, project: F) -> FlatMapOpThreads<Self, F, Item, Inner>
  where
    F: FnMut(Item) -> Inner,
  {
    FlatMapOpThreads::new(self, project)
  }

  /// Subscribe with a values-only callback.
  ///
  /// Terminal signals are discarded; use [`subscribe_signals`] or
  /// [`subscribe_sink`] when they matter.
  ///
  /// [`subscribe_signals`]: Self::subscribe_signals
  /// [`subscribe_sink`]: Self::subscribe_sink
  fn subscribe<N>(self, next: N) -> <Self as Observable<Item, Err, NextObserver<N>>>::Unsub
  where
    N: FnMut(Item),
    Self: Observable<Item, Err, NextObserver<N>>,
  {
    self.actual_subscribe(NextObserver(next))
  }

  /// Subscribe with one callback per signal kind.
  fn subscribe_all<N, E, C>(
    self,
    next: N,
    error: E,
    complete: C,
  ) -> <Self as Observable<Item, Err, AllObserver<N, E, C>>>::Unsub
  where
    N: FnMut(Item),
    E: FnOnce(Err),
    C: FnOnce(),
    Self: Observable<Item, Err, AllObserver<N, E, C>>,
  {
    self.actual_subscribe(AllObserver { next, error, complete })
  }

  /// Subscribe with a single callback over materialized [`Signal`]s.
  fn subscribe_signals<F>(self, f: F) -> <Self as Observable<Item, Err, SinkObserver<F>>>::Unsub
  where
    F: FnMut(Signal<Item, Err>),
    Self: Observable<Item, Err, SinkObserver<F>>,
  {
    self.actual_subscribe(SinkObserver::new(f))
  }

  /// Subscribe a terminal [`Sink`].
  fn subscribe_sink<K>(self, sink: K) -> <Self as Observable<Item, Err, SinkObserver<K>>>::Unsub
  where
    K: Sink<Item, Err>,
    Self: Observable<Item, Err, SinkObserver<K>>,
  {
    self.actual_subscribe(SinkObserver::new(sink))
  }
}

// ============================================================================
// Subscribe-family observers
// ============================================================================

/// Values-only observer; terminal signals are dropped on the floor.
pub struct NextObserver<N>(pub(crate) N);

impl<N, Item, Err> Observer<Item, Err> for NextObserver<N>
where
  N: FnMut(Item),
{
  fn next(&mut self, value: Item) { (self.0)(value) }

  fn error(self, _err: Err) {}

  fn complete(self) {}

  fn is_closed(&self) -> bool { false }
}

/// One callback per signal kind; the terminal callbacks run at most once,
/// so they are only required to be `FnOnce`.
pub struct AllObserver<N, E, C> {
  pub(crate) next: N,
  pub(crate) error: E,
  pub(crate) complete: C,
}

impl<N, E, C, Item, Err> Observer<Item, Err> for AllObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  fn next(&mut self, value: Item) { (self.next)(value) }

  fn error(self, err: Err) { (self.error)(err) }

  fn complete(self) { (self.complete)() }

  fn is_closed(&self) -> bool { false }
}
