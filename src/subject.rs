//! Hot multicast event sources.

mod core;
mod subscription;

pub use self::{
  core::{SubjectCore, SubjectState},
  subscription::SubjectSubscription,
};
use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, BoxedObserverSend, IntoBoxed, Observer},
  rc::{MutArc, MutRc, RcDeref, RcDerefMut},
  signal::Signal,
};

/// A hot multicast event source.
///
/// A `Subject` is both an [`Observer`] (producers feed it signals) and an
/// [`Observable`] (consumers subscribe to it). Cloning is shallow: all
/// clones share one core. The capability split between producers and
/// consumers happens at the type level — a clone handed out as
/// `impl Observer` can only emit, a clone handed out as `impl Observable`
/// can only be subscribed to.
///
/// Delivery is synchronous on the caller's thread, in subscription order,
/// over a snapshot of the subscribers registered when the emission began.
/// A callback may subscribe or unsubscribe on the same subject
/// mid-dispatch; the change applies from the next emission on. Emitting on
/// the subject currently dispatching from inside one of its own callbacks
/// is not supported: such values are not observed by the subscribers
/// already being served.
///
/// Once terminal (`Completed` or `Failed`) a subject never signals again:
/// further value emissions are ignored, a second terminal emission is
/// ignored, and late subscribers are not registered — there is no replay
/// of the terminal signal, they receive an already-closed handle.
pub struct Subject<P> {
  core: P,
}

/// Single-threaded subject. `Item` must be `Clone` to multicast.
pub type LocalSubject<'a, Item, Err> = Subject<MutRc<SubjectCore<BoxedObserver<'a, Item, Err>>>>;

/// Thread-safe subject; observers must be `Send`, and the fan-out list and
/// terminal state sit behind one mutex.
pub type SharedSubject<'a, Item, Err> =
  Subject<MutArc<SubjectCore<BoxedObserverSend<'a, Item, Err>>>>;

impl<'a, Item, Err> LocalSubject<'a, Item, Err> {
  pub fn new() -> Self { Self::default() }
}

impl<'a, Item, Err> SharedSubject<'a, Item, Err> {
  pub fn new() -> Self { Self::default() }
}

impl<P: Clone> Clone for Subject<P> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<P> Default for Subject<P>
where
  P: RcDeref + From<P::Target>,
  P::Target: Default,
{
  fn default() -> Self { Self { core: P::from(P::Target::default()) } }
}

impl<P, Ob> Subject<P>
where
  P: RcDeref<Target = SubjectCore<Ob>>,
{
  /// Number of currently registered subscribers.
  pub fn subscriber_count(&self) -> usize { self.core.rc_deref().observers.len() }

  /// `true` once the subject reached `Completed` or `Failed`.
  pub fn is_stopped(&self) -> bool { self.core.rc_deref().state != SubjectState::Active }
}

impl<P: Clone> Subject<P> {
  /// Feed one materialized [`Signal`] into the subject.
  pub fn emit<Item, Err>(&mut self, signal: Signal<Item, Err>)
  where
    Self: Observer<Item, Err>,
  {
    match signal {
      Signal::Value(v) => self.next(v),
      Signal::Completed => self.clone().complete(),
      Signal::Failed(e) => self.clone().error(e),
    }
  }
}

impl<P, Ob, Item, Err> Observer<Item, Err> for Subject<P>
where
  P: RcDerefMut<Target = SubjectCore<Ob>>,
  Ob: Observer<Item, Err>,
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) { core::broadcast_value(&self.core, value) }

  fn error(self, err: Err) { core::broadcast_error(&self.core, err) }

  fn complete(self) { core::broadcast_complete::<P, Ob, Item, Err>(&self.core) }

  fn is_closed(&self) -> bool { self.core.rc_deref().state != SubjectState::Active }
}

impl<P, Ob, Item, Err, O> Observable<Item, Err, O> for Subject<P>
where
  P: RcDerefMut<Target = SubjectCore<Ob>>,
  O: Observer<Item, Err> + IntoBoxed<Ob>,
{
  type Unsub = SubjectSubscription<P>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let mut guard = self.core.rc_deref_mut();
    let id = if guard.state == SubjectState::Active {
      guard.observers.add(observer.into_boxed())
    } else {
      // Late subscription to a terminal subject: nothing is registered,
      // nothing is replayed, and the handle comes back already closed.
      guard.observers.reserve_id()
    };
    drop(guard);
    SubjectSubscription::new(self.core, id)
  }
}

impl<'a, Item, Err> ObservableExt<Item, Err> for LocalSubject<'a, Item, Err> {}
impl<'a, Item, Err> ObservableExt<Item, Err> for SharedSubject<'a, Item, Err> {}
