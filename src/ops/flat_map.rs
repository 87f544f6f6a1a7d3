use std::marker::PhantomData;

use smallvec::SmallVec;

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::{MutArc, MutRc, RcDeref, RcDerefMut},
  subscription::{BoxedSubscription, BoxedSubscriptionSend, Subscription, SubscriptionSet},
};

/// Operator behind [`ObservableExt::flat_map`].
///
/// Subscribes to the outer stream; every outer value is projected to an
/// inner stream which is subscribed immediately, and all inner values are
/// merged downstream (inner streams interleave, order is preserved within
/// each inner stream). Propagation rules:
///
/// - an inner `Completed` only retires that inner stream;
/// - downstream completes once the outer stream has completed AND every
///   inner stream spawned so far has completed;
/// - the first `Failed` from the outer stream or any inner stream tears
///   down every other subscription and is forwarded downstream exactly
///   once; nothing from any residual source is observable afterwards.
pub struct FlatMapOp<'a, S, F, A, Inner> {
  source: S,
  project: F,
  _marker: PhantomData<(&'a (), A, Inner)>,
}

/// Thread-safe flavor of [`FlatMapOp`]; state is shared through
/// `Arc<Mutex<…>>` and observers must be `Send`.
pub struct FlatMapOpThreads<S, F, A, Inner> {
  source: S,
  project: F,
  _marker: PhantomData<(A, Inner)>,
}

macro_rules! impl_new_method {
  ($name: ident $(, $lf: lifetime)?) => {
    impl<$($lf,)? S, F, A, Inner> $name<$($lf,)? S, F, A, Inner> {
      #[inline]
      pub(crate) fn new(source: S, project: F) -> Self {
        Self { source, project, _marker: PhantomData }
      }
    }
  };
}

impl_new_method!(FlatMapOp, 'a);
impl_new_method!(FlatMapOpThreads);

// ============================================================================
// Shared pipeline state
// ============================================================================

/// State shared by the outer observer, every inner observer, and the
/// subscription handle, behind `MutRc<Option<…>>`/`MutArc<Option<…>>`.
///
/// The `Option` is the exactly-once switch: whoever delivers the terminal
/// outcome `take`s the state, and every signal arriving after that finds
/// `None` and dies there.
pub struct FlattenState<O, U> {
  observer: O,
  outer_done: bool,
  /// Inner streams spawned and not yet completed. The downstream
  /// completion law is `outer_done && live_inners == 0`.
  live_inners: usize,
  outer_unsub: Option<U>,
  actives: SubscriptionSet<U>,
  /// Ids of inner streams that terminated synchronously inside
  /// `subscribe`, before the outer observer could register their handles.
  early_done: SmallVec<[usize; 2]>,
}

impl<O, U: Subscription> FlattenState<O, U> {
  fn new(observer: O) -> Self {
    Self {
      observer,
      outer_done: false,
      live_inners: 0,
      outer_unsub: None,
      actives: SubscriptionSet::new(),
      early_done: SmallVec::new(),
    }
  }

  fn is_drained(&self) -> bool { self.outer_done && self.live_inners == 0 }

  /// Dispose every remaining subscription, returning the downstream
  /// observer for the final terminal call (or to be dropped on disposal).
  fn teardown(mut self) -> O {
    if let Some(unsub) = self.outer_unsub.take() {
      unsub.unsubscribe();
    }
    self.actives.unsubscribe_all();
    self.observer
  }
}

pub type FlattenStateLocal<'a, O> = FlattenState<O, BoxedSubscription<'a>>;
pub type FlattenStateThreads<O> = FlattenState<O, BoxedSubscriptionSend<'static>>;

// ============================================================================
// Observers
// ============================================================================

/// Observer the flatten operator puts on the outer stream.
pub struct FlatMapOuterObserver<'a, O, F, Inner, B> {
  data: MutRc<Option<FlattenStateLocal<'a, O>>>,
  project: F,
  _marker: PhantomData<(Inner, B)>,
}

pub struct FlatMapOuterObserverThreads<O, F, Inner, B> {
  data: MutArc<Option<FlattenStateThreads<O>>>,
  project: F,
  _marker: PhantomData<(Inner, B)>,
}

/// Observer the flatten operator puts on each inner stream.
pub struct FlatMapInnerObserver<'a, O> {
  data: MutRc<Option<FlattenStateLocal<'a, O>>>,
  id: usize,
}

pub struct FlatMapInnerObserverThreads<O> {
  data: MutArc<Option<FlattenStateThreads<O>>>,
  id: usize,
}

impl<'a, O> FlatMapInnerObserver<'a, O> {
  fn new(data: MutRc<Option<FlattenStateLocal<'a, O>>>, id: usize) -> Self { Self { data, id } }
}

impl<O> FlatMapInnerObserverThreads<O> {
  fn new(data: MutArc<Option<FlattenStateThreads<O>>>, id: usize) -> Self { Self { data, id } }
}

macro_rules! impl_inner_observer {
  ($ty: ty $(, $lf: lifetime)?) => {
    impl<$($lf,)? B, Err, O> Observer<B, Err> for $ty
    where
      O: Observer<B, Err>,
    {
      fn next(&mut self, value: B) {
        if let Some(state) = self.data.rc_deref_mut().as_mut() {
          state.observer.next(value);
        }
      }

      fn error(self, err: Err) {
        // First failure anywhere kills the whole pipeline; the take leaves
        // nothing for signals arriving after it.
        let state = self.data.rc_deref_mut().take();
        if let Some(state) = state {
          state.teardown().error(err);
        }
      }

      fn complete(self) {
        let (finished, own_unsub) = {
          let mut guard = self.data.rc_deref_mut();
          match guard.as_mut() {
            Some(state) => {
              state.live_inners -= 1;
              let own_unsub = state.actives.remove(self.id);
              if own_unsub.is_none() {
                // Terminated synchronously inside `subscribe`; tell the
                // outer observer not to register the handle.
                state.early_done.push(self.id);
              }
              (state.is_drained(), own_unsub)
            }
            None => (false, None),
          }
        };
        if let Some(unsub) = own_unsub {
          unsub.unsubscribe();
        }
        if finished {
          let state = self.data.rc_deref_mut().take();
          if let Some(state) = state {
            state.teardown().complete();
          }
        }
      }

      fn is_closed(&self) -> bool {
        self
          .data
          .rc_deref()
          .as_ref()
          .map_or(true, |state| state.observer.is_closed())
      }
    }
  };
}

impl_inner_observer!(FlatMapInnerObserver<'a, O>, 'a);
impl_inner_observer!(FlatMapInnerObserverThreads<O>);

macro_rules! impl_outer_observer {
  ($outer_ty: ty, $inner_ty: ident, $($lf: lifetime)? $($send: ident)?) => {
    impl<$($lf,)? A, B, Err, O, F, Inner> Observer<A, Err> for $outer_ty
    where
      O: Observer<B, Err> $(+ $lf)? $(+ $send + 'static)?,
      F: FnMut(A) -> Inner,
      Inner: Observable<B, Err, $inner_ty<$($lf,)? O>> $(+ $lf)? $(+ $send + 'static)?,
      Inner::Unsub: $($lf)? $($send + 'static)?,
    {
      fn next(&mut self, value: A) {
        if self.data.rc_deref().is_none() {
          return;
        }
        let inner = (self.project)(value);
        let id = {
          let mut guard = self.data.rc_deref_mut();
          match guard.as_mut() {
            Some(state) => {
              state.live_inners += 1;
              state.actives.reserve_id()
            }
            None => return,
          }
        };
        let unsub = inner.actual_subscribe($inner_ty::new(self.data.clone(), id));
        let leftover = {
          let mut guard = self.data.rc_deref_mut();
          match guard.as_mut() {
            Some(state) => {
              if let Some(pos) = state.early_done.iter().position(|done| *done == id) {
                state.early_done.remove(pos);
                Some(unsub)
              } else {
                state.actives.insert(id, Box::new(unsub));
                None
              }
            }
            // The pipeline died while the inner stream was being
            // subscribed (synchronous inner failure).
            None => Some(unsub),
          }
        };
        if let Some(unsub) = leftover {
          unsub.unsubscribe();
        }
      }

      fn error(self, err: Err) {
        let state = self.data.rc_deref_mut().take();
        if let Some(state) = state {
          state.teardown().error(err);
        }
      }

      fn complete(self) {
        let finished = {
          let mut guard = self.data.rc_deref_mut();
          match guard.as_mut() {
            Some(state) => {
              state.outer_done = true;
              state.is_drained()
            }
            None => false,
          }
        };
        if finished {
          let state = self.data.rc_deref_mut().take();
          if let Some(state) = state {
            state.teardown().complete();
          }
        }
      }

      fn is_closed(&self) -> bool {
        self
          .data
          .rc_deref()
          .as_ref()
          .map_or(true, |state| state.observer.is_closed())
      }
    }
  };
}

impl_outer_observer!(FlatMapOuterObserver<'a, O, F, Inner, B>, FlatMapInnerObserver, 'a);
impl_outer_observer!(
  FlatMapOuterObserverThreads<O, F, Inner, B>,
  FlatMapInnerObserverThreads,
  Send
);

// ============================================================================
// Subscription handle
// ============================================================================

/// Handle to a flattened pipeline. Disposing it tears down the outer
/// subscription and every active inner subscription; the downstream
/// observer is dropped without a terminal signal.
pub struct FlatMapSubscription<P> {
  data: P,
}

impl<P, O, U> Subscription for FlatMapSubscription<P>
where
  P: RcDerefMut<Target = Option<FlattenState<O, U>>>,
  U: Subscription,
{
  fn unsubscribe(self) {
    let state = self.data.rc_deref_mut().take();
    if let Some(state) = state {
      state.teardown();
    }
  }

  fn is_closed(&self) -> bool { self.data.rc_deref().is_none() }
}

// ============================================================================
// Observable impls
// ============================================================================

macro_rules! impl_flat_map_subscribe {
  ($state_ty: ty, $rc: ident, $outer_ty: ident) => {
    type Unsub = FlatMapSubscription<$rc<Option<$state_ty>>>;

    fn actual_subscribe(self, observer: O) -> Self::Unsub {
      let data = $rc::own(Some(FlattenState::new(observer)));
      let outer =
        $outer_ty { data: data.clone(), project: self.project, _marker: PhantomData };
      let unsub = self.source.actual_subscribe(outer);
      let leftover = {
        let mut guard = data.rc_deref_mut();
        if let Some(state) = guard.as_mut() {
          state.outer_unsub = Some(Box::new(unsub));
          None
        } else {
          // The outer stream terminated synchronously during subscribe.
          Some(unsub)
        }
      };
      if let Some(unsub) = leftover {
        unsub.unsubscribe();
      }
      FlatMapSubscription { data }
    }
  };
}

impl<'a, A, B, Err, O, S, F, Inner> Observable<B, Err, O> for FlatMapOp<'a, S, F, A, Inner>
where
  O: Observer<B, Err> + 'a,
  F: FnMut(A) -> Inner + 'a,
  S: Observable<A, Err, FlatMapOuterObserver<'a, O, F, Inner, B>>,
  Inner: Observable<B, Err, FlatMapInnerObserver<'a, O>> + 'a,
  S::Unsub: 'a,
  Inner::Unsub: 'a,
{
  impl_flat_map_subscribe!(FlattenStateLocal<'a, O>, MutRc, FlatMapOuterObserver);
}

impl<A, B, Err, O, S, F, Inner> Observable<B, Err, O> for FlatMapOpThreads<S, F, A, Inner>
where
  O: Observer<B, Err> + Send + 'static,
  F: FnMut(A) -> Inner + Send + 'static,
  S: Observable<A, Err, FlatMapOuterObserverThreads<O, F, Inner, B>>,
  Inner: Observable<B, Err, FlatMapInnerObserverThreads<O>> + Send + 'static,
  S::Unsub: Send + 'static,
  Inner::Unsub: Send + 'static,
{
  impl_flat_map_subscribe!(FlattenStateThreads<O>, MutArc, FlatMapOuterObserverThreads);
}

impl<'a, A, B, Err, S, F, Inner> ObservableExt<B, Err> for FlatMapOp<'a, S, F, A, Inner> where
  Inner: ObservableExt<B, Err>
{
}

impl<A, B, Err, S, F, Inner> ObservableExt<B, Err> for FlatMapOpThreads<S, F, A, Inner> where
  Inner: ObservableExt<B, Err>
{
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use bencher::benchmark_group;

  use crate::prelude::*;

  type InnerSubject = LocalSubject<'static, i32, &'static str>;

  fn signal_log() -> (
    Rc<RefCell<Vec<Signal<i32, &'static str>>>>,
    impl FnMut(Signal<i32, &'static str>),
  ) {
    let log = Rc::new(RefCell::new(vec![]));
    let sink = {
      let log = log.clone();
      move |s| log.borrow_mut().push(s)
    };
    (log, sink)
  }

  #[test]
  fn inner_values_interleave_in_emission_order() {
    let (log, sink) = signal_log();
    let outer = LocalSubject::<InnerSubject, &'static str>::new();
    let a = InnerSubject::new();
    let b = InnerSubject::new();

    outer
      .clone()
      .flat_map(|inner: InnerSubject| inner)
      .subscribe_signals(sink);

    outer.clone().next(a.clone());
    a.clone().next(1);
    outer.clone().next(b.clone());
    b.clone().next(10);
    a.clone().next(2);

    outer.clone().complete();
    b.clone().complete();
    a.clone().complete();

    assert_eq!(
      *log.borrow(),
      vec![
        Signal::Value(1),
        Signal::Value(10),
        Signal::Value(2),
        Signal::Completed,
      ]
    );
  }

  #[test]
  fn downstream_completes_only_when_outer_and_all_inners_are_done() {
    let (log, sink) = signal_log();
    let outer = LocalSubject::<InnerSubject, &'static str>::new();
    let straggler = InnerSubject::new();

    outer
      .clone()
      .flat_map(|inner: InnerSubject| inner)
      .subscribe_signals(sink);

    outer.clone().next(straggler.clone());
    outer.clone().complete();
    assert!(log.borrow().is_empty());

    straggler.clone().next(7);
    straggler.clone().complete();
    assert_eq!(*log.borrow(), vec![Signal::Value(7), Signal::Completed]);
  }

  #[test]
  fn inner_completion_alone_does_not_complete_downstream() {
    let (log, sink) = signal_log();
    let outer = LocalSubject::<InnerSubject, &'static str>::new();
    let a = InnerSubject::new();

    outer
      .clone()
      .flat_map(|inner: InnerSubject| inner)
      .subscribe_signals(sink);

    outer.clone().next(a.clone());
    a.clone().complete();
    assert!(log.borrow().is_empty());
    assert_eq!(a.subscriber_count(), 0);

    // The pipeline is still live for later developers of the outer stream.
    let b = InnerSubject::new();
    outer.clone().next(b.clone());
    b.clone().next(3);
    assert_eq!(*log.borrow(), vec![Signal::Value(3)]);
  }

  #[test]
  fn inner_failure_tears_down_every_other_source() {
    let (log, sink) = signal_log();
    let outer = LocalSubject::<InnerSubject, &'static str>::new();
    let failing = InnerSubject::new();
    let healthy = InnerSubject::new();

    outer
      .clone()
      .flat_map(|inner: InnerSubject| inner)
      .subscribe_signals(sink);

    outer.clone().next(failing.clone());
    outer.clone().next(healthy.clone());
    failing.clone().error("broken build");

    // The surviving inner and the outer stream lost their subscribers…
    assert_eq!(healthy.subscriber_count(), 0);
    assert_eq!(outer.subscriber_count(), 0);

    // …so nothing they emit is observable downstream.
    healthy.clone().next(42);
    outer.clone().next(InnerSubject::new());

    assert_eq!(*log.borrow(), vec![Signal::Failed("broken build")]);
  }

  #[test]
  fn outer_failure_reaches_the_sink_once() {
    let (log, sink) = signal_log();
    let outer = LocalSubject::<InnerSubject, &'static str>::new();
    let a = InnerSubject::new();

    outer
      .clone()
      .flat_map(|inner: InnerSubject| inner)
      .subscribe_signals(sink);

    outer.clone().next(a.clone());
    outer.clone().error("project failed");
    a.clone().next(1);

    assert_eq!(*log.borrow(), vec![Signal::Failed("project failed")]);
    assert_eq!(a.subscriber_count(), 0);
  }

  #[test]
  fn unsubscribe_stops_the_whole_pipeline() {
    let (log, sink) = signal_log();
    let outer = LocalSubject::<InnerSubject, &'static str>::new();
    let a = InnerSubject::new();

    let sub = outer
      .clone()
      .flat_map(|inner: InnerSubject| inner)
      .subscribe_signals(sink);

    outer.clone().next(a.clone());
    assert_eq!(a.subscriber_count(), 1);

    sub.unsubscribe();
    assert_eq!(a.subscriber_count(), 0);
    assert_eq!(outer.subscriber_count(), 0);

    a.clone().next(1);
    assert!(log.borrow().is_empty());
  }

  #[test]
  fn completed_inner_is_retired_from_the_active_set() {
    let (log, sink) = signal_log();
    let outer = LocalSubject::<InnerSubject, &'static str>::new();

    outer
      .clone()
      .flat_map(|inner: InnerSubject| inner)
      .subscribe_signals(sink);

    // Spawn-and-complete a few inners while the outer stays open, then
    // finish with one more value to show the pipeline is still healthy.
    for v in 0..3 {
      let inner = InnerSubject::new();
      outer.clone().next(inner.clone());
      inner.clone().next(v);
      inner.clone().complete();
      assert_eq!(inner.subscriber_count(), 0);
    }
    outer.clone().complete();

    assert_eq!(
      *log.borrow(),
      vec![
        Signal::Value(0),
        Signal::Value(1),
        Signal::Value(2),
        Signal::Completed,
      ]
    );
  }

  #[test]
  fn flat_map_threads_merges_across_a_producer_thread() {
    use std::sync::{Arc, Mutex};

    let log = Arc::new(Mutex::new(vec![]));
    let outer = SharedSubject::<SharedSubject<'static, i32, &'static str>, &'static str>::new();
    let inner = SharedSubject::<'static, i32, &'static str>::new();

    let c_log = log.clone();
    outer
      .clone()
      .flat_map_threads(|s: SharedSubject<'static, i32, &'static str>| s)
      .subscribe_signals(move |s| c_log.lock().unwrap().push(s));

    outer.clone().next(inner.clone());
    let producer = inner.clone();
    std::thread::spawn(move || {
      producer.clone().next(5);
      producer.clone().complete();
    })
    .join()
    .unwrap();
    outer.clone().complete();

    assert_eq!(
      *log.lock().unwrap(),
      vec![Signal::Value(5), Signal::Completed]
    );
  }

  #[test]
  fn bench() { do_bench(); }

  benchmark_group!(do_bench, bench_flat_map);

  fn bench_flat_map(b: &mut bencher::Bencher) {
    b.iter(|| {
      let (log, sink) = signal_log();
      let outer = LocalSubject::<InnerSubject, &'static str>::new();
      outer
        .clone()
        .flat_map(|inner: InnerSubject| inner)
        .subscribe_signals(sink);
      for _ in 0..10 {
        let inner = InnerSubject::new();
        outer.clone().next(inner.clone());
        for v in 0..10 {
          inner.clone().next(v);
        }
        inner.clone().complete();
      }
      outer.clone().complete();
      assert_eq!(log.borrow().len(), 101);
    });
  }
}
