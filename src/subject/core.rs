use smallvec::SmallVec;

use crate::{
  observer::Observer,
  rc::{RcDeref, RcDerefMut},
  subscription::SubscriptionSet,
};

/// Terminal state of a subject.
///
/// Transitions `Active → Completed` or `Active → Failed` at most once and
/// never reverses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubjectState {
  Active,
  Completed,
  Failed,
}

/// The shared core of a subject: its fan-out list and terminal state.
///
/// Both live behind one cell (`MutRc` or `MutArc`), so in the thread-safe
/// flavor the Active→terminal transition and every list mutation happen
/// under a single lock. That is what keeps the terminal signal exactly-once
/// when producers race.
pub struct SubjectCore<Ob> {
  pub(crate) state: SubjectState,
  pub(crate) observers: SubscriptionSet<Ob>,
}

impl<Ob> Default for SubjectCore<Ob> {
  fn default() -> Self { Self { state: SubjectState::Active, observers: SubscriptionSet::new() } }
}

/// Deliver a value to every subscriber registered at the start of the
/// call, in subscription order.
///
/// Observers are loaned out of the fan-out list before any callback runs,
/// so callbacks are free to subscribe or unsubscribe on this subject; the
/// mutation applies from the next emission on. Observers reporting
/// `is_closed` are pruned instead of invoked.
pub(crate) fn broadcast_value<P, Ob, Item, Err>(core: &P, value: Item)
where
  P: RcDerefMut<Target = SubjectCore<Ob>>,
  Ob: Observer<Item, Err>,
  Item: Clone,
{
  let batch = {
    let mut guard = core.rc_deref_mut();
    if guard.state != SubjectState::Active {
      return;
    }
    guard.observers.take_all()
  };
  for (id, mut ob) in batch {
    if ob.is_closed() {
      core.rc_deref_mut().observers.remove(id);
      continue;
    }
    // A callback earlier in this batch may have terminated the subject;
    // values stop flowing the moment that happens.
    if core.rc_deref().state == SubjectState::Active {
      ob.next(value.clone());
    }
    core.rc_deref_mut().observers.put_back(id, ob);
  }
}

pub(crate) fn broadcast_complete<P, Ob, Item, Err>(core: &P)
where
  P: RcDerefMut<Target = SubjectCore<Ob>>,
  Ob: Observer<Item, Err>,
{
  for ob in terminal_batch(core, SubjectState::Completed) {
    ob.complete();
  }
}

pub(crate) fn broadcast_error<P, Ob, Item, Err>(core: &P, err: Err)
where
  P: RcDerefMut<Target = SubjectCore<Ob>>,
  Ob: Observer<Item, Err>,
  Err: Clone,
{
  let mut iter = terminal_batch(core, SubjectState::Failed).into_iter().peekable();
  while let Some(ob) = iter.next() {
    if iter.peek().is_some() {
      ob.error(err.clone());
    } else {
      // The last observer takes the error by move.
      ob.error(err);
      break;
    }
  }
}

/// Transition to a terminal state and empty the fan-out list, returning the
/// observers owed the terminal signal. Empty when the subject already
/// stopped, which is what makes a second terminal emission a no-op.
fn terminal_batch<P, Ob>(core: &P, to: SubjectState) -> SmallVec<[Ob; 2]>
where
  P: RcDerefMut<Target = SubjectCore<Ob>>,
{
  let mut guard = core.rc_deref_mut();
  if guard.state != SubjectState::Active {
    return SmallVec::new();
  }
  guard.state = to;
  guard.observers.drain().collect()
}
