use super::core::SubjectCore;
use crate::{
  rc::{RcDeref, RcDerefMut},
  subscription::Subscription,
};

/// Handle to one subject registration.
///
/// Holds the subject core and the registration id. Disposal removes the
/// entry directly; because dispatch loans observers out instead of holding
/// the core borrowed, this works even from inside a callback of the same
/// subject, taking effect from the next emission on.
pub struct SubjectSubscription<P> {
  core: P,
  id: usize,
}

impl<P> SubjectSubscription<P> {
  pub(crate) fn new(core: P, id: usize) -> Self { Self { core, id } }
}

impl<P, Ob> Subscription for SubjectSubscription<P>
where
  P: RcDerefMut<Target = SubjectCore<Ob>>,
{
  fn unsubscribe(self) { self.core.rc_deref_mut().observers.remove(self.id); }

  fn is_closed(&self) -> bool { !self.core.rc_deref().observers.contains(self.id) }
}
