use smallvec::SmallVec;

use super::Subscription;

/// Id-keyed arena of live entries, in insertion order.
///
/// Backs both a subject's fan-out list and a flatten operator's set of
/// active inner subscriptions. Two usage patterns beyond plain
/// `add`/`remove`:
///
/// - `reserve_id` + `insert`: the id is needed before the entry exists.
///   An inner observer must know its id before subscribing, because the
///   inner stream may terminate synchronously inside `subscribe`, before
///   there is a subscription handle to register.
/// - `take_all` + `put_back`: loan every entry out for snapshot dispatch.
///   A loaned entry stays registered (its id remains valid and `contains`
///   still reports it) but is vacant; `put_back` re-fills it unless the
///   entry was removed while on loan, in which case the value is dropped.
pub struct SubscriptionSet<T> {
  next_id: usize,
  entries: SmallVec<[(usize, Option<T>); 2]>,
}

impl<T> Default for SubscriptionSet<T> {
  fn default() -> Self { Self { next_id: 0, entries: SmallVec::new() } }
}

impl<T> SubscriptionSet<T> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add an entry, returning its unique id.
  #[inline]
  pub fn add(&mut self, item: T) -> usize {
    let id = self.reserve_id();
    self.entries.push((id, Some(item)));
    id
  }

  /// Allocate the next id without creating an entry.
  #[inline]
  pub fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  /// Create an entry under an id obtained from [`reserve_id`].
  ///
  /// [`reserve_id`]: Self::reserve_id
  #[inline]
  pub fn insert(&mut self, id: usize, item: T) { self.entries.push((id, Some(item))); }

  /// Remove an entry. Returns the value unless the entry was vacant (on
  /// loan) or the id unknown; a vacant entry is still unregistered.
  pub fn remove(&mut self, id: usize) -> Option<T> {
    self
      .entries
      .iter()
      .position(|(i, _)| *i == id)
      .and_then(|pos| self.entries.remove(pos).1)
  }

  /// `true` while the id names a registered entry, vacant or not.
  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.entries.iter().any(|(i, _)| *i == id) }

  /// Number of registered entries, including vacant ones.
  #[inline]
  pub fn len(&self) -> usize { self.entries.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Loan out every occupied entry, leaving the entries registered but
  /// vacant.
  pub fn take_all(&mut self) -> SmallVec<[(usize, T); 2]> {
    self
      .entries
      .iter_mut()
      .filter_map(|(id, slot)| slot.take().map(|item| (*id, item)))
      .collect()
  }

  /// Return a loaned value. Dropped silently if the entry was removed
  /// while on loan.
  pub fn put_back(&mut self, id: usize, item: T) {
    if let Some((_, slot)) = self.entries.iter_mut().find(|(i, _)| *i == id) {
      *slot = Some(item);
    }
  }

  /// Remove everything, yielding the occupied values.
  pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
    self.entries.drain(..).filter_map(|(_, slot)| slot)
  }
}

impl<T: Subscription> SubscriptionSet<T> {
  /// Dispose every entry and clear the arena.
  pub fn unsubscribe_all(&mut self) {
    for item in self.drain() {
      item.unsubscribe();
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn add_and_remove() {
    let mut set = SubscriptionSet::new();
    let a = set.add("a");
    let b = set.add("b");
    assert_eq!(set.len(), 2);
    assert_eq!(set.remove(a), Some("a"));
    assert!(!set.contains(a));
    assert!(set.contains(b));
  }

  #[test]
  fn reserve_then_insert_keeps_ids_unique() {
    let mut set = SubscriptionSet::new();
    let reserved = set.reserve_id();
    let later = set.add("later");
    assert_ne!(reserved, later);
    set.insert(reserved, "early");
    assert_eq!(set.remove(reserved), Some("early"));
  }

  #[test]
  fn loaned_entries_stay_registered() {
    let mut set = SubscriptionSet::new();
    let a = set.add(1);
    let b = set.add(2);

    let batch = set.take_all();
    assert_eq!(batch.len(), 2);
    assert!(set.contains(a) && set.contains(b));
    assert_eq!(set.remove(b), None); // vacant, but unregisters the entry

    for (id, item) in batch {
      set.put_back(id, item);
    }
    assert_eq!(set.remove(a), Some(1));
    assert!(!set.contains(b)); // the value loaned under `b` was dropped
  }

  #[test]
  fn drain_skips_vacant_entries() {
    let mut set = SubscriptionSet::new();
    set.add(1);
    set.add(2);
    let _loan = set.take_all();
    assert_eq!(set.drain().count(), 0);
    assert!(set.is_empty());
  }
}
