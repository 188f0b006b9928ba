#![forbid(unsafe_code)]

//! List-valued reactive fields.
//!
//! Structural mutation has no cheap before/after equality check, so a
//! [`ReactiveList`] notifies after **every** mutating call, whether or not the
//! contents actually changed. Pushing then removing the same element fires
//! twice; popping an empty list fires once. Downstream listeners count on
//! this, so it is kept as is.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::channel::{EventChannel, Subscription};

struct ListInner<T> {
    name: String,
    items: RefCell<Vec<T>>,
    version: Cell<u64>,
    on_changed: EventChannel<()>,
}

/// A named, observable list.
///
/// Cloning a `ReactiveList` creates a new handle to the **same** list.
pub struct ReactiveList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for ReactiveList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveList")
            .field("name", &self.inner.name)
            .field("items", &*self.inner.items.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone + 'static> ReactiveList<T> {
    /// Create an empty list.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_items(name, Vec::new())
    }

    /// Create a list holding `items`.
    #[must_use]
    pub fn with_items(name: impl Into<String>, items: Vec<T>) -> Self {
        let name = name.into();
        Self {
            inner: Rc::new(ListInner {
                on_changed: EventChannel::new(name.clone()),
                name,
                items: RefCell::new(items),
                version: Cell::new(0),
            }),
        }
    }

    /// Snapshot of the items.
    #[must_use]
    pub fn get(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    /// Borrow the items.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this same list.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Apply an arbitrary mutation, then notify unconditionally.
    ///
    /// All the named mutators below go through here.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let result = f(&mut self.inner.items.borrow_mut());
        self.inner.version.set(self.inner.version.get() + 1);
        tracing::trace!(list = %self.inner.name, version = self.inner.version.get(), "list mutated");
        self.inner.on_changed.invoke(&());
        result
    }

    /// Replace the whole contents. Notifies even when `items` equals the old contents.
    pub fn replace(&self, items: Vec<T>) -> Vec<T> {
        self.modify(|v| std::mem::replace(v, items))
    }

    pub fn push(&self, item: T) {
        self.modify(|v| v.push(item));
    }

    /// Insert at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, item: T) {
        self.modify(|v| {
            let index = index.min(v.len());
            v.insert(index, item);
        });
    }

    /// Remove the item at `index`. Out of range yields `None` (and still notifies).
    pub fn remove(&self, index: usize) -> Option<T> {
        self.modify(|v| (index < v.len()).then(|| v.remove(index)))
    }

    pub fn pop(&self) -> Option<T> {
        self.modify(Vec::pop)
    }

    pub fn clear(&self) {
        self.modify(Vec::clear);
    }

    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        self.modify(|v| v.extend(items));
    }

    pub fn reverse(&self) {
        self.modify(|v| v.reverse());
    }

    pub fn sort_by_key<K: Ord>(&self, key: impl FnMut(&T) -> K) {
        self.modify(|v| v.sort_by_key(key));
    }
}

impl<T: Clone + PartialEq + 'static> ReactiveList<T> {
    /// Remove the first element equal to `item`. Returns whether one was found.
    pub fn remove_item(&self, item: &T) -> bool {
        self.modify(|v| match v.iter().position(|x| x == item) {
            Some(index) => {
                v.remove(index);
                true
            }
            None => false,
        })
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.inner.items.borrow().contains(item)
    }
}

impl<T: Clone + Ord + 'static> ReactiveList<T> {
    pub fn sort(&self) {
        self.modify(|v| v.sort());
    }
}

impl<T> ReactiveList<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn on_changed(&self) -> &EventChannel<()> {
        &self.inner.on_changed
    }

    #[must_use = "dropping the Subscription immediately unsubscribes"]
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner.on_changed.subscribe_scoped(move |_| callback())
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.on_changed.subscriber_count()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    #[must_use]
    pub fn same_list(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counted(list: &ReactiveList<i32>) -> (Rc<Cell<u32>>, Subscription) {
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let sub = list.subscribe(move || c.set(c.get() + 1));
        (calls, sub)
    }

    #[test]
    fn push_then_remove_fires_twice() {
        let list = ReactiveList::new("pickups");
        let (calls, _sub) = counted(&list);

        list.push(7);
        assert!(list.remove_item(&7));
        assert_eq!(calls.get(), 2);
        assert!(list.is_empty());
    }

    #[test]
    fn noop_mutations_still_fire() {
        let list = ReactiveList::with_items("xs", vec![1, 2, 3]);
        let (calls, _sub) = counted(&list);

        assert_eq!(list.remove(10), None);
        assert!(!list.remove_item(&99));
        list.sort();
        list.replace(vec![1, 2, 3]);
        list.extend(std::iter::empty());
        assert_eq!(calls.get(), 5);
        assert_eq!(list.get(), vec![1, 2, 3]);
    }

    #[test]
    fn pop_on_empty_fires() {
        let list: ReactiveList<i32> = ReactiveList::new("empty");
        let (calls, _sub) = counted(&list);

        assert_eq!(list.pop(), None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn mutators_apply_before_notify() {
        let list = ReactiveList::new("seen");
        let observed = Rc::new(RefCell::new(Vec::new()));
        let (l, o) = (list.clone(), Rc::clone(&observed));
        let _sub = list.subscribe(move || o.borrow_mut().push(l.len()));

        list.push(1);
        list.insert(0, 0);
        list.extend([2, 3]);
        list.reverse();
        list.clear();

        assert_eq!(*observed.borrow(), vec![1, 2, 4, 4, 0]);
        assert_eq!(list.version(), 5);
    }

    #[test]
    fn insert_clamps_index() {
        let list = ReactiveList::with_items("xs", vec![1]);
        list.insert(99, 2);
        assert_eq!(list.get(), vec![1, 2]);
    }

    #[test]
    fn sort_by_key_orders_items() {
        let list = ReactiveList::with_items("xs", vec![3, 1, 2]);
        list.sort_by_key(|x| std::cmp::Reverse(*x));
        assert_eq!(list.get(), vec![3, 2, 1]);
    }
}
