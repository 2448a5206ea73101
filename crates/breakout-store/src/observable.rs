use std::fmt;

/// Handle returned by the store's `subscribe_*` methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("subscription#{_0}")]
pub struct SubscriptionId(pub(crate) u64);

type Callback<T> = Box<dyn FnMut(&T)>;

/// A published value plus the callbacks notified on each republication.
pub(crate) struct Observable<T> {
    value: T,
    subscribers: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<T> Observable<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            value,
            subscribers: vec![],
        }
    }

    pub(crate) fn get(&self) -> &T {
        &self.value
    }

    pub(crate) fn subscribe(&mut self, id: SubscriptionId, callback: Callback<T>) {
        self.subscribers.push((id, callback));
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.subscribers.clear();
    }

    /// Replaces the value and notifies every subscriber.
    pub(crate) fn publish(&mut self, value: T) {
        self.value = value;
        for (_, callback) in &mut self.subscribers {
            callback(&self.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[test]
    fn test_publish_notifies_until_unsubscribed() {
        let seen = Rc::new(RefCell::new(vec![]));
        let mut observable = Observable::new(0);

        let spy = Rc::clone(&seen);
        observable.subscribe(
            SubscriptionId(1),
            Box::new(move |v: &i32| spy.borrow_mut().push(*v)),
        );

        observable.publish(1);
        observable.publish(2);
        assert!(observable.unsubscribe(SubscriptionId(1)));
        assert!(!observable.unsubscribe(SubscriptionId(1)));
        observable.publish(3);

        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(*observable.get(), 3);
    }
}
