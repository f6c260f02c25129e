use super::manager::Manager;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Tracks every live [`Manager`] of a store so that a root change can
/// invalidate all of their caches at once.
///
/// Managers register themselves on construction. The registry holds weak
/// references only; dropped managers are pruned on the next broadcast.
#[derive(Default)]
pub struct Registry {
    managers: RefCell<Vec<Weak<Manager>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, manager: &Rc<Manager>) {
        self.managers.borrow_mut().push(Rc::downgrade(manager));
    }

    /// Clears every live manager's caches.
    pub fn clear_all(&self) {
        for manager in self.live() {
            manager.clear();
        }
    }

    /// Number of registered managers still alive.
    pub fn len(&self) -> usize {
        self.live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live(&self) -> Vec<Rc<Manager>> {
        let mut managers = self.managers.borrow_mut();
        managers.retain(|m| m.strong_count() > 0);
        managers.iter().filter_map(Weak::upgrade).collect()
    }
}
