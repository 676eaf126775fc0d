//! Click-outside dismissal as an explicit, scoped subscription.
//!
//! A host registers the region its field (and popup) occupies together with
//! a dismiss callback. Pointer presses are fed to [`Boundaries::pointer_down`];
//! every subscription whose region misses the press is dismissed. Dropping
//! the [`Subscription`] unregisters it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Rectangle in screen cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Region {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Region {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && y >= self.y
            && u32::from(x) < u32::from(self.x) + u32::from(self.width)
            && u32::from(y) < u32::from(self.y) + u32::from(self.height)
    }
}

type DismissFn = Rc<RefCell<dyn FnMut()>>;

struct Slot {
    id: u64,
    regions: Vec<Region>,
    on_dismiss: DismissFn,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    slots: Vec<Slot>,
}

/// Registry of dismissable regions for one view.
#[derive(Clone, Default)]
pub struct Boundaries {
    inner: Rc<RefCell<Registry>>,
}

impl fmt::Debug for Boundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Boundaries")
            .field("subscriptions", &self.len())
            .finish()
    }
}

impl Boundaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `region`; `on_dismiss` runs whenever a press lands outside it.
    pub fn subscribe(&self, region: Region, on_dismiss: impl FnMut() + 'static) -> Subscription {
        let mut reg = self.inner.borrow_mut();
        let id = reg.next_id;
        reg.next_id += 1;
        reg.slots.push(Slot {
            id,
            regions: vec![region],
            on_dismiss: Rc::new(RefCell::new(on_dismiss)),
        });
        Subscription {
            id,
            registry: Rc::downgrade(&self.inner),
        }
    }

    /// Dispatch a pointer press. Returns how many subscriptions were dismissed.
    pub fn pointer_down(&self, x: u16, y: u16) -> usize {
        // Collect first so callbacks may subscribe or drop subscriptions.
        let outside: Vec<DismissFn> = self
            .inner
            .borrow()
            .slots
            .iter()
            .filter(|s| !s.regions.iter().any(|r| r.contains(x, y)))
            .map(|s| Rc::clone(&s.on_dismiss))
            .collect();
        for f in &outside {
            (*f.borrow_mut())();
        }
        outside.len()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live registration; unregisters on drop.
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    /// Replace the covered area, e.g. when a popup moves or resizes. A press
    /// inside any of `regions` keeps the subscription alive.
    pub fn set_regions(&self, regions: impl IntoIterator<Item = Region>) {
        let Some(reg) = self.registry.upgrade() else {
            return;
        };
        let mut reg = reg.borrow_mut();
        if let Some(slot) = reg.slots.iter_mut().find(|s| s.id == self.id) {
            slot.regions = regions.into_iter().collect();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(reg) = self.registry.upgrade() {
            reg.borrow_mut().slots.retain(|s| s.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn region_bounds_are_half_open() {
        let r = Region::new(2, 3, 4, 2);
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 4));
        assert!(!r.contains(6, 4));
        assert!(!r.contains(5, 5));
        assert!(!r.contains(1, 3));
        assert!(!Region::new(0, 0, 0, 0).contains(0, 0));
    }

    #[test]
    fn press_outside_dismisses_press_inside_does_not() {
        let boundaries = Boundaries::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = boundaries.subscribe(Region::new(0, 0, 10, 5), move || h.set(h.get() + 1));

        assert_eq!(boundaries.pointer_down(3, 3), 0);
        assert_eq!(hits.get(), 0);
        assert_eq!(boundaries.pointer_down(30, 3), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn dropping_subscription_releases_it() {
        let boundaries = Boundaries::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = boundaries.subscribe(Region::new(0, 0, 1, 1), move || h.set(h.get() + 1));
        assert_eq!(boundaries.len(), 1);
        drop(sub);
        assert!(boundaries.is_empty());
        assert_eq!(boundaries.pointer_down(50, 50), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn extra_regions_count_as_inside() {
        let boundaries = Boundaries::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = boundaries.subscribe(Region::new(0, 0, 5, 1), move || h.set(h.get() + 1));
        sub.set_regions([Region::new(0, 0, 5, 1), Region::new(0, 1, 20, 6)]);
        boundaries.pointer_down(15, 4);
        assert_eq!(hits.get(), 0);
        boundaries.pointer_down(40, 4);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let boundaries = Boundaries::new();
        let sub = boundaries.subscribe(Region::default(), || {});
        drop(boundaries);
        sub.set_regions([Region::new(1, 1, 1, 1)]);
        drop(sub);
    }
}
