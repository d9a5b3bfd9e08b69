//! Reference-counted overlay handle, for hosts that hand the same layer to
//! several owners (e.g. chained JS wrapper objects).

use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::heatmap::HeatmapOverlay;
use crate::heatmap::renderer::DensityEngine;
use crate::layer::{Layer, MapEvent, MapHost, add_layer, remove_layer};

struct Inner<H: MapHost, E: DensityEngine> {
    overlay: RefCell<HeatmapOverlay<H, E>>,
    map: RefCell<Option<Rc<H>>>,
}

impl<H: MapHost, E: DensityEngine> Drop for Inner<H, E> {
    // Last handle gone: detach so the host holds nothing for this layer.
    fn drop(&mut self) {
        if let Some(map) = self.map.get_mut().take() {
            remove_layer(&*map, self.overlay.get_mut());
        }
    }
}

/// Shared ownership of one [`HeatmapOverlay`] and the map it is attached to.
///
/// Clones are handles to the same overlay. The overlay detaches when the
/// last handle is dropped.
pub struct SharedOverlay<H: MapHost, E: DensityEngine> {
    inner: Rc<Inner<H, E>>,
}

impl<H: MapHost, E: DensityEngine> Clone for SharedOverlay<H, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: MapHost, E: DensityEngine> SharedOverlay<H, E> {
    pub fn new(overlay: HeatmapOverlay<H, E>) -> Self {
        Self {
            inner: Rc::new(Inner {
                overlay: RefCell::new(overlay),
                map: RefCell::new(None),
            }),
        }
    }

    /// Attaches to `map`, detaching from any previous map first, and returns
    /// another handle for chaining.
    pub fn add_to(&self, map: &Rc<H>) -> Self {
        self.remove();
        add_layer(map, &mut *self.inner.overlay.borrow_mut());
        *self.inner.map.borrow_mut() = Some(Rc::clone(map));
        self.clone()
    }

    /// Detaches from the current map. No-op when detached.
    pub fn remove(&self) {
        let map = self.inner.map.borrow_mut().take();
        if let Some(map) = map {
            remove_layer(&*map, &mut *self.inner.overlay.borrow_mut());
        }
    }

    pub fn map(&self) -> Option<Rc<H>> {
        self.inner.map.borrow().clone()
    }

    pub fn borrow(&self) -> Ref<'_, HeatmapOverlay<H, E>> {
        self.inner.overlay.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, HeatmapOverlay<H, E>> {
        self.inner.overlay.borrow_mut()
    }

    /// Number of live handles.
    pub fn handles(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Non-owning handle for host event callbacks.
    pub fn downgrade(&self) -> WeakOverlay<H, E> {
        WeakOverlay {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

pub struct WeakOverlay<H: MapHost, E: DensityEngine> {
    inner: Weak<Inner<H, E>>,
}

impl<H: MapHost, E: DensityEngine> WeakOverlay<H, E> {
    /// Delivers `event` if the overlay is still alive. Returns whether it was.
    pub fn notify(&self, event: MapEvent) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        inner.overlay.borrow_mut().on_event(event);
        true
    }
}
