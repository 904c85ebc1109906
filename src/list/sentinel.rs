//! Scroll-proximity trigger
//!
//! A view reports where its scroll container and its end-of-list sentinel
//! are; when enough of the sentinel is inside the container's viewport the
//! next page is requested.

use std::sync::Mutex;

use crate::list::{ListController, LoadOutcome, PageFetcher, SkipReason};

/// Vertical extent of an element, in the container's scroll coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height: height.max(0.0) }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Visible fraction of `self` inside `viewport`.
    ///
    /// A zero-height element counts as fully visible when it lies inside.
    pub fn intersection_ratio(&self, viewport: &Bounds) -> f64 {
        if self.height == 0.0 {
            let inside = self.top >= viewport.top && self.top <= viewport.bottom();
            return if inside { 1.0 } else { 0.0 };
        }
        let overlap = self.bottom().min(viewport.bottom()) - self.top.max(viewport.top);
        (overlap.max(0.0) / self.height).min(1.0)
    }
}

/// Last known geometry of a scroll container and its sentinel
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollGeometry {
    threshold: f64,
    container: Option<Bounds>,
    sentinel: Option<Bounds>,
}

impl ScrollGeometry {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            container: None,
            sentinel: None,
        }
    }

    pub fn set_container(&mut self, viewport: Bounds) {
        self.container = Some(viewport);
    }

    pub fn set_sentinel(&mut self, sentinel: Bounds) {
        self.sentinel = Some(sentinel);
    }

    /// Both elements registered and the sentinel visible past the threshold
    pub fn is_intersecting(&self) -> bool {
        match (&self.container, &self.sentinel) {
            (Some(container), Some(sentinel)) => {
                let ratio = sentinel.intersection_ratio(container);
                ratio > 0.0 && ratio >= self.threshold
            }
            _ => false,
        }
    }
}

/// Handle a view uses to register its scroll container and sentinel.
///
/// Each registration re-evaluates visibility and, when the sentinel is in
/// view, asks the controller for the next page.
pub struct ScrollHandle<F: PageFetcher> {
    list: ListController<F>,
    geometry: Mutex<ScrollGeometry>,
}

impl<F: PageFetcher> ScrollHandle<F> {
    pub fn new(list: ListController<F>, threshold: f64) -> Self {
        Self {
            list,
            geometry: Mutex::new(ScrollGeometry::new(threshold)),
        }
    }

    /// The container scrolled or resized
    pub async fn observe_container(&self, viewport: Bounds) -> LoadOutcome {
        self.geometry().set_container(viewport);
        self.evaluate().await
    }

    /// The sentinel moved (usually because rows were appended)
    pub async fn observe_sentinel(&self, sentinel: Bounds) -> LoadOutcome {
        self.geometry().set_sentinel(sentinel);
        self.evaluate().await
    }

    pub async fn evaluate(&self) -> LoadOutcome {
        let intersecting = self.geometry().is_intersecting();
        if !intersecting {
            return LoadOutcome::Skipped(SkipReason::NotIntersecting);
        }

        let (searching, has_more) = {
            let state = self.list.subscribe();
            let state = state.borrow();
            (state.is_searching, state.has_more)
        };
        if searching {
            return LoadOutcome::Skipped(SkipReason::Searching);
        }
        if !has_more {
            return LoadOutcome::Skipped(SkipReason::Exhausted);
        }

        self.list.load_more().await
    }

    fn geometry(&self) -> std::sync::MutexGuard<'_, ScrollGeometry> {
        self.geometry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<F: PageFetcher> ListController<F> {
    /// Scroll trigger bound to this list
    pub fn scroll_handle(&self, threshold: f64) -> ScrollHandle<F> {
        ScrollHandle::new(self.clone(), threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_overlap_ratio() {
        let viewport = Bounds::new(0.0, 600.0);
        let sentinel = Bounds::new(590.0, 20.0);
        assert!((sentinel.intersection_ratio(&viewport) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold() {
        let mut geometry = ScrollGeometry::new(0.1);
        assert!(!geometry.is_intersecting());

        geometry.set_container(Bounds::new(0.0, 600.0));
        geometry.set_sentinel(Bounds::new(599.0, 20.0));
        // 1/20 visible is below 10%
        assert!(!geometry.is_intersecting());

        geometry.set_sentinel(Bounds::new(597.0, 20.0));
        assert!(geometry.is_intersecting());
    }

    #[test]
    fn test_zero_height_sentinel() {
        let viewport = Bounds::new(100.0, 500.0);
        assert_eq!(Bounds::new(400.0, 0.0).intersection_ratio(&viewport), 1.0);
        assert_eq!(Bounds::new(700.0, 0.0).intersection_ratio(&viewport), 0.0);
    }
}
