//! Cache invalidation shared by everything that owns derived mesh tables.

/// Anything that caches tables derived from raw geometry (edges, faces,
/// search grids, …) should implement this.
pub trait InvalidateCache {
    /// Drop *all* derived state so the next query rebuilds it from the raw
    /// geometry.
    fn invalidate_cache(&mut self);
}

impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}
