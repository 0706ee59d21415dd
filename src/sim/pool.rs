//! Fixed-capacity object pool
//!
//! Records move out of the pool on `acquire` and back in on `release`, so a
//! record is owned either by the pool (free) or by a caller (active), never
//! both.

/// Something that can be wiped back to a blank state before reuse
pub trait Recycle: Default {
    fn recycle(&mut self);
}

#[derive(Debug, Clone)]
pub struct Pool<T> {
    free: Vec<T>,
    capacity: usize,
    active: usize,
}

impl<T: Recycle> Pool<T> {
    /// Pool with every record pre-allocated
    pub fn new(capacity: usize) -> Self {
        let mut free = Vec::with_capacity(capacity);
        free.resize_with(capacity, T::default);
        Self {
            free,
            capacity,
            active: 0,
        }
    }

    /// Take a blank record, or `None` once `capacity` records are out
    pub fn acquire(&mut self) -> Option<T> {
        if self.active >= self.capacity {
            return None;
        }
        self.active += 1;
        Some(self.free.pop().unwrap_or_default())
    }

    /// Hand a record back. Returns false if the pool did not keep it
    /// (capacity was lowered while it was out).
    pub fn release(&mut self, mut item: T) -> bool {
        self.active = self.active.saturating_sub(1);
        item.recycle();
        if self.free.len() + self.active < self.capacity {
            self.free.push(item);
            true
        } else {
            false
        }
    }

    /// Change the cap. Surplus free records are dropped; records already out
    /// stay valid and are discarded on release if still over the cap.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        let keep = capacity.saturating_sub(self.active);
        self.free.truncate(keep);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn free(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Default, PartialEq)]
    struct Rec {
        value: u32,
    }

    impl Recycle for Rec {
        fn recycle(&mut self) {
            self.value = 0;
        }
    }

    #[test]
    fn test_capacity_cap() {
        let mut pool: Pool<Rec> = Pool::new(2);
        let a = pool.acquire();
        let b = pool.acquire();
        assert!(a.is_some() && b.is_some());
        assert!(pool.acquire().is_none());
        assert!(pool.release(a.unwrap_or_default()));
        assert!(pool.acquire().is_some());
    }

    #[test]
    fn test_released_records_are_blank() {
        let mut pool: Pool<Rec> = Pool::new(1);
        let mut r = pool.acquire().unwrap();
        r.value = 42;
        pool.release(r);
        assert_eq!(pool.acquire().unwrap(), Rec::default());
    }

    #[test]
    fn test_shrinking_capacity_discards_on_release() {
        let mut pool: Pool<Rec> = Pool::new(4);
        let held: Vec<Rec> = (0..3).filter_map(|_| pool.acquire()).collect();
        pool.set_capacity(1);
        assert_eq!(pool.free(), 0);
        let kept: Vec<bool> = held.into_iter().map(|r| pool.release(r)).collect();
        assert_eq!(kept, vec![false, false, true]);
        assert_eq!(pool.free(), 1);
    }

    proptest! {
        /// free + active never exceeds capacity, whatever the op sequence
        #[test]
        fn prop_free_plus_active_within_capacity(ops in proptest::collection::vec(any::<bool>(), 0..200), cap in 0usize..16) {
            let mut pool: Pool<Rec> = Pool::new(cap);
            let mut out = Vec::new();
            for acquire in ops {
                if acquire {
                    if let Some(r) = pool.acquire() {
                        out.push(r);
                    }
                } else if let Some(r) = out.pop() {
                    pool.release(r);
                }
                prop_assert_eq!(pool.active(), out.len());
                prop_assert!(pool.free() + pool.active() <= pool.capacity());
            }
        }
    }
}
