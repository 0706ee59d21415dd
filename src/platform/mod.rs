//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (folded into per-frame snapshots)
//! - The identity gate deciding whether a player may start or keep playing

pub mod input;

use std::cell::Cell;
use std::rc::Rc;

pub use input::{InputSnapshot, InputState, Key};

/// Answers "may this player play right now?". Checked before a session
/// starts and again every frame while it runs.
pub trait Identity {
    fn is_authorized(&self) -> bool;
}

/// Identity for builds without a login step
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAuthorized;

impl Identity for AlwaysAuthorized {
    fn is_authorized(&self) -> bool {
        true
    }
}

/// Authorization flag shared with whatever owns the connection. Clones see
/// the same flag, so the host can flip it after handing one to the driver.
#[derive(Debug, Clone, Default)]
pub struct SharedFlag(Rc<Cell<bool>>);

impl SharedFlag {
    pub fn new(authorized: bool) -> Self {
        Self(Rc::new(Cell::new(authorized)))
    }

    pub fn set(&self, authorized: bool) {
        if self.0.replace(authorized) != authorized {
            log::info!("Authorization changed: {}", authorized);
        }
    }
}

impl Identity for SharedFlag {
    fn is_authorized(&self) -> bool {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_flag_clones_share_state() {
        let flag = SharedFlag::new(false);
        let seen_by_driver = flag.clone();
        assert!(!seen_by_driver.is_authorized());
        flag.set(true);
        assert!(seen_by_driver.is_authorized());
    }
}
