//! Type aliases for the interior-mutable handles used across the editor.
//!
//! The editor core is single-threaded and event-loop driven, so shared
//! state is `Rc<RefCell<T>>` rather than `Arc<Mutex<T>>`.
//!
//! ```rust
//! use lightplot_core::types::{shared, Shared};
//!
//! let counter: Shared<u32> = shared(0);
//! *counter.borrow_mut() += 1;
//! assert_eq!(*counter.borrow(), 1);
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A reference-counted, interior-mutable wrapper for single-threaded sharing.
pub type Shared<T> = Rc<RefCell<T>>;

/// The non-owning counterpart of [`Shared`].
///
/// Event listeners capture this so a registration never keeps its owner alive.
pub type WeakShared<T> = Weak<RefCell<T>>;

/// Wrap a value in a new [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}
