//! # Reactive Cells for Form State
//!
//! This crate provides the reactive primitives the form engine is built on:
//! writable cells and lazily memoized derived cells.
//!
//! ## Core Types
//!
//! - [`Monitor`]: The dependency-tracking token passed explicitly to every read.
//!   There is no ambient tracking context.
//!
//! - [`Signal<T>`]: A writable cell. Writes that compare equal to the current
//!   value are dropped, so readers never observe a spurious change.
//!
//! - [`Derived<T>`]: A lazily computed cell. The value is recomputed only when
//!   one of the cells it read last time has moved to a new version. A
//!   recomputed value that compares equal to the cached one is discarded and
//!   the cached value is returned instead, which keeps `Rc` identities stable.
//!
//! ## Design Principles
//!
//! 1. **Pull-based**: Nothing is recomputed on write. Reads validate the
//!    recorded dependency versions and recompute on demand.
//!
//! 2. **Single-threaded**: Cells use `Rc`/`RefCell`. A thread-local write clock
//!    lets a read skip validation entirely when nothing was written since the
//!    cell was last verified.
//!
//! 3. **Explicit context**: Every read takes a `&Monitor`, which keeps
//!    dependency capture visible in signatures and trivially testable.
//!
//! ## Usage
//!
//! ```rust
//! use impulse_signal::{Derived, Monitor, Signal};
//!
//! let count = Signal::new(2);
//! let doubled = Derived::new({
//!     let count = count.clone();
//!     move |monitor| count.read(monitor) * 2
//! });
//!
//! let monitor = Monitor::new();
//! assert_eq!(doubled.read(&monitor), 4);
//!
//! count.write(5);
//! assert_eq!(doubled.read(&monitor), 10);
//! ```

#![forbid(unsafe_code)]

mod derived;
mod monitor;
mod signal;

pub use derived::Derived;
pub use monitor::Monitor;
pub use signal::Signal;
