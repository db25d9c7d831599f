//! Cooperative cancellation, checked between data rows.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

/// A cloneable flag; every clone observes [`CancelFlag::cancel`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
  pub fn new() -> Self { Self::default() }

  pub fn cancel(&self) { self.0.store(true, Ordering::Release); }

  pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Acquire) }
}
