//! # pharmsettle-allocator
//!
//! **Pure deterministic allocation**, no side effects.
//!
//! Given available cash, a payable snapshot, and an equity snapshot, the
//! [`AllocationRecommender`] proposes a per-partner payment that corrects
//! historical imbalance within safety caps. The [`reconcile`] step then
//! forces the whole-unit amounts to sum exactly to the rounded cash.
//!
//! Same inputs, same plan: partners are processed in partner-id order and
//! reconciliation ties break by that order.

pub mod recommender;
pub mod reconciler;

pub use recommender::{AllocationInputs, AllocationRecommender};
pub use reconciler::reconcile;
