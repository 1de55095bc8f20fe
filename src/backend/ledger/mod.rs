//! Membership Ledger Module
//!
//! This module owns the membership rules shared by project teams,
//! ride-shares and chat groups: capacity, ownership, lifecycle status and
//! proximity search over active rides.
//!
//! # Architecture
//!
//! - **`service`** - `MembershipLedger`: create, get, list, join, leave,
//!   set_status
//! - **`rides`** - `nearby_active` proximity search
//! - **`handlers`** - `/api/groups` and `/api/rides` HTTP handlers
//!
//! The ledger never mutates membership with a read-modify-write of the
//! whole group. Joins and leaves go through the storage layer's conditional
//! primitives, status changes through a compare-and-set.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use studyhub::backend::ledger::MembershipLedger;
//! use studyhub::backend::storage::MemoryStorage;
//! use studyhub::shared::{GroupAttrs, GroupKind};
//!
//! # async fn example() -> Result<(), studyhub::backend::error::BackendError> {
//! let ledger = MembershipLedger::new(Arc::new(MemoryStorage::new()));
//! let attrs = GroupAttrs { title: "Algorithms Study".into(), ..Default::default() };
//! let group = ledger.create("u1", GroupKind::Project, 3, attrs).await?;
//! ledger.join(group.id, "u2").await?;
//! # Ok(())
//! # }
//! ```

/// Membership ledger service
pub mod service;

/// Active ride proximity search
pub mod rides;

/// HTTP handlers
pub mod handlers;

pub use service::MembershipLedger;
