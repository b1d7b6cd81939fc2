// SPDX-License-Identifier: MPL-2.0
//! Support utilities: event subscription and asynchronous resource loading.

pub mod bus;
pub mod fetcher;

pub use bus::{EventBus, SubscriptionId};
pub use fetcher::{CancellationToken, FetchEvent, FetchPayload, Fetcher, ResponseKind};
