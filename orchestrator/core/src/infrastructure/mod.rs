// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure adapters shared across bounded contexts.

pub mod event_bus;

pub use event_bus::{DomainEvent, EventBus, EventBusError, EventReceiver, TaskEventReceiver};
