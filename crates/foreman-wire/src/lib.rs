// SPDX-License-Identifier: MIT

//! The external wire schema (§6): self-describing, tagged-variant DTOs kept
//! separate from `foreman-core`'s internal representation, so the internal
//! `Event` shape can evolve without breaking the HTTP/WebSocket boundary.

mod event;

pub use event::{WireEvent, WireEventKind};
