//! Alert hand-off from the tracking engine to consumers.
//!
//! The engine publishes every alert it records onto an [`AlertChannel`].
//! The channel is a single-consumer work queue: each alert is delivered to
//! exactly one `take`/`drain_available` call, in publication order.
//! Consumers that need the full history read the entity store instead.
//!
//! ```text
//! TrackingEngine ──publish──► AlertChannel ──take / drain──► consumer
//!        │                       (FIFO)
//!        └──append_alert──► EntityStore ──list_alerts──► any reader
//! ```

mod channel;

pub use channel::AlertChannel;
