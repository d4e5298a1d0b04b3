//! Core engine: retry → dispatch → aggregate.

pub mod aggregator;
pub mod dispatcher;
pub mod retry;
