//! Purpose: Library behind the `graphfeed` CLI: seed a graph store, then read a feed back.
//! Exports: `api` (executors, seeder, feed reader), `core` (statements, records, errors).
//! Role: Sequential engine over a single store connection; no pooling, no retries.
//! Invariants: Randomness and the executor are always passed in explicitly.
pub mod api;
pub mod core;
