//! Purpose: Resource-safe lazy sequences with suspendable folds, plus a delimited-text parser.
//! Exports: `api` (sequence contract, yielders, combinators, errors), `parsers`.
//! Role: Library backing the `seqfold` CLI and its tests.
//! Invariants: A resource opened for a fold is released exactly once on every exit path.
//! Invariants: Consumers never pull elements directly; they hand sequences a worker.
pub mod api;
mod core;
pub mod parsers;
