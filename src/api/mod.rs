//! Purpose: Define the stable public Rust API boundary for seqfold.
//! Exports: Sequence contract, fold workers, yielders, combinators, line input, errors.
//! Role: Public, additive-only surface; hides the internal module layout.
//! Invariants: This module is the only public path to the fold machinery.
//! Invariants: Internal helpers (resource guards, fold drivers) are not exposed.

pub use crate::core::accumulator::{Accumulator, Batched, NeverYield, Step, YieldingAccumulator};
pub use crate::core::combinators::{Concat, Filtered, Limited, Mapped, each};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::lines::{Line, LineSequence, lines};
pub use crate::core::merge::MergeSequence;
pub use crate::core::sequence::{BaseSequence, Sequence, SimpleSequence};
pub use crate::core::source::{IterSource, Source};
pub use crate::core::yielder::{Continuation, Yielder};
