// Core modules implementing folds, resource lifecycle, and error modeling.
pub mod accumulator;
pub mod combinators;
pub mod error;
pub mod lines;
pub mod merge;
pub mod sequence;
pub mod source;
pub mod yielder;
