//! Query construction pipeline: boolean grammar, immutable spec, SQL compiler.

pub mod boolean;
pub mod compile;
pub mod spec;

pub use compile::{compile, CompiledQuery, FetchPlan};
pub use spec::{Predicate, SearchSpec, SqlValue, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
