//! Execution engine: the response table, the filter evaluator and the cut
//! executor.

pub mod evaluator;
pub mod executor;
pub mod table;

pub use evaluator::{evaluate, EvalError};
pub use executor::{CutFailure, ExecutionResult, Executor, ResultCell, ResultTable};
pub use table::{CellValue, ResponseTable};
