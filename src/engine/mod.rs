//! The allocation and identity core.
//!
//!  - [calendar] decides which recurring obligations take capacity from a date.
//!  - [day] holds a date's allocations and derives its available capacity.
//!  - [resolver] maps user typed names onto canonical project names.
//!  - [alias] generates short aliases for bulk imported project lists.
//!
//! Nothing here performs I/O. Day records and the registry are passed in explicitly and persisted
//! by the caller.

pub mod alias;
pub mod calendar;
pub mod day;
pub mod error;
pub mod resolver;
