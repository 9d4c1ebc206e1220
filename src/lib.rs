// src/lib.rs

//! Orchestrated step-by-step problem solver.
//!
//! A query is decomposed into an ordered plan of steps by a remote reasoning
//! service. Each calculation step is solved by generating a small arithmetic
//! snippet, executing it in a strict local sandbox, and critiquing the output,
//! with up to three refine attempts per step. Accepted results accumulate in a
//! shared context that later steps (and the final synthesis call) read from.

pub mod agents;
pub mod config;
pub mod context;
pub mod driver;
pub mod protocol;
pub mod runner;
pub mod sandbox;

pub use config::SolverConfig;
pub use context::ContextStore;
pub use driver::{Solver, SolverError};
pub use protocol::{Outcome, Plan, Solution, SolverEvent, Step, StepKind, Value};
