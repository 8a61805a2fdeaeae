//! Real-time running coach.
//!
//! Watches a live run through [`run::RunStateProvider`], decides what is
//! worth saying with the [`triggers`], schedules it through the bounded
//! [`prompt`] queue and the [`engine`], speaks it via [`speech`], and answers
//! the runner's voice questions and commands through [`voice`]. [`session`]
//! wires everything into one tokio task.

pub mod config;
pub mod engine;
pub mod prompt;
pub mod run;
pub mod session;
pub mod speech;
pub mod triggers;
pub mod voice;
