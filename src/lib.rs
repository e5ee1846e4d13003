//! Semi-dynamic range-minimum queries driven by a binary command stream.
//!
//! [`rmq`] holds the data structure. [`command`] decodes the stream,
//! [`runner`] executes it, and the `frmq` binary wires both to stdin/stdout.

pub mod command;
pub mod config;
pub mod options;
pub mod report;
pub mod rmq;
pub mod runner;
