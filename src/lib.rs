//! kava: a test harness for Java exercise programs graded by a remote
//! service. Scrapes the service's HTML result pages into normalized specs,
//! stores them locally, and verifies a program's stdout against them,
//! running the tests concurrently.

pub use crate::errors::KavaError;

pub mod cli;
pub mod errors;
pub mod harness;
pub mod output;
pub mod program;
pub mod remote;
pub mod scrape;
pub mod select;
pub mod spec;
pub mod store;
