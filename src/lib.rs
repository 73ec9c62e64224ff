pub mod builder;
pub mod constants;
pub mod domain;
pub mod harness;
pub mod memcheck;
pub mod runner;
pub mod signal;
pub mod stubs;


pub use builder::{BuildError, Builder, GccBuilder};
pub use domain::{
    BuildMode, BuildOutcome, BuildRequest, CheckReport, ErrorKind, ErrorReport, RunRequest,
};
pub use harness::{Harness, HarnessError};
pub use memcheck::{MemcheckError, MemcheckFindings, MemoryChecker, ValgrindChecker};
pub use runner::{BinaryRunner, Runner, RunnerError};
