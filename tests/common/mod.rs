#![allow(unused_imports)]
#![allow(dead_code)]

pub use branchbuild_test_utils::{eventually, init_tracing, with_timeout};

use std::error::Error;

pub type TestResult = Result<(), Box<dyn Error>>;
