use super::test_helpers::*;
use super::*;
use crate::progress::RawProgress;
use crate::types::JobStatus;
