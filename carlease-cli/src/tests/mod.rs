//! Shared test harness modules for the carlease CLI.

use super::*;

mod helpers;
