//! Test suites for the lifecycle coordinator and daemon host.

mod support;
