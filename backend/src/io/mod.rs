//! # IO Module
//!
//! Interfaces that expose the domain to the outside world. Currently the
//! REST API served by the `van-tracker` binary.

pub mod rest;
