// File: roastbot-core/tests/test_utils/mod.rs
#![allow(dead_code)]

pub mod helpers;
