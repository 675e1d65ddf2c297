//! # xpbot Test Suite
//!
//! Unified workspace test crate. Scenario tests here exercise the economy
//! engine end to end, across module boundaries, the way a bot host would
//! drive it; unit tests live next to the code in `xpbot-economy`.
//!
//! ## Structure
//!
//! - `integration/` - multi-step economy flows, draw statistics, durability
//!
//! ## Running
//!
//! ```bash
//! cargo test -p xpbot-tests
//! cargo test -p xpbot-tests integration::economy_flows
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
