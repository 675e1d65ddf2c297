//! # Ports
//!
//! Interfaces between the economy engine and the host application.

pub mod outbound;
