//! # Integration Scenarios
//!
//! Multi-step flows driving the economy service the way a bot host does:
//! earn, buy, open, equip, grant, reset. Each scenario runs against the
//! in-memory store with a controllable clock unless it is specifically
//! about durability.

mod draw_distribution;
mod durability;
mod economy_flows;
