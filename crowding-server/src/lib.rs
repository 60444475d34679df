//! Crowding inference server for a metro network.
//!
//! Answers "how crowded is this station right now?" by estimating train
//! headways from the real-time schedule feed and classifying them against
//! the time of day, public holidays, rain and reported delays.

pub mod aggregate;
pub mod classify;
pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod feeds;
pub mod headway;
pub mod reference;
pub mod resolver;
pub mod store;
pub mod web;
