#![doc = "locale-bucket-core: core logic library for locale-bucket."]

//! Turns a spreadsheet of translations into versioned per-language JSON
//! artifacts and publishes them to a bucket scope.
//! Storage clients, credentials and the command line live in the `locale-bucket` crate.
//!
//! # Usage
//! Open a [`sheet::Sheet`], describe the run with a [`synchronise::SynchroniseConfig`]
//! and hand both to [`synchronise::synchronise`] together with an
//! [`contract::ObjectStore`] implementation.

pub mod cell;
pub mod config;
pub mod contract;
pub mod network;
pub mod notify;
pub mod publisher;
pub mod sheet;
pub mod synchronise;
pub mod translation;
pub mod version;
