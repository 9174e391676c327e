//! depbatch - Batch dependency upgrader library
//!
//! This library provides the core functionality for maintaining .NET
//! repositories in bulk:
//! - Applying a fixed plan of package upgrades to every project file
//! - Normalizing nuget.config files into well-formed XML

pub mod cli;
pub mod domain;
pub mod error;
pub mod invoker;
pub mod locator;
pub mod normalizer;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod runner;
