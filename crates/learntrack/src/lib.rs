//! Compliance scoring and achievement engine for learnership programmes.
//!
//! The `compliance` module holds the engine proper: lifecycle status
//! resolution, bi-weekly timesheet scheduling, the weighted compliance
//! score calculator, idempotent badge awarding, and monthly snapshot
//! rollups. Everything talks to the backing store through the
//! [`compliance::repository::ComplianceRepository`] trait so callers can
//! swap the hosted store for the in-memory reference implementation.

pub mod compliance;
pub mod config;
pub mod error;
pub mod telemetry;
