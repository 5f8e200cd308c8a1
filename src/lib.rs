//! Template-Based Payroll Calculation Engine
//!
//! This crate provides a small sandboxed formula language for defining payroll
//! components (basic salary, allowances, statutory deductions) as human-written
//! formula strings, and an orchestrator that evaluates a full calculation
//! template against per-employee variable contexts to produce a payroll
//! breakdown with gross, deduction, and net totals.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod formula;
pub mod models;
