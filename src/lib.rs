//! Mortgage Intake Library
//!
//! Core of the mortgage application intake wizard and its admin review
//! dashboard: field formatting and validation, derived underwriting figures,
//! persistence of submitted applications, and the review workflow.
//!
//! # Modules
//!
//! - `autosave`: Draft autosave channel.
//! - `clock`: Current date/time source.
//! - `config`: Configuration management.
//! - `derivation`: Credit score, DTI, loan amount and payment estimates.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `models`: Core data models.
//! - `repository`: Submitted application storage.
//! - `storage`: Key-value persistence providers.
//! - `validation`: Field formatters and validation rules.
//! - `workflow`: Review state machine.

pub mod autosave;
pub mod clock;
pub mod config;
pub mod derivation;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;
pub mod validation;
pub mod workflow;
