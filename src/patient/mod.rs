//! Patient module
//!
//! Get-by-NHS-number and search against the PDS `Patient` endpoint, plus
//! the resource model those calls decode into.

mod model;
mod search;
mod service;

pub use model::{
    Address, Bundle, CodeableConcept, Coding, Contact, ContactPoint, Entry, Extension, HumanName,
    Identifier, Meta, Patient, Period, Reference, Search,
};
pub use search::{DateParam, Gender, ParseParamError, PatientSearchOptions, Prefix};
pub use service::PatientService;
