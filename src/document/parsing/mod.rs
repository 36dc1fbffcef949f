//! Document parsing utilities
//!
//! This module contains specialized parsing functions for list numbering,
//! text extraction, headline detection and record tables.

pub(crate) mod formatting;
pub(crate) mod heading;
pub(crate) mod numbering;
pub(crate) mod table;
