//! Test module for calltrace
//!
//! Unit and property-based tests (proptest) covering encoding, redaction,
//! correlation, exclusion and error escalation through the public hooks.

#[cfg(test)]
pub mod fixtures;





#[cfg(test)]
pub mod exclusion_tests;


#[cfg(test)]
pub mod escalation_tests;
