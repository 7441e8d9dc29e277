//! FAIR-compliance indicators
//!
//! The indicators are computed by an external checker. [`HowfairisCommand`] runs the
//! `howfairis` command-line tool and reads the five recommendation sections out of its
//! report; [`ComplianceFetcher`] adapts any [`ComplianceChecker`] to the retry layer.

mod checker;
mod provider;

pub use checker::{CheckError, ComplianceChecker, ComplianceIndicators, HowfairisCommand, parse_howfairis_output};
pub use provider::{ComplianceFetcher, ComplianceReport};
