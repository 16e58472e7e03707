//! Report generation port.

use crate::domain::error::SwingscanError;
use crate::domain::profile::ScoringProfile;
use crate::domain::scan::ScanOutcome;
use std::path::Path;

/// Port for writing ranked scan results.
pub trait ReportPort {
    fn write(
        &self,
        outcome: &ScanOutcome,
        profile: &ScoringProfile,
        output_path: &Path,
    ) -> Result<(), SwingscanError>;
}
