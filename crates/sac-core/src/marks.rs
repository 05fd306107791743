//! Marks scheme
//!
//! Internal reporting runs six days at 10 marks each (report 7, the two
//! social links 2.75 apiece) for 60 total; the final bundle is worth 40
//! (report 25, the two links 7.5 apiece). The maxima here are the single
//! source of truth; the server re-validates every mark against them.

use sac_db::entities::final_submission::FinalKind;
use sac_db::entities::internal_submission::{SubmissionKind, SubmissionStatus};
use sac_db::entities::{final_submission, internal_submission};

use crate::{Error, Result};

pub const INTERNAL_REPORT_MAX: f64 = 7.0;
pub const INTERNAL_LINK_MAX: f64 = 2.75;
pub const FINAL_REPORT_MAX: f64 = 25.0;
pub const FINAL_LINK_MAX: f64 = 7.5;

/// Number of internal reporting days
pub const INTERNAL_DAYS: i32 = 6;

/// Maximum marks for an internal sub-item
pub fn internal_max(kind: SubmissionKind) -> f64 {
    match kind {
        SubmissionKind::Report => INTERNAL_REPORT_MAX,
        SubmissionKind::LinkedinLink | SubmissionKind::YoutubeLink => INTERNAL_LINK_MAX,
    }
}

/// Maximum marks for a final sub-item
pub fn final_max(kind: FinalKind) -> f64 {
    match kind {
        FinalKind::FinalReport => FINAL_REPORT_MAX,
        FinalKind::FinalYoutube | FinalKind::FinalLinkedin => FINAL_LINK_MAX,
    }
}

pub fn validate_internal_marks(kind: SubmissionKind, value: f64) -> Result<()> {
    let max = internal_max(kind);
    if !value.is_finite() || value < 0.0 || value > max {
        return Err(Error::validation(
            "marks",
            format!("marks must lie within [0, {}]", max),
        ));
    }
    Ok(())
}

pub fn validate_final_marks(kind: FinalKind, value: f64) -> Result<()> {
    let max = final_max(kind);
    if !value.is_finite() || value < 0.0 || value > max {
        return Err(Error::validation(
            "marks",
            format!("marks must lie within [0, {}]", max),
        ));
    }
    Ok(())
}

/// Sum of marks over approved internal sub-items
pub fn internal_total(rows: &[internal_submission::Model]) -> f64 {
    rows.iter()
        .filter(|r| r.status == SubmissionStatus::Approved)
        .filter_map(|r| r.marks)
        .sum()
}

/// Sum of marks over approved final sub-items
pub fn final_total(rows: &[final_submission::Model]) -> f64 {
    rows.iter()
        .filter(|r| r.status == SubmissionStatus::Approved)
        .filter_map(|r| r.marks)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_internal_day_is_worth_ten() {
        let day: f64 = SubmissionKind::ALL.iter().map(|k| internal_max(*k)).sum();
        assert_eq!(day, 10.0);
    }

    #[test]
    fn test_program_totals() {
        let internal: f64 = SubmissionKind::ALL.iter().map(|k| internal_max(*k)).sum();
        assert_eq!(internal * INTERNAL_DAYS as f64, 60.0);

        let fin: f64 = FinalKind::ALL.iter().map(|k| final_max(*k)).sum();
        assert_eq!(fin, 40.0);
    }

    #[test]
    fn test_marks_range_validation() {
        assert!(validate_internal_marks(SubmissionKind::Report, 0.0).is_ok());
        assert!(validate_internal_marks(SubmissionKind::Report, 7.0).is_ok());
        assert!(validate_internal_marks(SubmissionKind::Report, 7.01).is_err());
        assert!(validate_internal_marks(SubmissionKind::Report, -0.5).is_err());
        assert!(validate_internal_marks(SubmissionKind::LinkedinLink, 2.75).is_ok());
        assert!(validate_internal_marks(SubmissionKind::LinkedinLink, 3.0).is_err());
        assert!(validate_internal_marks(SubmissionKind::Report, f64::NAN).is_err());
    }

    #[test]
    fn test_final_marks_range_validation() {
        assert!(validate_final_marks(FinalKind::FinalReport, 25.0).is_ok());
        assert!(validate_final_marks(FinalKind::FinalReport, 25.5).is_err());
        assert!(validate_final_marks(FinalKind::FinalYoutube, 7.5).is_ok());
        assert!(validate_final_marks(FinalKind::FinalLinkedin, 8.0).is_err());
    }

    #[test]
    fn test_totals_count_only_approved() {
        use chrono::Utc;
        let row = |status, marks| internal_submission::Model {
            username: "2211003456".to_string(),
            day_number: 1,
            kind: SubmissionKind::Report,
            url: "https://example.com".to_string(),
            status,
            marks,
            rejection_reason: None,
            evaluated_by: None,
            evaluated_at: None,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let rows = vec![
            row(SubmissionStatus::Approved, Some(6.0)),
            row(SubmissionStatus::Submitted, None),
            row(SubmissionStatus::Rejected, None),
            row(SubmissionStatus::Approved, Some(2.5)),
        ];

        assert_eq!(internal_total(&rows), 8.5);
    }
}
