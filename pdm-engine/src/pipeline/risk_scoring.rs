//! Stage 4: deterministic risk scoring
//!
//! Risk Score = ceil((S x P x V x E) / 25) mapped to the 1-25 scale.
//! All scoring is rule-based; no generation call is involved, so the same
//! element always yields the same factors across runs and restarts.

use crate::models::{ClassifiedDataElement, DataCategory, EncryptionStatus, RiskFactors};

/// Sub-category keywords that escalate sensitive_personal to the maximum
const SPECIAL_CATEGORY_KEYWORDS: &[&str] =
    &["biometric", "genetic", "children", "criminal", "health"];

/// Compute risk factors for one classified element
pub fn compute_risk_score(element: &ClassifiedDataElement) -> RiskFactors {
    let sensitivity = sensitivity_weight(element);
    let processing = processing_risk(element);
    let volume = volume_indicator(element);
    let exposure = exposure_factor(element);

    let raw = f64::from(sensitivity) * f64::from(processing) * f64::from(volume)
        * f64::from(exposure)
        / 25.0;
    let final_score = (raw.ceil() as i64).clamp(1, 25) as u8;

    RiskFactors {
        sensitivity_weight: sensitivity,
        processing_risk: processing,
        volume_indicator: volume,
        exposure_factor: exposure,
        final_score,
    }
}

fn sensitivity_weight(el: &ClassifiedDataElement) -> u8 {
    match el.data_category {
        DataCategory::NonPersonal | DataCategory::Anonymized => 1,
        DataCategory::Pseudonymized => 2,
        DataCategory::Personal => 3,
        DataCategory::SensitivePersonal => {
            let sub = el
                .data_sub_category
                .as_deref()
                .unwrap_or("")
                .to_lowercase();
            if SPECIAL_CATEGORY_KEYWORDS.iter().any(|k| sub.contains(k)) {
                5
            } else {
                4
            }
        }
    }
}

fn processing_risk(el: &ClassifiedDataElement) -> u8 {
    let types: Vec<String> = el
        .processing_types
        .iter()
        .map(|t| t.to_lowercase())
        .collect();
    let has_external = !el.data_recipients_external.is_empty();
    let has_automated = types.iter().any(|t| {
        ["profiling", "automated_decision", "automated decision-making"]
            .iter()
            .any(|k| t.contains(k))
    });

    if has_automated && has_external {
        5
    } else if has_external {
        4
    } else if has_automated {
        3
    } else if types.iter().any(|t| {
        ["transfer", "sharing", "processing"]
            .iter()
            .any(|k| t.contains(k))
    }) {
        2
    } else {
        1
    }
}

fn volume_indicator(el: &ClassifiedDataElement) -> u8 {
    let subjects = el
        .data_subjects
        .iter()
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    if ["all", "public", "citizen"].iter().any(|k| subjects.contains(k)) {
        5
    } else if ["customer", "user"].iter().any(|k| subjects.contains(k)) {
        4
    } else if ["employee", "staff"].iter().any(|k| subjects.contains(k)) {
        3
    } else {
        // "contractor"/"vendor" and the unknown default both land on moderate
        2
    }
}

fn exposure_factor(el: &ClassifiedDataElement) -> u8 {
    let mut score: u8 = 1;

    if el.cross_border_transfer {
        score += 2;
    }
    if el.encryption_at_rest == EncryptionStatus::No
        || el.encryption_in_transit == EncryptionStatus::No
    {
        score += 1;
    }
    if el.encryption_at_rest == EncryptionStatus::Unknown
        || el.encryption_in_transit == EncryptionStatus::Unknown
    {
        score += 1;
    }
    if el.retention_period.is_none() || el.retention_compliant == Some(false) {
        score += 1;
    }
    if el.data_recipients_external.len() > 1 {
        score += 1;
    }

    score.min(5)
}
