use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::service::EligibilityService;

/// Totals produced by a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub checked: usize,
    pub eligible: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("invalid batch CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write batch results: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct BatchRow {
    #[serde(alias = "propertyId", alias = "PropertyId")]
    property_id: String,
}

#[derive(Debug, Serialize)]
struct BatchResult<'a> {
    property_id: &'a str,
    eligible: bool,
    reason: &'a str,
}

/// Verifies every `property_id` in `input` and writes one result row each.
///
/// Upstream failures are recorded against the row and do not stop the batch;
/// malformed CSV does.
pub async fn check_batch<R, W>(
    service: &EligibilityService,
    input: R,
    output: W,
) -> Result<BatchSummary, BatchError>
where
    R: Read,
    W: Write,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let mut writer = csv::Writer::from_writer(output);
    let mut summary = BatchSummary::default();

    for record in reader.deserialize::<BatchRow>() {
        let row = record?;
        if row.property_id.is_empty() {
            continue;
        }
        summary.checked += 1;

        let (eligible, reason) = match service.verify_property(&row.property_id).await {
            Ok(verdict) => (verdict.property_eligible, verdict.reason),
            Err(err) => {
                warn!(property_id = %row.property_id, error = %err, "batch row failed");
                summary.failed += 1;
                (false, err.to_string())
            }
        };
        if eligible {
            summary.eligible += 1;
        }

        writer.serialize(BatchResult {
            property_id: &row.property_id,
            eligible,
            reason: &reason,
        })?;
    }

    writer.flush()?;
    info!(
        checked = summary.checked,
        eligible = summary.eligible,
        failed = summary.failed,
        "batch eligibility check complete"
    );
    Ok(summary)
}
