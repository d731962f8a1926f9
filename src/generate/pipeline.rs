//! Address-by-address description generation, resumable from the journal.

use crate::config::GenerationConfig;
use crate::error::{PropevalError, Result};
use crate::generate::client::TextGenerator;
use crate::generate::journal::{DescriptionJournal, DescriptionRecord};
use std::time::Duration;

/// Outcome counts for one generation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Addresses already present in the journal when the run started.
    pub skipped: usize,
    pub generated: usize,
    pub failed: usize,
}

/// Generate a description for every address not yet in `journal`.
///
/// The journal must hold a prefix of `addresses`; resuming against a different
/// address list is rejected. A failed API call is logged and recorded with its
/// error, and the run moves on to the next address.
pub async fn generate_descriptions<G: TextGenerator>(
    addresses: &[String],
    generator: &G,
    journal: &mut DescriptionJournal,
    config: &GenerationConfig,
) -> Result<GenerationSummary> {
    let completed = journal.completed();
    if completed > addresses.len() {
        return Err(PropevalError::InvalidInput(format!(
            "{} holds {} records but only {} addresses were supplied",
            journal.path().display(),
            completed,
            addresses.len()
        )));
    }
    if let Some(idx) = journal
        .addresses()
        .iter()
        .zip(addresses)
        .position(|(logged, expected)| logged != expected)
    {
        return Err(PropevalError::InvalidInput(format!(
            "{} record {} is for '{}' but address {} is '{}'",
            journal.path().display(),
            idx + 1,
            journal.addresses()[idx],
            idx + 1,
            addresses[idx]
        )));
    }

    let mut summary = GenerationSummary {
        skipped: completed,
        ..GenerationSummary::default()
    };
    if completed > 0 {
        log::info!("Resuming after {} completed addresses", completed);
    }

    let delay = Duration::from_millis(config.request_delay_ms);
    let remaining = &addresses[completed..];

    for (idx, address) in remaining.iter().enumerate() {
        log::info!("Generating description for: {}", address);
        let prompt = config.prompt_for(address);

        let record = match generator.generate(&prompt).await {
            Ok(text) => {
                summary.generated += 1;
                DescriptionRecord::success(address.as_str(), text.trim())
            }
            Err(e) => {
                log::warn!("Description for {} failed: {}", address, e);
                summary.failed += 1;
                DescriptionRecord::failure(address.as_str(), e.to_string())
            }
        };
        journal.append(&record)?;

        if idx + 1 < remaining.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    Ok(summary)
}
