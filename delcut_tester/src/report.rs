//! Plain-text rendering of a verdict, mirroring the analysis report of the upload tool.

use delcut_vision::{MatchPolicy, Verdict};
use std::fmt;

fn percent(value: f64) -> String {
    format!("%{:.1}", value * 100.0)
}

/// Analysis report for one inspected part.
///
/// `pool_size` is the number of references in the session, used to say how many the
/// first-match scan skipped.
pub struct Report<'a> {
    part_label: &'a str,
    verdict: &'a Verdict,
    pool_size: usize,
}

impl<'a> Report<'a> {
    pub fn new(part_label: &'a str, verdict: &'a Verdict, pool_size: usize) -> Self {
        Self {
            part_label,
            verdict,
            pool_size,
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = self.verdict;
        writeln!(f, "---")?;
        writeln!(f, "Analysis report: {}", self.part_label)?;
        writeln!(f, "  Texture score: {:.2}", verdict.texture_score)?;

        for comparison in &verdict.comparisons {
            writeln!(
                f,
                "  vs {}: similarity {} (texture threshold {:.2}){}",
                comparison.label,
                percent(comparison.similarity),
                comparison.texture_threshold,
                if comparison.matched { " <- match" } else { "" }
            )?;
        }
        if verdict.policy == MatchPolicy::FirstMatch && verdict.scan_stopped_early {
            let skipped = self.pool_size.saturating_sub(verdict.comparisons.len());
            writeln!(f, "  Scan stopped at the first match; {skipped} reference(s) not evaluated.")?;
        }

        if verdict.is_defect {
            writeln!(f, "RESULT: RED (defective)")?;
            writeln!(f, "  This part matches the RED samples in the session.")?;
            writeln!(
                f,
                "  Most similar sample: {}",
                verdict.matched_label.as_deref().unwrap_or("-")
            )?;
            writeln!(f, "  Similarity: {}", percent(verdict.best_similarity))
        } else {
            writeln!(f, "RESULT: ACCEPT / clean")?;
            writeln!(f, "  This part does not resemble the uploaded RED samples.")?;
            writeln!(
                f,
                "  Closest similarity to a RED sample: {} (safe zone)",
                percent(verdict.best_similarity)
            )
        }
    }
}
