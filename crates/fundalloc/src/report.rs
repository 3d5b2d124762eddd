//! Report assembly and rendering

use serde::{Deserialize, Serialize};

use fundalloc_core::results::{AllocationOutcome, AllocationRun};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Planned budgets evaluated as-is
    pub approach_a: AllocationOutcome,
    /// Optimized allocation: best method plus all surviving candidates
    pub approach_b: AllocationRun,
    /// Share of the fungible budget the winning allocation spends
    pub spent_share: f64,
}

impl Report {
    pub fn new(approach_a: AllocationOutcome, approach_b: AllocationRun, budget: f64) -> Self {
        let spent_share = approach_b.best_outcome().spent_share(budget);
        Self {
            approach_a,
            approach_b,
            spent_share,
        }
    }

    /// Drop the losing candidates, keeping only the winner.
    pub fn best_only(mut self) -> Self {
        let best = self.approach_b.best.clone();
        self.approach_b.outcomes.retain(|label, _| *label == best);
        self.approach_b.scores.retain(|label, _| *label == best);
        self
    }

    /// Human-readable summary for stdout.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let best = self.approach_b.best_outcome();

        out.push_str("Method scores (lower is better):\n");
        for (label, score) in &self.approach_b.scores {
            let marker = if *label == self.approach_b.best {
                " <- best"
            } else {
                ""
            };
            out.push_str(&format!("  {label:<28} {score:.6}{marker}\n"));
        }

        out.push_str(&format!(
            "\nApproach A (planned):  objective {:.6}, cases {:.1}, deaths {:.1}\n",
            self.approach_a.objective, self.approach_a.total.cases, self.approach_a.total.deaths
        ));
        out.push_str(&format!(
            "Approach B (optimized): objective {:.6}, cases {:.1}, deaths {:.1}\n",
            best.objective, best.total.cases, best.total.deaths
        ));
        out.push_str(&format!(
            "Budget spent by winner: {:.1}%\n",
            self.spent_share * 100.0
        ));

        out.push_str("\nOptimized allocation:\n");
        for (country, spend) in &best.fungible_by_country {
            let planned = self.approach_a.fungible_by_country.get(country).copied();
            match planned {
                Some(planned) => out.push_str(&format!(
                    "  {country:<16} {spend:>14.2}  (planned {planned:>14.2})\n"
                )),
                None => out.push_str(&format!("  {country:<16} {spend:>14.2}\n")),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use fundalloc_core::results::ResultDatum;

    use super::*;

    fn outcome(objective: f64) -> AllocationOutcome {
        let spend: BTreeMap<String, f64> = [("tbZMB".to_string(), 40.0)].into_iter().collect();
        AllocationOutcome {
            fungible_by_country: spend.clone(),
            baseline_by_country: spend.clone(),
            total_by_country: spend.clone(),
            results_by_country: [("tbZMB".to_string(), ResultDatum::new(60.0, 6.0, 40.0))]
                .into_iter()
                .collect(),
            total: ResultDatum::new(60.0, 6.0, 40.0),
            objective,
        }
    }

    fn run() -> AllocationRun {
        AllocationRun {
            best: "greedy: forwards".to_string(),
            outcomes: [
                ("greedy: forwards".to_string(), outcome(1.2)),
                ("greedy: backwards".to_string(), outcome(1.3)),
            ]
            .into_iter()
            .collect(),
            scores: [
                ("greedy: forwards".to_string(), 1.2),
                ("greedy: backwards".to_string(), 1.3),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn best_only_drops_losing_candidates() {
        let report = Report::new(outcome(1.5), run(), 50.0).best_only();
        assert_eq!(report.approach_b.outcomes.len(), 1);
        assert!(report.approach_b.outcomes.contains_key("greedy: forwards"));
    }

    #[test]
    fn text_report_marks_the_winner() {
        let report = Report::new(outcome(1.5), run(), 50.0);
        let text = report.render_text();
        assert!(text.contains("greedy: forwards"));
        assert!(text.contains("<- best"));
        assert!(text.contains("80.0%"));
    }
}
