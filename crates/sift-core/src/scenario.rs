//! Canned retail-insight scenario.
//!
//! Content for the simulated demo turn: the reasoning log, intro reply,
//! workflow steps, and the final report. The schedule is fixed per turn;
//! only the timing knobs in [`crate::config::TimingConfig`] vary.

use crate::turn::engine::TurnScript;
use crate::turn::workflow::{BrandRow, FinalReport, Step, StepKind};

/// Greeting shown before the first user message.
pub const WELCOME_TEXT: &str = "Hi, I'm Sift, your retail data analyst. \
Ask me about category performance, inventory health, or brand trends, \
or pick one of the suggestions below.";

/// Prompts offered on the welcome message, selectable with keys 1-4.
pub const QUICK_ACTIONS: [&str; 4] = [
    "Analyze beverage category month-over-month performance",
    "Which SKUs are at risk of stocking out this week?",
    "Compare brand A and brand B promotion lift",
    "Summarize slow movers in the snacks category",
];

/// Placeholder for the input box.
pub const INPUT_PLACEHOLDER: &str = "Describe what you want to analyze...";

const THINKING_LOG: &str = "Intent: data insight analysis\n\
Entities:\n\
- category: beverages\n\
- dimensions: month-over-month, trend, brand strategy\n\
Matching against workflow library...\n\
Matched \"Data_Insight_Pro_V2\", starting execution.";

const INTRO_REPLY: &str =
    "Got it. I'll pull the latest data and generate the month-over-month analysis for you.";

/// Builds the script for one demo turn.
///
/// The steps and their durations define the workflow pacing; see
/// [`crate::turn::workflow::run_steps`] for how they execute.
pub fn demo_turn() -> TurnScript {
    TurnScript {
        thinking: THINKING_LOG.to_string(),
        reply: INTRO_REPLY.to_string(),
        steps: vec![
            Step::new(
                StepKind::Plan,
                "Decompose task",
                "Split into: SKU sell-through, inventory turnover, replenishment advice",
                2500,
            ),
            Step::new(
                StepKind::File,
                "Generate query",
                "src/queries/inventory_turnover.sql",
                4500,
            ),
            Step::new(
                StepKind::Action,
                "Query data",
                "Executing SQL against ERP_DB_V2 (read-only)...",
                3500,
            ),
            Step::new(
                StepKind::Action,
                "Aggregate records",
                "Aggregating 45,120 transaction rows...",
                3000,
            ),
            Step::new(
                StepKind::Thought,
                "Summarize findings",
                "Stock-out risk is concentrated in east-region class A stores; \
                 a transfer should start this week.",
                2000,
            ),
        ],
        report: demo_report(),
    }
}

fn demo_report() -> FinalReport {
    FinalReport {
        title: "Beverage category (Jan 2026 vs Dec 2025): month-over-month and trend analysis"
            .to_string(),
        overview: vec![
            "Traffic is flat: exposure +0.84% MoM, clicks +1.37%, so overall reach is stable"
                .to_string(),
            "Conversion is clearly up: click conversion rose from 7.92% to 8.56% (+0.64pct)"
                .to_string(),
            "Sell-through sits at only 38.70%; tail SKUs are wasting shelf and traffic"
                .to_string(),
        ],
        brands: vec![
            BrandRow {
                brand: "Brand A".to_string(),
                strategy: "Hit-product dependent".to_string(),
                sell_through: "76.00%".to_string(),
                top3_share: "58.00%".to_string(),
                price_band: "18.0-22.0".to_string(),
                conversion: "12.40%".to_string(),
            },
            BrandRow {
                brand: "Brand B".to_string(),
                strategy: "Broad assortment".to_string(),
                sell_through: "29.00%".to_string(),
                top3_share: "21.00%".to_string(),
                price_band: "9.0-35.0".to_string(),
                conversion: "6.80%".to_string(),
            },
            BrandRow {
                brand: "Brand C".to_string(),
                strategy: "Emerging challenger".to_string(),
                sell_through: "51.00%".to_string(),
                top3_share: "39.00%".to_string(),
                price_band: "22.0-25.0".to_string(),
                conversion: "11.70%".to_string(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::workflow::StepStatus;

    #[test]
    fn demo_turn_is_well_formed() {
        let script = demo_turn();
        assert!(!script.thinking.is_empty());
        assert!(!script.reply.is_empty());
        assert_eq!(script.steps.len(), 5);
        assert!(script.steps.iter().all(|s| s.status == StepStatus::Pending));
        assert_eq!(script.report.brands.len(), 3);
    }
}
