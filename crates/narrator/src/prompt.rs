use analytics::PeriodDigest;
use std::fmt::Display;

pub const SYSTEM_PROMPT: &str = "You are an elite trading performance coach. \
Provide weekly performance analysis in JSON only. Be direct, specific, and actionable.";

const RESPONSE_SHAPE: &str = r#"{
  "summary": "<2-3 sentence executive summary of the week>",
  "keyStrengths": ["<strength 1>", "<strength 2>"],
  "keyWeaknesses": ["<weakness 1>", "<weakness 2>"],
  "recommendations": ["<action 1>", "<action 2>", "<action 3>"],
  "focusForNextWeek": "<one clear focus for next week>",
  "disciplineScore": <number 0-100>,
  "consistencyScore": <number 0-100>,
  "psychologyRating": <"excellent"|"good"|"needs_work"|"poor">,
  "behavioralWarnings": ["<warning if any>"]
}"#;

/// Builds the user message for a period: the expected answer shape followed by
/// the period's numbers.
pub fn period_prompt(digest: &PeriodDigest) -> String {
    let mistakes = if digest.mistakes.is_empty() {
        "none".to_string()
    } else {
        digest
            .mistakes
            .iter()
            .map(|(tag, count)| format!("{tag} x{count}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "Generate a weekly trading performance report. Return JSON:\n{RESPONSE_SHAPE}\n\n\
         Weekly Stats:\n\
         - Total Trades: {} ({}W / {}L)\n\
         - Win Rate: {}%\n\
         - Total PnL: ${}\n\
         - Avg R-Multiple: {}\n\
         - Best Trade: ${}\n\
         - Worst Trade: ${}\n\
         - Strategies Used: {}\n\
         - Sessions Traded: {}\n\
         - Mistakes Tagged: {}\n\
         - Emotions Before Trading: {}",
        digest.total_trades,
        digest.win_count,
        digest.loss_count,
        digest.win_rate,
        digest.total_pnl,
        digest.avg_r_multiple,
        digest.best_trade,
        digest.worst_trade,
        join(&digest.strategies),
        join(&digest.sessions),
        mistakes,
        join(&digest.emotions),
    )
}

fn join<T: Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{EmotionBefore, MistakeTag, Session, Strategy};
    use rust_decimal_macros::dec;

    fn digest() -> PeriodDigest {
        PeriodDigest {
            total_trades: 3,
            win_count: 2,
            loss_count: 1,
            win_rate: dec!(66.7),
            total_pnl: dec!(125.50),
            avg_r_multiple: dec!(1.25),
            best_trade: dec!(100),
            worst_trade: dec!(-40),
            mistakes: vec![(MistakeTag::FomoEntry, 2), (MistakeTag::MovedStop, 1)],
            strategies: vec![Strategy::Breakout],
            sessions: vec![Session::London, Session::NewYork],
            emotions: vec![EmotionBefore::Confident, EmotionBefore::Fomo],
        }
    }

    #[test]
    fn prompt_carries_the_numbers() {
        let prompt = period_prompt(&digest());
        assert!(prompt.contains("Total Trades: 3 (2W / 1L)"));
        assert!(prompt.contains("Win Rate: 66.7%"));
        assert!(prompt.contains("Total PnL: $125.50"));
        assert!(prompt.contains("Mistakes Tagged: FOMO Entry x2, Moved Stop x1"));
        assert!(prompt.contains("Emotions Before Trading: Confident, FOMO"));
        assert!(prompt.contains("\"focusForNextWeek\""));
    }

    #[test]
    fn empty_lists_read_as_none() {
        let quiet = PeriodDigest {
            mistakes: Vec::new(),
            strategies: Vec::new(),
            ..digest()
        };
        let prompt = period_prompt(&quiet);
        assert!(prompt.contains("Mistakes Tagged: none"));
        assert!(prompt.contains("Strategies Used: none"));
    }
}
