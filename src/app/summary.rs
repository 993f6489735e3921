use crate::{
    history::HistoryCounts,
    slots::{
        self,
        Reels,
        Symbol,
    },
};
use std::fmt;

/// How many outcomes each of the most/least common lists shows.
pub const EXTREME_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeLine {
    pub outcome: u8,
    pub reels: Reels,
    pub occurrences: u64,
}

/// Everything the `/summary` digest shows, read from one consistent snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total: u64,
    pub self_triggered: u64,
    pub by_symbol: Vec<(Symbol, u64)>,
    pub most_common: Vec<OutcomeLine>,
    pub least_common: Vec<OutcomeLine>,
}

impl Summary {
    pub fn collect(counts: &HistoryCounts) -> Self {
        let lines = |top: bool| -> Vec<OutcomeLine> {
            counts
                .extreme_outcomes(top, EXTREME_COUNT)
                .into_iter()
                .map(|outcome| {
                    let index = usize::from(outcome) - 1;
                    OutcomeLine {
                        outcome,
                        reels: slots::OUTCOME_TABLE[index],
                        occurrences: counts.by_outcome[index],
                    }
                })
                .collect()
        };
        Self {
            total: counts.total,
            self_triggered: counts.self_triggered,
            by_symbol: Symbol::ALL
                .into_iter()
                .map(|symbol| (symbol, counts.symbol_count(symbol)))
                .collect(),
            most_common: lines(true),
            least_common: lines(false),
        }
    }
}

fn write_lines(f: &mut fmt::Formatter<'_>, lines: &[OutcomeLine]) -> fmt::Result {
    for line in lines {
        write!(
            f,
            "\n- {}x {}",
            line.occurrences,
            slots::describe(&line.reels)
        )?;
    }
    Ok(())
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handled {} slot machine results, more than {} of which I triggered with my own two hands!\n",
            self.total, self.self_triggered
        )?;
        for (symbol, count) in &self.by_symbol {
            write!(f, "\n{symbol}: {count}")?;
        }
        f.write_str("\n\nMost common results:")?;
        write_lines(f, &self.most_common)?;
        f.write_str("\n\nLeast common results:")?;
        write_lines(f, &self.least_common)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::history::History;

    #[test]
    fn collect__recorded_outcomes__lists_extremes_with_reels() {
        // given
        let history = History::new();
        for outcome in [64, 64, 64, 43, 43, 1] {
            history.record(outcome).unwrap();
        }
        history.record_self_triggered();

        // when
        let summary = Summary::collect(&history.counts());

        // then
        assert_eq!(summary.total, 6);
        assert_eq!(summary.self_triggered, 1);
        assert_eq!(
            summary.most_common[0],
            OutcomeLine {
                outcome: 64,
                reels: [Symbol::Seven; 3],
                occurrences: 3,
            }
        );
        assert_eq!(summary.most_common[1].outcome, 43);
        assert_eq!(summary.most_common[2].outcome, 1);
        assert_eq!(summary.least_common.len(), EXTREME_COUNT);
        assert_eq!(summary.least_common[0].outcome, 2);
        assert_eq!(
            summary.by_symbol,
            vec![
                (Symbol::Bar, 3),
                (Symbol::Grape, 0),
                (Symbol::Lemon, 6),
                (Symbol::Seven, 9),
            ]
        );
    }

    #[test]
    fn collect__empty_history__lists_every_extreme_line() {
        let summary = Summary::collect(&History::new().counts());

        assert_eq!(summary.most_common.len(), EXTREME_COUNT);
        assert_eq!(summary.least_common.len(), EXTREME_COUNT);
        assert_eq!(
            summary.least_common[4],
            OutcomeLine {
                outcome: 5,
                reels: [Symbol::Grape, Symbol::Grape, Symbol::Bar],
                occurrences: 0,
            }
        );
    }

    #[test]
    fn to_string__renders_the_digest_layout() {
        // given
        let history = History::new();
        history.record(64).unwrap();
        let summary = Summary::collect(&history.counts());

        // when
        let text = summary.to_string();

        // then
        let expected_head = "Handled 1 slot machine results, more than 0 of which I triggered with my own two hands!\n\
             \nBAR: 0\nGRAPE: 0\nLEMON: 0\nSEVEN: 3\
             \n\nMost common results:\n- 1x SEVEN, SEVEN, SEVEN\n- 0x BAR, BAR, BAR";
        assert!(text.starts_with(expected_head), "{text}");
        assert!(text.contains("\n\nLeast common results:\n- 0x BAR, BAR, BAR"));
        assert_eq!(text.lines().filter(|line| line.starts_with("- ")).count(), 10);
    }
}
