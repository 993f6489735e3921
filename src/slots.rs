use crate::{
    Error,
    Result,
};
use itertools::Itertools;
use std::fmt;

/// Number of distinct slot machine outcomes reported by the remote.
pub const OUTCOME_COUNT: usize = 64;

/// Outcome code of three sevens, the jackpot.
pub const JACKPOT: u8 = 64;

#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Bar,
    Grape,
    Lemon,
    Seven,
}

/// Ordered left to right.
pub type Reels = [Symbol; 3];

// Order matters: the position of a symbol is its digit in the outcome encoding.
const SYMBOL_NAMES: [(Symbol, &str); 4] = [
    (Symbol::Bar, "BAR"),
    (Symbol::Grape, "GRAPE"),
    (Symbol::Lemon, "LEMON"),
    (Symbol::Seven, "SEVEN"),
];

/// Reels of outcome `n` live at index `n - 1`.
pub static OUTCOME_TABLE: [Reels; OUTCOME_COUNT] = build_outcome_table();

const fn build_outcome_table() -> [Reels; OUTCOME_COUNT] {
    let mut table = [[Symbol::Bar; 3]; OUTCOME_COUNT];
    let mut index = 0;
    while index < OUTCOME_COUNT {
        table[index] = [
            SYMBOL_NAMES[index % 4].0,
            SYMBOL_NAMES[(index / 4) % 4].0,
            SYMBOL_NAMES[(index / 16) % 4].0,
        ];
        index += 1;
    }
    table
}

impl Symbol {
    pub const ALL: [Symbol; 4] = [Symbol::Bar, Symbol::Grape, Symbol::Lemon, Symbol::Seven];

    pub fn name(self) -> &'static str {
        SYMBOL_NAMES[self.digit()].1
    }

    pub fn from_name(name: &str) -> Option<Symbol> {
        SYMBOL_NAMES
            .iter()
            .find(|(_, known)| *known == name)
            .map(|(symbol, _)| *symbol)
    }

    fn digit(self) -> usize {
        match self {
            Symbol::Bar => 0,
            Symbol::Grape => 1,
            Symbol::Lemon => 2,
            Symbol::Seven => 3,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Symbol::from_name(&s.to_ascii_uppercase())
            .ok_or_else(|| Error::Format(format!("unknown symbol: {s}")))
    }
}

/// Resolve an outcome code into the reels it shows.
pub fn decode(outcome: u8) -> Result<Reels> {
    let index = usize::from(outcome)
        .checked_sub(1)
        .filter(|index| *index < OUTCOME_COUNT)
        .ok_or(Error::InvalidOutcome(outcome))?;
    Ok(OUTCOME_TABLE[index])
}

pub fn encode(reels: Reels) -> u8 {
    let [first, second, third] = reels.map(Symbol::digit);
    // at most 63, always fits
    (first + second * 4 + third * 16 + 1) as u8
}

pub fn describe(reels: &Reels) -> String {
    reels.iter().map(|symbol| symbol.name()).join(", ")
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::collections::HashSet;

    #[test]
    fn decode__every_outcome__round_trips_through_encode() {
        for outcome in 1..=64u8 {
            let reels = decode(outcome).unwrap();
            assert_eq!(encode(reels), outcome);
        }
    }

    #[test]
    fn decode__all_outcomes__cover_every_combination_once() {
        let seen: HashSet<Reels> = (1..=64u8).map(|o| decode(o).unwrap()).collect();
        assert_eq!(seen.len(), OUTCOME_COUNT);
    }

    #[test]
    fn decode__known_outcomes__match_the_remote_layout() {
        assert_eq!(decode(1).unwrap(), [Symbol::Bar; 3]);
        assert_eq!(
            decode(2).unwrap(),
            [Symbol::Grape, Symbol::Bar, Symbol::Bar]
        );
        assert_eq!(
            decode(17).unwrap(),
            [Symbol::Bar, Symbol::Bar, Symbol::Grape]
        );
        assert_eq!(decode(22).unwrap(), [Symbol::Grape; 3]);
        assert_eq!(decode(43).unwrap(), [Symbol::Lemon; 3]);
        assert_eq!(decode(JACKPOT).unwrap(), [Symbol::Seven; 3]);
    }

    #[test]
    fn decode__out_of_range__is_invalid_outcome() {
        assert!(matches!(decode(0), Err(Error::InvalidOutcome(0))));
        assert!(matches!(decode(65), Err(Error::InvalidOutcome(65))));
    }

    #[test]
    fn from_name__every_symbol__round_trips() {
        for symbol in Symbol::ALL {
            assert_eq!(Symbol::from_name(symbol.name()), Some(symbol));
        }
        assert_eq!(Symbol::from_name("CHERRY"), None);
    }

    #[test]
    fn from_str__lowercase_name__is_accepted() {
        let parsed: Symbol = "lemon".parse().unwrap();
        assert_eq!(parsed, Symbol::Lemon);
    }

    #[test]
    fn describe__reels__joins_names_in_order() {
        let reels = [Symbol::Seven, Symbol::Bar, Symbol::Lemon];
        assert_eq!(describe(&reels), "SEVEN, BAR, LEMON");
    }
}
