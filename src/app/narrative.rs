use crate::{
    app::gold_run::{
        GoldRunResult,
        GoldStage,
    },
    slots::JACKPOT,
};
use itertools::Itertools;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub text: String,
    pub reply_to: Option<i64>,
}

fn victory_hashtags(outcome: u8) -> Vec<&'static str> {
    let mut hashtags = Vec::new();
    if outcome == JACKPOT {
        hashtags.extend(["#gloriousFiveDeluxe", "#suckItSteffen"]);
    } else {
        hashtags.push("#gloriousFive");
    }
    if outcome != 1 && outcome != JACKPOT {
        hashtags.extend([
            "#notSoGlorious",
            "#cheapVictory",
            "#fuckFruitsButNotInASexualWay",
        ]);
    }
    hashtags
}

fn defeat_text(stage: GoldStage) -> &'static str {
    match stage {
        GoldStage::Bowling => "#sad #fuckBowling",
        GoldStage::Dart => "#sad #tooSoberForDarts",
        GoldStage::Football => {
            "#sad #lionelMessiWhoDisIPreferLionelRichieAmirite #allNightLong"
        }
        GoldStage::Basketball | GoldStage::Won => "#sad #everythingButNet",
    }
}

/// What to post after a gold run triggered by the slot machine `outcome`.
pub fn gold_run_narrative(result: &GoldRunResult, outcome: u8) -> Narrative {
    if result.is_won() {
        return Narrative {
            text: format!("Fuck yeah! {}", victory_hashtags(outcome).iter().join(" ")),
            reply_to: result.last_message_id,
        };
    }
    if result.abandoned {
        return Narrative {
            text: "I got bored".to_string(),
            reply_to: None,
        };
    }
    // a throw lost to the transport still counts as a miss, just without a reply
    Narrative {
        text: defeat_text(result.stage).to_string(),
        reply_to: result.last_message_id,
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn gold_run_narrative__jackpot_win__is_deluxe() {
        let result = GoldRunResult {
            stage: GoldStage::Won,
            last_message_id: Some(9),
            abandoned: false,
        };

        let narrative = gold_run_narrative(&result, JACKPOT);

        assert_eq!(
            narrative,
            Narrative {
                text: "Fuck yeah! #gloriousFiveDeluxe #suckItSteffen".to_string(),
                reply_to: Some(9),
            }
        );
    }

    #[test]
    fn gold_run_narrative__fruit_win__is_not_so_glorious() {
        let result = GoldRunResult {
            stage: GoldStage::Won,
            last_message_id: Some(9),
            abandoned: false,
        };

        let narrative = gold_run_narrative(&result, 22);

        assert_eq!(
            narrative.text,
            "Fuck yeah! #gloriousFive #notSoGlorious #cheapVictory #fuckFruitsButNotInASexualWay"
        );
    }

    #[test]
    fn gold_run_narrative__bar_win__is_plain_glorious() {
        let result = GoldRunResult {
            stage: GoldStage::Won,
            last_message_id: Some(9),
            abandoned: false,
        };

        let narrative = gold_run_narrative(&result, 1);

        assert_eq!(narrative.text, "Fuck yeah! #gloriousFive");
    }

    #[test]
    fn gold_run_narrative__missed_dart__replies_to_the_dart() {
        let result = GoldRunResult {
            stage: GoldStage::Dart,
            last_message_id: Some(12),
            abandoned: false,
        };

        let narrative = gold_run_narrative(&result, JACKPOT);

        assert_eq!(narrative.text, "#sad #tooSoberForDarts");
        assert_eq!(narrative.reply_to, Some(12));
    }

    #[test]
    fn gold_run_narrative__failed_throw__is_a_defeat_without_reply() {
        let result = GoldRunResult {
            stage: GoldStage::Bowling,
            last_message_id: None,
            abandoned: false,
        };

        let narrative = gold_run_narrative(&result, JACKPOT);

        assert_eq!(
            narrative,
            Narrative {
                text: "#sad #fuckBowling".to_string(),
                reply_to: None,
            }
        );
    }

    #[test]
    fn gold_run_narrative__abandoned__got_bored() {
        let result = GoldRunResult {
            stage: GoldStage::Football,
            last_message_id: None,
            abandoned: true,
        };

        let narrative = gold_run_narrative(&result, JACKPOT);

        assert_eq!(narrative.text, "I got bored");
        assert_eq!(narrative.reply_to, None);
    }
}
