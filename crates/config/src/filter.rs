use serde::{Deserialize, Serialize};

/// Queue identifier of ranked matches.
pub const RANKED_QUEUE_ID: u32 = 1100;

/// Rounds in which nobody fights another player: carousels and PVE rounds.
pub const NON_COMBAT_ROUNDS: [u32; 12] = [11, 15, 18, 22, 25, 29, 32, 36, 39, 43, 46, 50];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Filter {
    /// Only matches played in this queue are analysed. The default is the
    /// ranked queue.
    pub queue_id: u32,

    /// Minimum number of units a participant must have fielded when the game
    /// ended for that participant.
    ///
    /// ## Note
    ///
    /// This is a heuristic to leave out players that were away from keyboard
    /// for most of the match. Setting it to 0 disables the check.
    pub min_units: usize,

    /// Participants whose game ended in one of these rounds are left out of
    /// the analysis.
    ///
    /// In carousel and PVE rounds nobody fights another player, so being
    /// eliminated there usually means the player forfeited or sold their
    /// board. Those outcomes say nothing about the champions on the board.
    ///
    /// ## Note
    ///
    /// Round numbering depends on the game set. The default matches the
    /// numbering of the sets the analysis was written for.
    pub excluded_rounds: Vec<u32>,

    /// Delimiter of the composite unit identifier. The champion name is the
    /// segment after the last delimiter, e.g. `TFT3_Ashe` becomes `Ashe`.
    pub unit_delimiter: char,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            queue_id: RANKED_QUEUE_ID,
            min_units: 6,
            excluded_rounds: NON_COMBAT_ROUNDS.to_vec(),
            unit_delimiter: '_',
        }
    }
}

impl Filter {
    pub fn is_excluded_round(&self, round: u32) -> bool {
        self.excluded_rounds.binary_search(&round).is_ok()
    }

    /// Sort and deduplicate the excluded rounds, which
    /// [`Filter::is_excluded_round`] relies on.
    pub fn normalize(&mut self) {
        self.excluded_rounds.sort_unstable();
        self.excluded_rounds.dedup();
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }
}
