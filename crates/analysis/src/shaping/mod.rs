#![forbid(unsafe_code)]

//! Selection and projection of match participants.
//!
//! A [`ShapeSpec`] is the query the source runs: which matches and
//! participants qualify, and how their units are reduced to champion names.
//! Every participant that is checked produces exactly one
//! [`ShapeOutcome`], so rejections can be counted.

use crate::domain::{ChampionKey, ShapedRecord};
use crate::error::Error;
use crate::source::{Document, MatchDocument, Participant};
use config::{Config, Filter};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Field that was missing or out of range in a rejected record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MalformedField {
    /// The document itself could not be decoded.
    Document,
    Info,
    QueueId,
    Units,
    CharacterId,
    LastRound,
    Placement,
}

impl fmt::Display for MalformedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MalformedField::Document => "document",
            MalformedField::Info => "info",
            MalformedField::QueueId => "queue_id",
            MalformedField::Units => "units",
            MalformedField::CharacterId => "character_id",
            MalformedField::LastRound => "last_round",
            MalformedField::Placement => "placement",
        };
        f.write_str(name)
    }
}

/// Why a record did not reach the fold.
///
/// `WrongQueue` and match-level `Malformed` reasons are reported once per
/// match; every other reason once per participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectReason {
    WrongQueue,
    TooFewUnits,
    ExcludedRound,
    Malformed(MalformedField),
}

impl RejectReason {
    pub fn is_malformed(&self) -> bool {
        matches!(self, RejectReason::Malformed(_))
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::WrongQueue => f.write_str("wrong_queue"),
            RejectReason::TooFewUnits => f.write_str("too_few_units"),
            RejectReason::ExcludedRound => f.write_str("excluded_round"),
            RejectReason::Malformed(field) => write!(f, "malformed_{field}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeOutcome {
    Accept(ShapedRecord),
    Reject(RejectReason),
}

/// Return the champion name of a composite unit identifier: the segment after
/// the last `delimiter`. An identifier without the delimiter is returned as is.
pub fn champion_name(raw: &str, delimiter: char) -> &str {
    raw.rsplit_once(delimiter).map_or(raw, |(_, name)| name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeSpec {
    /// Normalized, so [`Filter::is_excluded_round`] can be used directly.
    pub filter: Filter,
    /// Maximum number of ranked matches read from the source. Matches of
    /// other queues and undecodable documents do not count.
    pub limit: Option<u64>,
}

impl Default for ShapeSpec {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ShapeSpec {
    pub fn from_config(config: &Config) -> Self {
        Self {
            filter: config.filter.clone().normalized(),
            limit: config.source.limit,
        }
    }

    /// Apply the match-level filters and return the participants of a
    /// qualifying match.
    pub fn admit_match<'d>(
        &self,
        document: &'d MatchDocument,
    ) -> Result<&'d [Participant], RejectReason> {
        let info = document
            .info
            .as_ref()
            .ok_or(RejectReason::Malformed(MalformedField::Info))?;
        match info.queue_id {
            None => Err(RejectReason::Malformed(MalformedField::QueueId)),
            Some(queue_id) if queue_id != self.filter.queue_id => Err(RejectReason::WrongQueue),
            Some(_) => Ok(info.participants.as_slice()),
        }
    }

    /// Filter a match by queue, then unwind it into one outcome per
    /// participant.
    pub fn shape_match(&self, document: &MatchDocument) -> Vec<ShapeOutcome> {
        match self.admit_match(document) {
            Ok(participants) => self.shape_participants(document, participants).collect(),
            Err(reason) => vec![ShapeOutcome::Reject(reason)],
        }
    }

    fn shape_participants<'s>(
        &'s self,
        document: &'s MatchDocument,
        participants: &'s [Participant],
    ) -> impl Iterator<Item = ShapeOutcome> + 's {
        participants
            .iter()
            .map(move |participant| match self.shape_participant(participant) {
                Ok(record) => ShapeOutcome::Accept(record),
                Err(reason) => {
                    if reason.is_malformed() {
                        warn!(match_id = document.match_id(), %reason, "skipping participant");
                    } else {
                        trace!(match_id = document.match_id(), %reason, "participant filtered");
                    }
                    ShapeOutcome::Reject(reason)
                }
            })
    }

    /// Apply the participant-level filters and project the record.
    pub fn shape_participant(&self, participant: &Participant) -> Result<ShapedRecord, RejectReason> {
        let units = participant
            .units
            .as_ref()
            .ok_or(RejectReason::Malformed(MalformedField::Units))?;
        let num_units = units.len();
        if num_units < self.filter.min_units {
            return Err(RejectReason::TooFewUnits);
        }

        let last_round = participant
            .last_round
            .ok_or(RejectReason::Malformed(MalformedField::LastRound))?;
        if self.filter.is_excluded_round(last_round) {
            return Err(RejectReason::ExcludedRound);
        }

        let units = units
            .iter()
            .map(|unit| {
                unit.character_id
                    .as_deref()
                    .map(|id| Arc::from(champion_name(id, self.filter.unit_delimiter)))
                    .ok_or(RejectReason::Malformed(MalformedField::CharacterId))
            })
            .collect::<Result<Vec<Arc<str>>, _>>()?;
        if units.iter().any(|name| ChampionKey::shadows_rollup(name)) {
            warn!(
                last_round,
                "champion named `{}` is written under the same key as the rollup",
                ChampionKey::Total
            );
        }

        let placement = participant
            .placement
            .filter(|placement| (1..=8).contains(placement))
            .ok_or(RejectReason::Malformed(MalformedField::Placement))?;

        Ok(ShapedRecord {
            num_units,
            units,
            last_round,
            placement,
        })
    }

    /// Lazily shape a stream of documents, honouring the match limit.
    pub fn stream<I>(&self, documents: I) -> Shaped<'_, I>
    where
        I: Iterator<Item = Result<Document, Error>>,
    {
        Shaped {
            documents,
            spec: self,
            pending: VecDeque::new(),
            taken: 0,
        }
    }
}

/// Iterator returned by [`ShapeSpec::stream`]. Holds at most one match worth
/// of outcomes in memory.
pub struct Shaped<'a, I> {
    documents: I,
    spec: &'a ShapeSpec,
    pending: VecDeque<ShapeOutcome>,
    /// Ranked matches admitted so far.
    taken: u64,
}

impl<I> Iterator for Shaped<'_, I>
where
    I: Iterator<Item = Result<Document, Error>>,
{
    type Item = Result<ShapeOutcome, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(outcome) = self.pending.pop_front() {
                return Some(Ok(outcome));
            }
            if self.spec.limit.is_some_and(|limit| self.taken >= limit) {
                return None;
            }
            let document = match self.documents.next()? {
                Ok(document) => document,
                Err(err) => return Some(Err(err)),
            };
            match document {
                Document::Parsed(document) => match self.spec.admit_match(&document) {
                    Ok(participants) => {
                        self.taken += 1;
                        self.pending
                            .extend(self.spec.shape_participants(&document, participants));
                    }
                    Err(reason) => {
                        if reason.is_malformed() {
                            warn!(match_id = document.match_id(), %reason, "skipping match");
                        } else {
                            trace!(match_id = document.match_id(), %reason, "match filtered");
                        }
                        return Some(Ok(ShapeOutcome::Reject(reason)));
                    }
                },
                Document::Undecodable { origin, reason } => {
                    warn!(%origin, %reason, "skipping undecodable match document");
                    return Some(Ok(ShapeOutcome::Reject(RejectReason::Malformed(
                        MalformedField::Document,
                    ))));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Unit;
    use proptest::prelude::*;

    const SIX: [&str; 6] = [
        "TFT3_Ashe",
        "TFT3_Jinx",
        "TFT3_Xayah",
        "TFT3_Rakan",
        "TFT3_Lux",
        "TFT3_Ezreal",
    ];

    #[test]
    fn champion_name_takes_last_segment() {
        assert_eq!(champion_name("TFT3_Ashe", '_'), "Ashe");
        assert_eq!(champion_name("TFT3b_Set_Jinx", '_'), "Jinx");
        assert_eq!(champion_name("Ashe", '_'), "Ashe");
        assert_eq!(champion_name("TFT3_", '_'), "");
        assert_eq!(champion_name("", '_'), "");
    }

    #[test]
    fn accepts_ranked_participant() {
        let spec = ShapeSpec::default();
        let record = spec
            .shape_participant(&Participant::new(20, 3, SIX))
            .unwrap();
        assert_eq!(record.num_units, 6);
        assert_eq!(record.last_round, 20);
        assert_eq!(record.placement, 3);
        assert_eq!(&*record.units[0], "Ashe");
        assert_eq!(&*record.units[5], "Ezreal");
    }

    #[test]
    fn filters_in_order() {
        let spec = ShapeSpec::default();
        assert_eq!(
            spec.shape_participant(&Participant::new(20, 3, SIX[..5].iter().copied())),
            Err(RejectReason::TooFewUnits)
        );
        assert_eq!(
            spec.shape_participant(&Participant::new(15, 3, SIX)),
            Err(RejectReason::ExcludedRound)
        );
        assert_eq!(
            spec.shape_participant(&Participant::new(20, 9, SIX)),
            Err(RejectReason::Malformed(MalformedField::Placement))
        );

        let mut missing_id = Participant::new(20, 3, SIX);
        if let Some(units) = missing_id.units.as_mut() {
            units.push(Unit { character_id: None });
        }
        assert_eq!(
            spec.shape_participant(&missing_id),
            Err(RejectReason::Malformed(MalformedField::CharacterId))
        );

        let no_round = Participant {
            last_round: None,
            ..Participant::new(20, 3, SIX)
        };
        assert_eq!(
            spec.shape_participant(&no_round),
            Err(RejectReason::Malformed(MalformedField::LastRound))
        );
    }

    #[test]
    fn non_ranked_match_is_rejected_once() {
        let spec = ShapeSpec::default();
        let doc = MatchDocument::new(1090, vec![Participant::new(20, 1, SIX); 8]);
        assert_eq!(
            spec.shape_match(&doc),
            vec![ShapeOutcome::Reject(RejectReason::WrongQueue)]
        );
    }

    #[test]
    fn unwinds_one_outcome_per_participant() {
        let spec = ShapeSpec::default();
        let doc = MatchDocument::new(
            1100,
            vec![
                Participant::new(20, 1, SIX),
                Participant::new(11, 8, SIX),
                Participant::new(30, 2, SIX),
            ],
        );
        let outcomes = spec.shape_match(&doc);
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], ShapeOutcome::Accept(_)));
        assert_eq!(outcomes[1], ShapeOutcome::Reject(RejectReason::ExcludedRound));
        assert!(matches!(outcomes[2], ShapeOutcome::Accept(_)));
    }

    #[test]
    fn stream_passes_errors_through() {
        let failing = vec![Err(Error::NoInput("nothing".into()))];
        let spec = ShapeSpec::default();
        let mut stream = spec.stream(failing.into_iter());
        assert!(matches!(stream.next(), Some(Err(Error::NoInput(_)))));
        assert!(stream.next().is_none());
    }

    #[test]
    fn limit_counts_ranked_matches_only() {
        let spec = ShapeSpec {
            limit: Some(2),
            ..Default::default()
        };
        let ranked = MatchDocument::new(1100, vec![Participant::new(20, 1, SIX); 2]);
        let normal = MatchDocument::new(1090, vec![Participant::new(20, 1, SIX); 8]);
        let documents = vec![
            Ok(Document::Parsed(normal.clone())),
            Ok(Document::Undecodable {
                origin: "x".into(),
                reason: "y".into(),
            }),
            Ok(Document::Parsed(ranked.clone())),
            Ok(Document::Parsed(normal)),
            Ok(Document::Parsed(ranked.clone())),
            Ok(Document::Parsed(ranked)),
        ];
        let outcomes: Vec<_> = spec
            .stream(documents.into_iter())
            .collect::<Result<_, _>>()
            .unwrap();

        // Two ranked matches, each with two participants; the third is never read.
        assert_eq!(outcomes.len(), 7);
        assert_eq!(outcomes[0], ShapeOutcome::Reject(RejectReason::WrongQueue));
        assert_eq!(
            outcomes[1],
            ShapeOutcome::Reject(RejectReason::Malformed(MalformedField::Document))
        );
        assert_eq!(outcomes[4], ShapeOutcome::Reject(RejectReason::WrongQueue));
        let accepted = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, ShapeOutcome::Accept(_)))
            .count();
        assert_eq!(accepted, 4);
    }

    #[test]
    fn limit_reaches_past_leading_non_ranked_match() {
        let spec = ShapeSpec {
            limit: Some(1),
            ..Default::default()
        };
        let documents = vec![
            Ok(Document::Parsed(MatchDocument::new(1090, vec![Participant::new(20, 1, SIX)]))),
            Ok(Document::Parsed(MatchDocument::new(1100, vec![Participant::new(20, 1, SIX)]))),
        ];
        let outcomes: Vec<_> = spec
            .stream(documents.into_iter())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(outcomes[0], ShapeOutcome::Reject(RejectReason::WrongQueue));
        assert!(matches!(outcomes[1], ShapeOutcome::Accept(_)));
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn mistyped_participant_is_skipped_alone() {
        let units = SIX
            .iter()
            .map(|id| format!(r#"{{"character_id": "{id}"}}"#))
            .collect::<Vec<_>>()
            .join(", ");
        let text = format!(
            r#"{{"info": {{"queue_id": 1100, "participants": [
                {{"last_round": 20, "placement": "2", "units": [{units}]}},
                {{"last_round": -4, "placement": 5, "units": [{units}]}},
                {{"last_round": 20, "placement": 3, "units": [{units}]}}
            ]}}}}"#
        );
        let documents = vec![Ok(Document::decode_str(&text, String::new))];
        let outcomes: Vec<_> = ShapeSpec::default()
            .stream(documents.into_iter())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes[0],
            ShapeOutcome::Reject(RejectReason::Malformed(MalformedField::Placement))
        );
        assert_eq!(
            outcomes[1],
            ShapeOutcome::Reject(RejectReason::Malformed(MalformedField::LastRound))
        );
        let ShapeOutcome::Accept(record) = &outcomes[2] else {
            panic!("well-formed participant should be accepted");
        };
        assert_eq!(record.placement, 3);
    }

    #[test]
    fn champion_named_total_is_kept_apart_from_rollup() {
        let mut board = SIX.to_vec();
        board[0] = "TFT9_total";
        let record = ShapeSpec::default()
            .shape_participant(&Participant::new(20, 1, board))
            .unwrap();
        assert_eq!(&*record.units[0], "total");
        assert!(ChampionKey::shadows_rollup(&record.units[0]));
        assert_ne!(ChampionKey::champion(record.units[0].clone()), ChampionKey::Total);
    }

    #[test]
    fn unsorted_configured_rounds_are_normalized() {
        let mut config = Config::default();
        config.filter.excluded_rounds = vec![30, 7, 30];
        let spec = ShapeSpec::from_config(&config);
        assert_eq!(spec.filter.excluded_rounds, vec![7, 30]);
        assert_eq!(
            spec.shape_participant(&Participant::new(7, 1, SIX)),
            Err(RejectReason::ExcludedRound)
        );
        assert!(spec.shape_participant(&Participant::new(15, 1, SIX)).is_ok());
    }

    proptest! {
        #[test]
        fn excluded_rounds_never_accepted(round in 0u32..80, placement in 1u32..=8) {
            let spec = ShapeSpec::default();
            let result = spec.shape_participant(&Participant::new(round, placement, SIX));
            if spec.filter.excluded_rounds.contains(&round) {
                prop_assert_eq!(result, Err(RejectReason::ExcludedRound));
            } else {
                prop_assert!(result.is_ok());
            }
        }

        #[test]
        fn champion_name_has_no_delimiter(raw in "[A-Za-z0-9_]{0,20}") {
            let name = champion_name(&raw, '_');
            prop_assert!(!name.contains('_'));
            prop_assert!(raw.ends_with(name));
        }
    }
}
