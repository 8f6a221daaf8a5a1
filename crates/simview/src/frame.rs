//! Frame assembly: turns the unbounded line stream into snapshots.
//!
//! Records accumulate until an `END` line closes the frame. Only then is a
//! [`Snapshot`] built, so a frame cut short by a disconnect never becomes
//! visible. `CONFIG` lines bypass the frame entirely and take effect at
//! once.

use simview_core::{Agent, GridConfig, Place, Snapshot, StatsSummary};
use simview_protocol::{decode, DecodeError, Record};

/// Outcome of feeding one line to the assembler.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// Record added to the frame in progress.
    Buffered,

    /// Grid size changed; not part of any frame.
    Grid(GridConfig),

    /// `END` received; the completed frame.
    Complete(Snapshot),

    /// Line could not be decoded and was dropped. The frame continues.
    Rejected(DecodeError),
}

/// Accumulates the records of the frame in progress.
#[derive(Debug)]
pub struct FrameAssembler {
    agents: Vec<Agent>,
    places: Vec<Place>,
    stats: Option<StatsSummary>,
    /// Sequence number the next completed frame receives
    next_sequence: u64,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            places: Vec::new(),
            stats: None,
            next_sequence: 1,
        }
    }

    /// Decodes and applies one line.
    ///
    /// A malformed `STATS` line also clears any statistics already buffered
    /// for this frame: the frame is then published without statistics.
    pub fn push_line(&mut self, line: &str) -> FrameEvent {
        match decode(line) {
            Ok(record) => self.push_record(record),
            Err(error) => {
                if error.kind() == Some("STATS") {
                    self.stats = None;
                }
                FrameEvent::Rejected(error)
            }
        }
    }

    /// Applies one decoded record.
    pub fn push_record(&mut self, record: Record) -> FrameEvent {
        match record {
            Record::Config(grid) => FrameEvent::Grid(grid),
            Record::Agent(agent) => {
                self.agents.push(agent);
                FrameEvent::Buffered
            }
            Record::Place(place) => {
                self.places.push(place);
                FrameEvent::Buffered
            }
            Record::Stats(stats) => {
                self.stats = Some(stats);
                FrameEvent::Buffered
            }
            Record::End => FrameEvent::Complete(self.complete()),
        }
    }

    /// Drops the frame in progress without building a snapshot.
    ///
    /// Returns the number of records discarded. Sequence numbering is not
    /// affected.
    pub fn discard_partial(&mut self) -> usize {
        let discarded = self.pending_records();
        self.agents.clear();
        self.places.clear();
        self.stats = None;
        discarded
    }

    /// Number of records buffered for the frame in progress.
    pub fn pending_records(&self) -> usize {
        self.agents.len() + self.places.len() + usize::from(self.stats.is_some())
    }

    /// Sequence number of the last completed frame, 0 if none.
    pub fn last_sequence(&self) -> u64 {
        self.next_sequence.saturating_sub(1)
    }

    fn complete(&mut self) -> Snapshot {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        Snapshot::new(
            sequence,
            std::mem::take(&mut self.agents),
            std::mem::take(&mut self.places),
            self.stats.take(),
        )
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simview_core::PlaceKind;

    fn feed(assembler: &mut FrameAssembler, lines: &[&str]) -> Vec<FrameEvent> {
        lines.iter().map(|line| assembler.push_line(line)).collect()
    }

    fn completed(events: Vec<FrameEvent>) -> Vec<Snapshot> {
        events
            .into_iter()
            .filter_map(|event| match event {
                FrameEvent::Complete(snapshot) => Some(snapshot),
                _ => None,
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Complete Frames
    // ------------------------------------------------------------------------

    #[test]
    fn test_full_frame() {
        let mut assembler = FrameAssembler::new();
        let events = feed(
            &mut assembler,
            &[
                "AGENT;Alice;1;1;50;10;100;Sain;0.0",
                "MAISON;2;2;1",
                "STATS;50;10;100;1;0;0",
                "END",
            ],
        );

        let snapshots = completed(events);
        assert_eq!(snapshots.len(), 1);
        let snapshot = snapshots.first().unwrap();

        assert_eq!(snapshot.sequence(), 1);
        assert_eq!(snapshot.agents().len(), 1);
        let alice = snapshot.agent("Alice").unwrap();
        assert_eq!((alice.energy, alice.stress, alice.money), (50.0, 10.0, 100.0));

        assert_eq!(snapshot.places(), &[Place::new(PlaceKind::House, 2, 2, true)]);

        let stats = snapshot.stats().unwrap();
        assert_eq!((stats.alive, stats.dead, stats.occupied), (1, 0, 0));
    }

    #[test]
    fn test_empty_frame_is_published() {
        let mut assembler = FrameAssembler::new();

        let snapshots = completed(feed(&mut assembler, &["END"]));

        assert_eq!(snapshots.len(), 1);
        let snapshot = snapshots.first().unwrap();
        assert!(snapshot.agents().is_empty());
        assert!(snapshot.places().is_empty());
        assert!(snapshot.stats().is_none());
        assert!(!snapshot.is_initial());
    }

    #[test]
    fn test_frames_do_not_leak_into_each_other() {
        let mut assembler = FrameAssembler::new();
        let snapshots = completed(feed(
            &mut assembler,
            &[
                "AGENT;Alice;1;1;50;10;100;Sain;0.0",
                "STATS;50;10;100;1;0;0",
                "END",
                "AGENT;Bob;2;2;40;20;90;Repos;1.0",
                "END",
            ],
        ));

        assert_eq!(snapshots.len(), 2);
        let second = snapshots.get(1).unwrap();
        assert_eq!(second.sequence(), 2);
        assert!(second.agent("Alice").is_none());
        assert!(second.agent("Bob").is_some());
        // Stats are per frame
        assert!(second.stats().is_none());
    }

    #[test]
    fn test_record_order_is_preserved() {
        let mut assembler = FrameAssembler::new();
        let snapshots = completed(feed(
            &mut assembler,
            &[
                "AGENT;C;1;1;50;10;100;Repos;0",
                "AGENT;A;1;1;50;10;100;Repos;0",
                "AGENT;B;1;1;50;10;100;Repos;0",
                "PARC;3;3;0",
                "TRAVAIL;1;1;1",
                "END",
            ],
        ));

        let snapshot = snapshots.first().unwrap();
        let names: Vec<_> = snapshot.agents().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        let kinds: Vec<_> = snapshot.places().iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PlaceKind::Park, PlaceKind::Work]);
    }

    // ------------------------------------------------------------------------
    // Side Channel and Errors
    // ------------------------------------------------------------------------

    #[test]
    fn test_config_applies_immediately() {
        let mut assembler = FrameAssembler::new();
        assembler.push_line("AGENT;Alice;1;1;50;10;100;Sain;0.0");

        let event = assembler.push_line("CONFIG;40;25");

        assert_eq!(event, FrameEvent::Grid(GridConfig::try_new(40, 25).unwrap()));
        // The pending frame is untouched and nothing was completed
        assert_eq!(assembler.pending_records(), 1);
        assert_eq!(assembler.last_sequence(), 0);
    }

    #[test]
    fn test_malformed_line_does_not_break_frame() {
        let mut assembler = FrameAssembler::new();
        let events = feed(
            &mut assembler,
            &[
                "AGENT;Alice;1;1;50;10;100;Sain;0.0",
                "AGENT;Broken;1;1",
                "GARBAGE",
                "AGENT;Bob;2;2;40;20;90;Repos;1.0",
                "END",
            ],
        );

        let rejected = events
            .iter()
            .filter(|e| matches!(e, FrameEvent::Rejected(_)))
            .count();
        assert_eq!(rejected, 2);

        let snapshots = completed(events);
        let names: Vec<_> = snapshots
            .first()
            .unwrap()
            .agents()
            .iter()
            .map(|a| a.name.clone())
            .collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_malformed_stats_leaves_frame_without_stats() {
        let mut assembler = FrameAssembler::new();
        let snapshots = completed(feed(
            &mut assembler,
            &[
                "STATS;50;10;100;1;0;0",
                "STATS;50;10;100;1;0",
                "AGENT;Alice;1;1;50;10;100;Sain;0.0",
                "END",
            ],
        ));

        let snapshot = snapshots.first().unwrap();
        assert!(snapshot.stats().is_none());
        assert_eq!(snapshot.agents().len(), 1);
    }

    #[test]
    fn test_only_malformed_stats_clears_stats() {
        let mut assembler = FrameAssembler::new();
        let snapshots = completed(feed(
            &mut assembler,
            &[
                "STATS;50;10;100;1;0;0",
                "AGENT;STATS;1",
                "HELLO;STATS",
                "END",
                "STATS;50;10;100;1;0;0",
                "STATS;50;10;abc;1;0;0",
                "END",
            ],
        ));

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].stats().map(|stats| stats.alive), Some(1));
        assert!(snapshots[1].stats().is_none());
    }

    // ------------------------------------------------------------------------
    // Discard
    // ------------------------------------------------------------------------

    #[test]
    fn test_discard_partial() {
        let mut assembler = FrameAssembler::new();
        feed(
            &mut assembler,
            &[
                "AGENT;Alice;1;1;50;10;100;Sain;0.0",
                "END",
                "AGENT;Torn;1;1;50;10;100;Sain;0.0",
                "MAISON;2;2;0",
            ],
        );

        assert_eq!(assembler.discard_partial(), 2);
        assert_eq!(assembler.pending_records(), 0);

        // Numbering continues after a discard
        let snapshots = completed(feed(&mut assembler, &["END"]));
        let snapshot = snapshots.first().unwrap();
        assert_eq!(snapshot.sequence(), 2);
        assert!(snapshot.agents().is_empty());
    }
}
