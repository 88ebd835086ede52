//! Grouping of card and suit-marker contours into slot records.
//!
//! Cards are visited in discovery order and at most `slots` of them are
//! considered per region. Each one is assigned to the slot band holding its
//! vertical center; when that slot is already taken the next free slot
//! below is used, and a card with no free slot left is dropped.

use crate::config::GroupingStrategy;
use crate::models::{BoundingBox, CardRecord, Classification, ContourTree, Player};

/// Slot geometry of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    pub slots: u32,
    pub region_height: u32,
}

impl SlotLayout {
    /// Slot band containing the vertical center of `bbox`. May lie past
    /// the last slot for boxes reaching below the region.
    pub fn raw_position(&self, bbox: &BoundingBox) -> u32 {
        let band = f64::from(self.region_height) / f64::from(self.slots.max(1));
        (bbox.center_y() / band).floor() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembleParams {
    pub layout: SlotLayout,
    pub grouping: GroupingStrategy,
    pub max_rank: Option<u32>,
}

/// What happened to the card contours of one region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionSummary {
    /// Card contours found in the region.
    pub cards_seen: usize,
    /// Card contours beyond the slot count that were never processed.
    pub cards_skipped: usize,
    /// Processed cards that found no free slot.
    pub cards_dropped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionCards {
    pub records: Vec<CardRecord>,
    pub summary: RegionSummary,
}

/// A card contour and the number of suit markers attributed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CardGroup {
    card: usize,
    markers: u32,
}

/// Turn a classified contour tree into card records for `player`.
pub fn assemble(tree: &ContourTree, player: Player, params: &AssembleParams) -> RegionCards {
    let slots = params.layout.slots as usize;
    let groups = match params.grouping {
        GroupingStrategy::Containment => group_by_containment(tree, slots),
        GroupingStrategy::DiscoveryOrder => group_by_discovery_order(tree, slots),
    };

    let cards_seen = tree.indices_of(Classification::Card).count();
    let mut summary = RegionSummary {
        cards_seen,
        cards_skipped: cards_seen.saturating_sub(groups.len()),
        cards_dropped: 0,
    };

    let mut taken = vec![false; slots];
    let mut records = Vec::with_capacity(groups.len());
    for group in groups {
        let Some(node) = tree.get(group.card) else {
            continue;
        };
        let bbox = node.contour.bbox;
        let raw = params.layout.raw_position(&bbox);
        let Some(position) = claim_slot(&mut taken, raw) else {
            log::debug!("player {player}: no free slot from {raw}, dropping card {bbox:?}");
            summary.cards_dropped += 1;
            continue;
        };
        if position != raw {
            log::debug!("player {player}: slot {raw} taken, card moved to {position}");
        }

        let mut rank = group.markers.max(1);
        if let Some(cap) = params.max_rank {
            rank = rank.min(cap.max(1));
        }
        records.push(CardRecord::new(player, position, rank, bbox.is_rotated()));
    }

    if summary.cards_skipped > 0 {
        log::debug!(
            "player {player}: {} card contours beyond {slots} slots ignored",
            summary.cards_skipped
        );
    }

    RegionCards { records, summary }
}

/// First free slot at or after `raw`, marked as taken.
fn claim_slot(taken: &mut [bool], raw: u32) -> Option<u32> {
    let start = raw as usize;
    let free = (start..taken.len()).find(|&p| !taken[p])?;
    taken[free] = true;
    Some(free as u32)
}

/// The first `limit` cards, each owning the suit markers whose nearest
/// card ancestor it is.
fn group_by_containment(tree: &ContourTree, limit: usize) -> Vec<CardGroup> {
    let mut groups: Vec<CardGroup> = tree
        .indices_of(Classification::Card)
        .take(limit)
        .map(|card| CardGroup { card, markers: 0 })
        .collect();

    for marker in tree.indices_of(Classification::SuitMarker) {
        let Some(owner) = tree.nearest_ancestor(marker, Classification::Card) else {
            continue;
        };
        if let Some(group) = groups.iter_mut().find(|g| g.card == owner) {
            group.markers += 1;
        }
    }
    groups
}

/// The first `limit` cards, each owning the unbroken run of suit markers
/// that directly follows it in discovery order.
fn group_by_discovery_order(tree: &ContourTree, limit: usize) -> Vec<CardGroup> {
    let classes: Vec<Classification> = tree.iter().map(|node| node.class).collect();
    let mut groups = Vec::new();
    let mut i = 0;
    while i < classes.len() && groups.len() < limit {
        if classes[i] != Classification::Card {
            i += 1;
            continue;
        }
        let run = classes[i + 1..]
            .iter()
            .take_while(|&&c| c == Classification::SuitMarker)
            .count();
        groups.push(CardGroup {
            card: i,
            markers: run as u32,
        });
        i += run + 1;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BorderKind, Contour};

    const CARD_AREA: f64 = 5000.0;
    const MARKER_AREA: f64 = 200.0;
    const NOISE_AREA: f64 = 10.0;

    fn node(tree: &mut ContourTree, bbox: BoundingBox, parent: Option<usize>, class: Classification) -> usize {
        let area = match class {
            Classification::Card => CARD_AREA,
            Classification::SuitMarker => MARKER_AREA,
            Classification::Noise => NOISE_AREA,
        };
        let border = match class {
            Classification::Card => BorderKind::Outer,
            _ => BorderKind::Hole,
        };
        tree.push(
            Contour {
                bbox,
                area,
                border,
                parent,
            },
            class,
        )
    }

    fn card(tree: &mut ContourTree, bbox: BoundingBox) -> usize {
        node(tree, bbox, None, Classification::Card)
    }

    fn marker(tree: &mut ContourTree, parent: usize) -> usize {
        node(tree, BoundingBox::new(20, 50, 12, 12), Some(parent), Classification::SuitMarker)
    }

    fn params(grouping: GroupingStrategy) -> AssembleParams {
        AssembleParams {
            layout: SlotLayout {
                slots: 5,
                region_height: 500,
            },
            grouping,
            max_rank: None,
        }
    }

    const BOTH: [GroupingStrategy; 2] = [GroupingStrategy::Containment, GroupingStrategy::DiscoveryOrder];

    #[test]
    fn empty_tree_yields_no_records() {
        for grouping in BOTH {
            let out = assemble(&ContourTree::new(), Player::One, &params(grouping));
            assert!(out.records.is_empty());
            assert_eq!(out.summary, RegionSummary::default());
        }
    }

    #[test]
    fn markers_without_cards_yield_no_records() {
        let mut tree = ContourTree::new();
        node(&mut tree, BoundingBox::new(0, 0, 10, 10), None, Classification::SuitMarker);
        node(&mut tree, BoundingBox::new(0, 30, 10, 10), None, Classification::Noise);
        for grouping in BOTH {
            assert!(assemble(&tree, Player::Two, &params(grouping)).records.is_empty());
        }
    }

    #[test]
    fn card_with_two_markers_in_first_slot() {
        let mut tree = ContourTree::new();
        let c = card(&mut tree, BoundingBox::new(10, 40, 80, 90));
        marker(&mut tree, c);
        marker(&mut tree, c);

        for grouping in BOTH {
            let out = assemble(&tree, Player::One, &params(grouping));
            assert_eq!(out.records, vec![CardRecord::new(Player::One, 0, 2, true)]);
        }
    }

    #[test]
    fn card_without_markers_has_rank_one() {
        let mut tree = ContourTree::new();
        card(&mut tree, BoundingBox::new(10, 210, 90, 80));
        for grouping in BOTH {
            let out = assemble(&tree, Player::One, &params(grouping));
            assert_eq!(out.records.len(), 1);
            assert_eq!(out.records[0].rank, 1);
            assert_eq!(out.records[0].position, 2);
            assert!(!out.records[0].rotated);
        }
    }

    #[test]
    fn colliding_card_moves_to_next_slot() {
        let mut tree = ContourTree::new();
        card(&mut tree, BoundingBox::new(10, 0, 80, 90));
        card(&mut tree, BoundingBox::new(10, 5, 80, 90));
        for grouping in BOTH {
            let out = assemble(&tree, Player::One, &params(grouping));
            let positions: Vec<u32> = out.records.iter().map(|r| r.position).collect();
            assert_eq!(positions, vec![0, 1]);
        }
    }

    #[test]
    fn card_is_dropped_when_no_slot_below_is_free() {
        let mut tree = ContourTree::new();
        card(&mut tree, BoundingBox::new(10, 400, 80, 90));
        card(&mut tree, BoundingBox::new(10, 405, 80, 90));
        let out = assemble(&tree, Player::One, &params(GroupingStrategy::Containment));
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].position, 4);
        assert_eq!(out.summary.cards_dropped, 1);
    }

    #[test]
    fn excess_cards_are_not_processed() {
        let mut tree = ContourTree::new();
        for i in 0..7 {
            card(&mut tree, BoundingBox::new(10, (i * 60).min(400), 80, 50));
        }
        for grouping in BOTH {
            let out = assemble(&tree, Player::One, &params(grouping));
            assert!(out.records.len() <= 5);
            assert_eq!(out.summary.cards_seen, 7);
            assert_eq!(out.summary.cards_skipped, 2);

            let mut positions: Vec<u32> = out.records.iter().map(|r| r.position).collect();
            positions.sort_unstable();
            positions.dedup();
            assert_eq!(positions.len(), out.records.len());
            assert!(positions.iter().all(|&p| p < 5));
        }
    }

    #[test]
    fn noise_breaks_a_discovery_order_run() {
        let mut tree = ContourTree::new();
        let c = card(&mut tree, BoundingBox::new(10, 40, 80, 90));
        marker(&mut tree, c);
        node(&mut tree, BoundingBox::new(30, 60, 2, 2), Some(c), Classification::Noise);
        marker(&mut tree, c);

        let flat = assemble(&tree, Player::One, &params(GroupingStrategy::DiscoveryOrder));
        assert_eq!(flat.records[0].rank, 1);

        let nested = assemble(&tree, Player::One, &params(GroupingStrategy::Containment));
        assert_eq!(nested.records[0].rank, 2);
    }

    #[test]
    fn containment_groups_interleaved_markers_by_owner() {
        // Both cards are discovered before any of their markers, as happens
        // when two cards share scan rows.
        let mut tree = ContourTree::new();
        let top = card(&mut tree, BoundingBox::new(10, 10, 80, 90));
        let bottom = card(&mut tree, BoundingBox::new(10, 310, 80, 90));
        marker(&mut tree, top);
        marker(&mut tree, bottom);
        marker(&mut tree, bottom);
        marker(&mut tree, bottom);

        let nested = assemble(&tree, Player::Two, &params(GroupingStrategy::Containment));
        assert_eq!(
            nested.records,
            vec![
                CardRecord::new(Player::Two, 0, 1, true),
                CardRecord::new(Player::Two, 3, 3, true),
            ]
        );

        let flat = assemble(&tree, Player::Two, &params(GroupingStrategy::DiscoveryOrder));
        assert_eq!(flat.records[0].rank, 1);
        assert_eq!(flat.records[1].rank, 4);
    }

    #[test]
    fn nested_noise_does_not_hide_marker_owner() {
        let mut tree = ContourTree::new();
        let c = card(&mut tree, BoundingBox::new(10, 110, 80, 90));
        let blob = node(&mut tree, BoundingBox::new(20, 120, 40, 40), Some(c), Classification::Noise);
        marker(&mut tree, blob);
        let out = assemble(&tree, Player::One, &params(GroupingStrategy::Containment));
        assert_eq!(out.records, vec![CardRecord::new(Player::One, 1, 1, true)]);
        assert_eq!(out.records[0].suit, None);
    }

    #[test]
    fn rank_cap_applies_after_floor() {
        let mut tree = ContourTree::new();
        let c = card(&mut tree, BoundingBox::new(10, 10, 80, 90));
        for _ in 0..9 {
            marker(&mut tree, c);
        }
        let capped = AssembleParams {
            max_rank: Some(6),
            ..params(GroupingStrategy::Containment)
        };
        assert_eq!(assemble(&tree, Player::One, &capped).records[0].rank, 6);
    }

    #[test]
    fn raw_position_uses_vertical_center() {
        let layout = SlotLayout {
            slots: 5,
            region_height: 500,
        };
        assert_eq!(layout.raw_position(&BoundingBox::new(10, 40, 80, 90)), 0);
        assert_eq!(layout.raw_position(&BoundingBox::new(0, 60, 10, 80)), 1);
        assert_eq!(layout.raw_position(&BoundingBox::new(0, 450, 10, 49)), 4);
    }
}
