// ── Tag-to-spool matching and derived readout ──

use std::sync::Arc;

use crate::model::Spool;

/// Fallback empty-spool weight when the inventory record carries none.
pub const DEFAULT_CORE_WEIGHT_G: f64 = 250.0;

/// A live gross weight within this band of the expected gross weight
/// counts as agreeing with the inventory bookkeeping.
pub const WEIGHT_MATCH_TOLERANCE_G: f64 = 50.0;

/// Result of resolving a tag UID against the spool inventory.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Matched(Arc<Spool>),
    Unmatched,
}

impl MatchOutcome {
    pub fn spool(&self) -> Option<&Arc<Spool>> {
        match self {
            Self::Matched(spool) => Some(spool),
            Self::Unmatched => None,
        }
    }
}

/// Resolve a tag UID by exact `tag_uid` equality; first match wins.
///
/// Two spools sharing a UID is a data-integrity problem upstream; it is
/// reported at refresh time, not resolved here.
pub fn match_tag(uid: &str, spools: &[Arc<Spool>]) -> MatchOutcome {
    spools
        .iter()
        .find(|spool| spool.tag_uid.as_deref() == Some(uid))
        .map_or(MatchOutcome::Unmatched, |spool| {
            MatchOutcome::Matched(Arc::clone(spool))
        })
}

/// Weight figures derived from one spool and one live scale reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpoolReadout {
    /// Scale reading, floored at zero and rounded to whole grams.
    pub gross_g: u32,
    /// Filament left on the spool: gross minus the (possibly defaulted)
    /// core weight, floored at zero.
    pub remaining_g: u32,
    /// Remaining as a fraction of the label weight, capped at 100.
    pub fill_percent: u8,
    /// What the scale *should* read if the backend's usage bookkeeping
    /// is accurate.
    pub expected_gross_g: u32,
    /// Whether gross agrees with expected within the tolerance band.
    pub weight_match: bool,
}

/// Compute the derived readout for a matched spool.
///
/// Pure arithmetic over the spool record and scale grams; negative and
/// missing inputs degrade to zero instead of failing.
pub fn readout(spool: &Spool, scale_g: f64, default_core_g: f64) -> SpoolReadout {
    let core = spool
        .core_weight_g
        .filter(|&w| w > 0.0)
        .unwrap_or(default_core_g);
    let label = spool.label_weight_g.filter(|&w| w > 0.0).unwrap_or(0.0);
    let used = spool.weight_used_g.filter(|&w| w > 0.0).unwrap_or(0.0);

    let gross = scale_g.max(0.0).round();
    let remaining = (gross - core).max(0.0).round();
    let fill = (remaining / label.max(1.0) * 100.0).round().min(100.0);
    let expected = (label - used).max(0.0) + core;
    let weight_match = (gross - expected).abs() <= WEIGHT_MATCH_TOLERANCE_G;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    SpoolReadout {
        gross_g: gross as u32,
        remaining_g: remaining as u32,
        fill_percent: fill as u8,
        expected_gross_g: expected.round() as u32,
        weight_match,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn spool(id: i64, uid: &str) -> Spool {
        Spool {
            id,
            tag_uid: Some(uid.into()),
            material: "PLA".into(),
            subtype: None,
            color_name: None,
            rgba_hex: None,
            brand: None,
            label_weight_g: Some(1000.0),
            core_weight_g: Some(250.0),
            weight_used_g: Some(750.0),
            archived: false,
            updated_at: None,
        }
    }

    #[test]
    fn exact_uid_match_first_wins() {
        let spools = vec![
            Arc::new(spool(1, "AAA")),
            Arc::new(spool(2, "BBB")),
            Arc::new(spool(3, "BBB")),
        ];

        let MatchOutcome::Matched(found) = match_tag("BBB", &spools) else {
            panic!("expected a match");
        };
        assert_eq!(found.id, 2);

        assert!(matches!(match_tag("bbb", &spools), MatchOutcome::Unmatched));
        assert!(matches!(match_tag("ZZZ", &spools), MatchOutcome::Unmatched));
    }

    #[test]
    fn readout_happy_path() {
        // label 1000, core 250, used 750 -> expected gross 500
        let s = spool(1, "AAA");
        let r = readout(&s, 503.2, DEFAULT_CORE_WEIGHT_G);

        assert_eq!(r.gross_g, 503);
        assert_eq!(r.remaining_g, 253);
        assert_eq!(r.fill_percent, 25);
        assert_eq!(r.expected_gross_g, 500);
        assert!(r.weight_match, "3g off expected is within the 50g band");
    }

    #[test]
    fn readout_flags_weight_mismatch() {
        let s = spool(1, "AAA");
        // Expected 500; 449 is 51g off
        let r = readout(&s, 449.0, DEFAULT_CORE_WEIGHT_G);
        assert!(!r.weight_match);
        // Exactly on the band edge still matches
        assert!(readout(&s, 450.0, DEFAULT_CORE_WEIGHT_G).weight_match);
        assert!(readout(&s, 550.0, DEFAULT_CORE_WEIGHT_G).weight_match);
    }

    #[test]
    fn missing_core_weight_falls_back_to_default() {
        let s = Spool {
            core_weight_g: None,
            ..spool(1, "AAA")
        };
        let r = readout(&s, 600.0, DEFAULT_CORE_WEIGHT_G);
        assert_eq!(r.remaining_g, 350);

        let zero_core = Spool {
            core_weight_g: Some(0.0),
            ..spool(1, "AAA")
        };
        assert_eq!(readout(&zero_core, 600.0, DEFAULT_CORE_WEIGHT_G).remaining_g, 350);
    }

    #[test]
    fn negative_scale_clamps_to_zero() {
        let s = spool(1, "AAA");
        let r = readout(&s, -40.0, DEFAULT_CORE_WEIGHT_G);
        assert_eq!(r.gross_g, 0);
        assert_eq!(r.remaining_g, 0);
        assert_eq!(r.fill_percent, 0);
    }

    #[test]
    fn fill_percent_caps_at_100() {
        let s = Spool {
            label_weight_g: Some(100.0),
            ..spool(1, "AAA")
        };
        // remaining = 1000 - 250 = 750 on a 100g label
        let r = readout(&s, 1000.0, DEFAULT_CORE_WEIGHT_G);
        assert_eq!(r.fill_percent, 100);
    }

    #[test]
    fn missing_label_weight_never_divides_by_zero() {
        let s = Spool {
            label_weight_g: None,
            weight_used_g: None,
            ..spool(1, "AAA")
        };
        let r = readout(&s, 500.0, DEFAULT_CORE_WEIGHT_G);
        // label degrades to 0 -> max(1) divisor; fill caps at 100
        assert_eq!(r.fill_percent, 100);
        // expected gross = max(0, 0-0) + 250
        assert_eq!(r.expected_gross_g, 250);
    }
}
