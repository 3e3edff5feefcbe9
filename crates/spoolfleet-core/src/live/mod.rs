// ── Live scale pipeline ──
//
// stability: debounces jittery readings into a steady display value.
// matcher:   resolves a tag UID to an inventory spool and derives the
//            weight readout shown on the card.
// reconciler: per-device presentation state machine tying it together.

pub mod matcher;
pub mod reconciler;
pub mod stability;
