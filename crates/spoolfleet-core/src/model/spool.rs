// ── Filament spool domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A filament spool from the inventory.
///
/// Weights are grams. `label_weight_g` is the manufacturer's nominal
/// filament weight; `core_weight_g` is the empty spool (cardboard or
/// plastic core); `weight_used_g` is what the backend believes has been
/// consumed so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spool {
    pub id: i64,
    /// NFC tag UID bound to this spool, when one has been paired.
    pub tag_uid: Option<String>,
    /// Material family, e.g. `"PLA"`, `"PETG"`.
    pub material: String,
    /// Material variant, e.g. `"Matte"`, `"CF"`.
    pub subtype: Option<String>,
    pub color_name: Option<String>,
    /// 8-char RGBA hex as stored by the backend, e.g. `"1e7a3cff"`.
    pub rgba_hex: Option<String>,
    pub brand: Option<String>,
    pub label_weight_g: Option<f64>,
    pub core_weight_g: Option<f64>,
    pub weight_used_g: Option<f64>,
    pub archived: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Spool {
    /// Human-readable one-line name: brand, material, subtype, color.
    pub fn display_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(4);
        if let Some(brand) = self.brand.as_deref() {
            parts.push(brand);
        }
        parts.push(&self.material);
        if let Some(subtype) = self.subtype.as_deref() {
            parts.push(subtype);
        }
        if let Some(color) = self.color_name.as_deref() {
            parts.push(color);
        }
        parts.join(" ")
    }

    /// Whether this spool carries a paired NFC tag.
    pub fn has_tag(&self) -> bool {
        self.tag_uid.as_deref().is_some_and(|uid| !uid.is_empty())
    }
}
