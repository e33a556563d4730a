//! Content-hash normalization: strip the fields that change on every save
//! without the workflow's actual behavior changing.
//!
//! The default normalization set (§9 Open Question resolution, see
//! DESIGN.md): `extra.ds` (pan/zoom), `frontend_version`, `revision`, and
//! seed widgets under "randomize" control. Kept as a plain list rather than a
//! hardcoded match so a future build can widen it without touching the
//! hashing code.
pub const NORMALIZED_AWAY_POINTERS: &[&str] = &["/extra/ds", "/frontend_version", "/revision"];

use serde_json::Value;
use xxhash_rust::xxh3::Xxh3Builder;

const SEED_A: u64 = 0x1F2E_3D4C_5B6A_7988;
const SEED_B: u64 = 0x8877_6655_4433_2211;

/// Widget value markers that indicate the *preceding* widget is a seed whose
/// concrete value should not affect the content hash.
const RANDOMIZE_MARKERS: &[&str] = &["randomize", "increment", "decrement"];

/// Produces a normalized clone of the document suitable for content hashing.
/// The input document itself (and any reconstruction from it) is never
/// mutated; normalization only ever touches this throwaway clone.
pub fn normalize_for_hash(value: &Value) -> Value {
    let mut normalized = value.clone();
    for pointer in NORMALIZED_AWAY_POINTERS {
        remove_at_pointer(&mut normalized, pointer);
    }
    strip_randomized_seeds(&mut normalized);
    normalized
}

/// Computes the 256-bit content hash of a normalized document: two
/// independently seeded XXH3-128 digests over the canonical JSON bytes,
/// concatenated, the same construction `comfygit_model_index::hash` uses for
/// the quick model hash (kept as a separate local copy rather than a shared
/// dependency, since this crate has no reason to depend on the model index).
pub fn content_hash(value: &Value) -> String {
    let normalized = normalize_for_hash(value);
    let bytes = serde_json::to_vec(&normalized).unwrap_or_default();
    let mut a = Xxh3Builder::new().with_seed(SEED_A).build();
    let mut b = Xxh3Builder::new().with_seed(SEED_B).build();
    a.update(&bytes);
    b.update(&bytes);
    let ha = a.digest128().to_le_bytes();
    let hb = b.digest128().to_le_bytes();
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&ha);
    out[16..].copy_from_slice(&hb);
    out.iter().map(|b| format!("{b:02x}")).collect()
}

fn remove_at_pointer(value: &mut Value, pointer: &str) {
    let Some((parent_pointer, key)) = pointer.rsplit_once('/') else {
        return;
    };
    let parent = if parent_pointer.is_empty() {
        Some(&mut *value)
    } else {
        value.pointer_mut(parent_pointer)
    };
    if let Some(Value::Object(map)) = parent {
        map.remove(key);
    }
}

fn strip_randomized_seeds(value: &mut Value) {
    walk_widgets_values_mut(value, |widgets| {
        let Value::Array(items) = widgets else { return };
        let randomize_indices: Vec<usize> = items
            .iter()
            .enumerate()
            .filter_map(|(i, v)| {
                v.as_str()
                    .filter(|s| RANDOMIZE_MARKERS.contains(s))
                    .map(|_| i)
            })
            .collect();
        for idx in randomize_indices {
            if idx > 0 {
                if let Some(slot) = items.get_mut(idx - 1) {
                    *slot = Value::Number(0.into());
                }
            }
        }
    });
}

fn walk_widgets_values_mut(value: &mut Value, mut f: impl FnMut(&mut Value)) {
    walk_widgets_values_mut_inner(value, &mut f);
}

fn walk_widgets_values_mut_inner(value: &mut Value, f: &mut dyn FnMut(&mut Value)) {
    match value {
        Value::Object(map) => {
            if let Some(widgets) = map.get_mut("widgets_values") {
                f(widgets);
            }
            for (key, v) in map.iter_mut() {
                if key != "widgets_values" {
                    walk_widgets_values_mut_inner(v, f);
                }
            }
        }
        Value::Array(items) => {
            for v in items {
                walk_widgets_values_mut_inner(v, f);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_ignores_pan_zoom_and_revision() {
        let a = json!({"nodes": [], "revision": 1, "extra": {"ds": {"scale": 1.0}}});
        let b = json!({"nodes": [], "revision": 42, "extra": {"ds": {"scale": 2.5}}});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn hash_ignores_randomized_seed_value() {
        let a = json!({"nodes": [{"id": 1, "type": "KSampler", "widgets_values": [111, "randomize"]}]});
        let b = json!({"nodes": [{"id": 1, "type": "KSampler", "widgets_values": [222, "randomize"]}]});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn hash_changes_on_fixed_seed_change() {
        let a = json!({"nodes": [{"id": 1, "type": "KSampler", "widgets_values": [111, "fixed"]}]});
        let b = json!({"nodes": [{"id": 1, "type": "KSampler", "widgets_values": [222, "fixed"]}]});
        assert_ne!(content_hash(&a), content_hash(&b));
    }
}
