//! Deterministic, uniform mapping of `(salt, featureKey, stableId)` to
//! `[0, 10000)` — the bucket space backing percentage ramp-ups.

use ff_core::ids::StableId;
use ff_core::rampup::RampUp;
use sha2::{Digest, Sha256};

/// Size of the bucket space: one-hundredth-of-a-percent resolution.
pub const BUCKET_SPACE: u32 = 10_000;

/// Fixed bucket assigned when a context carries no stable id. Equal to
/// `BUCKET_SPACE`, one past the valid range, so it never satisfies any
/// finite ramp-up — contexts without identity are excluded from partial
/// rollouts rather than silently assigned a bucket.
pub const SENTINEL_BUCKET: u32 = BUCKET_SPACE;

/// `SHA-256(salt || "|" || feature_key || "|" || stable_id_hex_lower)`, first
/// 8 bytes read big-endian, reduced modulo [`BUCKET_SPACE`].
///
/// `stable_id` is `None` when the context has no identity; callers get
/// [`SENTINEL_BUCKET`] back rather than a hashed value.
pub fn stable_bucket(salt: &str, feature_key: &str, stable_id: Option<&StableId>) -> u32 {
    let Some(stable_id) = stable_id else {
        return SENTINEL_BUCKET;
    };
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"|");
    hasher.update(feature_key.as_bytes());
    hasher.update(b"|");
    hasher.update(stable_id.hex().as_str().as_bytes());
    let digest = hasher.finalize();

    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    let n = u64::from_be_bytes(buf);
    (n % BUCKET_SPACE as u64) as u32
}

/// `round(r.value * 100)`, half-up, clamped to `[0, 10000]`.
pub fn ramp_up_threshold_basis_points(r: RampUp) -> u32 {
    r.threshold_basis_points()
}

/// `r == 100% || bucket < threshold(r)`. Strict `<`: `0%` excludes everyone,
/// `100%` includes everyone regardless of bucket (so the sentinel bucket is
/// still included at `100%`, matching "ramp-up doesn't require identity when
/// it isn't partial").
pub fn is_in_rampup(r: RampUp, bucket: u32) -> bool {
    r.is_full() || bucket < ramp_up_threshold_basis_points(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_stable_id_is_sentinel() {
        assert_eq!(stable_bucket("salt", "flag", None), SENTINEL_BUCKET);
    }

    #[test]
    fn bucket_is_deterministic_across_calls() {
        let id = StableId::from_raw("user-42").unwrap();
        let a = stable_bucket("my-feature", "my-feature", Some(&id));
        let b = stable_bucket("my-feature", "my-feature", Some(&id));
        assert_eq!(a, b);
        assert!(a < BUCKET_SPACE);
    }

    #[test]
    fn different_salts_usually_differ() {
        let id = StableId::from_raw("user-42").unwrap();
        let a = stable_bucket("flag-a", "flag-a", Some(&id));
        let b = stable_bucket("flag-b", "flag-b", Some(&id));
        assert_ne!(a, b);
    }

    #[test]
    fn zero_percent_excludes_everyone_including_sentinel() {
        let r = RampUp::new(0.0).unwrap();
        assert!(!is_in_rampup(r, 0));
        assert!(!is_in_rampup(r, SENTINEL_BUCKET));
    }

    #[test]
    fn hundred_percent_includes_everyone() {
        let r = RampUp::FULL;
        assert!(is_in_rampup(r, 0));
        assert!(is_in_rampup(r, BUCKET_SPACE - 1));
        assert!(is_in_rampup(r, SENTINEL_BUCKET));
    }

    #[test]
    fn threshold_is_strict_less_than() {
        let r = RampUp::new(50.0).unwrap();
        assert!(is_in_rampup(r, 4999));
        assert!(!is_in_rampup(r, 5000));
    }
}
