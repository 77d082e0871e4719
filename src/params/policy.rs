use rand::Rng;
use serde_json::Value;

use super::ParameterSet;

pub const FORCE_PARAM: &str = "force";
pub const SEED_PARAM: &str = "seed";
pub const RANDOM_SEED: &str = "random";

/// Inclusive range injected seeds are drawn from.
pub const SEED_MIN: u32 = 100_000;
pub const SEED_MAX: u32 = 99_999_999;

/// Why a request skips cached artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bypass {
    /// A truthy `force` parameter was supplied.
    Force,
    /// `seed=random` was supplied.
    RandomSeed,
}

/// Apply the cache-bypass control parameters.
///
/// A truthy `force` is stripped and replaced by a fresh seed. Otherwise a
/// `seed` of `"random"` is replaced by a fresh seed. Returns `None` when the
/// request may be served from the cache.
pub fn apply<R: Rng + ?Sized>(params: &mut ParameterSet, rng: &mut R) -> Option<Bypass> {
    if params.get(FORCE_PARAM).is_some_and(is_truthy) {
        params.remove(FORCE_PARAM);
        params.insert(SEED_PARAM, draw_seed(rng));
        return Some(Bypass::Force);
    }

    if params.get(SEED_PARAM).and_then(Value::as_str) == Some(RANDOM_SEED) {
        params.insert(SEED_PARAM, draw_seed(rng));
        return Some(Bypass::RandomSeed);
    }

    None
}

fn draw_seed<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(SEED_MIN..=SEED_MAX)
}

/// Truthiness of a parsed query value: empty, zero, false and null are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(members) => !members.is_empty(),
    }
}
