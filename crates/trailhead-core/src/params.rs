//! Transition parameter maps.
//!
//! Params are ordered string-keyed JSON values. Structural equality comes
//! from `serde_json::Value: PartialEq`, which is what the deep-equality
//! memoizer and active-state matching rely on — never reference identity.

use std::collections::BTreeMap;

use serde_json::Value;

/// Parameter map passed to transitions, href computation, and active-state
/// matching.
pub type Params = BTreeMap<String, Value>;

/// Deep-equality match on overlapping keys.
///
/// Returns `true` when every key present in **both** maps carries a
/// structurally equal value. Keys present in only one map are ignored;
/// an empty candidate matches anything.
#[must_use]
pub fn params_match(candidate: &Params, current: &Params) -> bool {
    candidate.iter().all(|(key, value)| {
        current
            .get(key)
            .is_none_or(|current_value| current_value == value)
    })
}
