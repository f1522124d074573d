//! Template plus overrides.

use super::record::{Record, Value};

/// Produce one copy of `template` per override set, each with its
/// overrides applied. No overrides yields the template alone.
pub fn expand(template: &Record, overrides: &[Vec<(String, Value)>]) -> Vec<Record> {
    expand_with(template, overrides, |record, set| {
        for (key, value) in set {
            record.insert(key.as_str(), value.clone());
        }
    })
}

/// Generic form of [`expand`]: clone `template` once per override and let
/// `apply` adjust the copy.
pub fn expand_with<T, O, F>(template: &T, overrides: &[O], mut apply: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&mut T, &O),
{
    if overrides.is_empty() {
        return vec![template.clone()];
    }

    overrides
        .iter()
        .map(|o| {
            let mut copy = template.clone();
            apply(&mut copy, o);
            copy
        })
        .collect()
}
