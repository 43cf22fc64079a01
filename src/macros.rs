//! Macro key decoding and macro sets
//!
//! Keys in a `.macros` file look like `f1`, `F12`, `m0`, `m11`. The trailing
//! digits select the slot. Function-key prefixes (`f`/`F`) are already
//! one-based; every other prefix counts from zero in the file and is shifted
//! by one, because the host numbers its macro slots from one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FormatError;
use crate::kvp::KeyValueMap;

/// A key split into its letter prefix and trailing number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroKey<'a> {
    pub prefix: &'a str,
    pub number: u64,
}

impl<'a> MacroKey<'a> {
    /// Split off the maximal run of trailing ASCII digits
    pub fn decode(key: &'a str) -> Result<Self, FormatError> {
        let prefix = key.trim_end_matches(|c: char| c.is_ascii_digit());
        let digits = &key[prefix.len()..];
        if digits.is_empty() {
            return Err(invalid(key, "no trailing number"));
        }
        let number = digits
            .parse::<u64>()
            .map_err(|_| invalid(key, "number out of range"))?;
        Ok(Self { prefix, number })
    }

    /// Function keys are numbered from one already
    pub fn is_function_key(&self) -> bool {
        self.prefix == "f" || self.prefix == "F"
    }

    /// One-based slot in the host's macro set
    pub fn slot_index(&self) -> Option<u64> {
        if self.is_function_key() {
            Some(self.number)
        } else {
            self.number.checked_add(1)
        }
    }
}

fn invalid(key: &str, reason: &'static str) -> FormatError {
    FormatError::InvalidMacroKey {
        key: key.to_string(),
        reason,
    }
}

/// Decode a key all the way to its slot index
pub fn slot_for_key(key: &str) -> Result<u64, FormatError> {
    let decoded = MacroKey::decode(key)?;
    decoded
        .slot_index()
        .ok_or_else(|| invalid(key, "number out of range"))
}

/// True when at least one key has the `<prefix><digits>` shape
pub fn has_macro_keys(defs: &KeyValueMap) -> bool {
    defs.keys().any(|key| MacroKey::decode(key).is_ok())
}

/// One macro definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroSlot {
    pub index: u64,
    pub name: String,
    pub contents: String,
}

/// A complete macro set, built off to the side and installed in one step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroSet {
    slots: BTreeMap<u64, MacroSlot>,
}

impl MacroSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a macro; an existing definition at the same index is replaced
    pub fn define(&mut self, index: u64, name: impl Into<String>, contents: impl Into<String>) {
        let slot = MacroSlot {
            index,
            name: name.into(),
            contents: contents.into(),
        };
        if let Some(old) = self.slots.insert(index, slot) {
            debug!("Macro {} redefined (was {:?})", index, old.contents);
        }
    }

    pub fn get(&self, index: u64) -> Option<&MacroSlot> {
        self.slots.get(&index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in index order
    pub fn iter(&self) -> impl Iterator<Item = &MacroSlot> {
        self.slots.values()
    }
}

/// What to do with a key that does not decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    /// Any bad key fails the whole file
    #[default]
    Strict,
    /// Bad keys are logged and skipped
    Skip,
}

/// Naming convention for macro slots; `{}` is replaced by the slot index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroNaming {
    template: String,
}

impl Default for MacroNaming {
    fn default() -> Self {
        Self::new("Macro {}")
    }
}

impl MacroNaming {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn name(&self, index: u64) -> String {
        if self.template.contains("{}") {
            self.template.replace("{}", &index.to_string())
        } else {
            format!("{} {}", self.template, index)
        }
    }
}

impl fmt::Display for MacroNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Build a macro set from parsed pairs, in mapping order
pub fn build_macro_set(
    defs: &KeyValueMap,
    policy: KeyPolicy,
    naming: &MacroNaming,
) -> Result<MacroSet, FormatError> {
    let mut set = MacroSet::new();
    for (key, contents) in defs.iter() {
        let index = match (slot_for_key(key), policy) {
            (Ok(index), _) => index,
            (Err(e), KeyPolicy::Strict) => return Err(e),
            (Err(e), KeyPolicy::Skip) => {
                warn!("Skipping {}", e);
                continue;
            }
        };
        set.define(index, naming.name(index), contents);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kvp::Parser;

    fn defs(text: &str) -> KeyValueMap {
        Parser::default().parse_str(text).unwrap()
    }

    #[test]
    fn test_decode() {
        let key = MacroKey::decode("f12").unwrap();
        assert_eq!(key.prefix, "f");
        assert_eq!(key.number, 12);

        let key = MacroKey::decode("macro007").unwrap();
        assert_eq!(key.prefix, "macro");
        assert_eq!(key.number, 7);

        // Only the trailing run counts
        let key = MacroKey::decode("a1b2").unwrap();
        assert_eq!(key.prefix, "a1b");
        assert_eq!(key.number, 2);

        let key = MacroKey::decode("5").unwrap();
        assert_eq!(key.prefix, "");
        assert_eq!(key.number, 5);
    }

    #[test]
    fn test_decode_rejects() {
        assert!(MacroKey::decode("abc").is_err());
        assert!(MacroKey::decode("").is_err());
        assert!(MacroKey::decode("f99999999999999999999999").is_err());
    }

    #[test]
    fn test_slot_index() {
        assert_eq!(slot_for_key("f1"), Ok(1));
        assert_eq!(slot_for_key("F1"), Ok(1));
        assert_eq!(slot_for_key("f12"), Ok(12));
        assert_eq!(slot_for_key("m0"), Ok(1));
        assert_eq!(slot_for_key("m11"), Ok(12));
        assert_eq!(slot_for_key("M0"), Ok(1));
        // Prefix comparison is exact
        assert_eq!(slot_for_key("fn0"), Ok(1));
        assert_eq!(slot_for_key("0"), Ok(1));
    }

    #[test]
    fn test_slot_zero_and_overflow() {
        // f0 is passed through; slot 0 is the host's call
        assert_eq!(slot_for_key("f0"), Ok(0));
        assert_eq!(slot_for_key("F0"), Ok(0));
        assert!(slot_for_key(&format!("m{}", u64::MAX)).is_err());
        assert_eq!(slot_for_key(&format!("f{}", u64::MAX)), Ok(u64::MAX));
    }

    #[test]
    fn test_naming() {
        let naming = MacroNaming::default();
        assert_eq!(naming.name(1), "Macro 1");
        assert_eq!(naming.name(12), "Macro 12");

        assert_eq!(MacroNaming::new("F{} key").name(3), "F3 key");
        assert_eq!(MacroNaming::new("Macro").name(4), "Macro 4");
    }

    #[test]
    fn test_build_set() {
        let set = build_macro_set(
            &defs("m0 = first\nm1 = second\nf12 = twelfth"),
            KeyPolicy::Strict,
            &MacroNaming::default(),
        )
        .unwrap();

        assert_eq!(set.len(), 3);
        let slot = set.get(1).unwrap();
        assert_eq!(slot.name, "Macro 1");
        assert_eq!(slot.contents, "first");
        assert_eq!(set.get(2).unwrap().contents, "second");
        assert_eq!(set.get(12).unwrap().name, "Macro 12");

        let indices: Vec<u64> = set.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 12]);
    }

    #[test]
    fn test_collision_last_processed_wins() {
        let set = build_macro_set(
            &defs("m0 = AAA\nf1 = BBB"),
            KeyPolicy::Strict,
            &MacroNaming::default(),
        )
        .unwrap();

        assert_eq!(set.len(), 1);
        let slot = set.get(1).unwrap();
        assert_eq!(slot.name, "Macro 1");
        assert_eq!(slot.contents, "BBB");

        let set = build_macro_set(
            &defs("f1 = BBB\nm0 = AAA"),
            KeyPolicy::Strict,
            &MacroNaming::default(),
        )
        .unwrap();
        assert_eq!(set.get(1).unwrap().contents, "AAA");
    }

    #[test]
    fn test_strict_policy_fails_on_bad_key() {
        let err = build_macro_set(
            &defs("m0 = ok\nabc = bad\nm1 = ok"),
            KeyPolicy::Strict,
            &MacroNaming::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            FormatError::InvalidMacroKey {
                key: "abc".to_string(),
                reason: "no trailing number"
            }
        );
    }

    #[test]
    fn test_skip_policy() {
        let set = build_macro_set(
            &defs("m0 = ok\nabc = bad\nf0 = zero\nm1 = ok"),
            KeyPolicy::Skip,
            &MacroNaming::default(),
        )
        .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(0).unwrap().contents, "zero");
        assert!(set.get(1).is_some());
        assert!(set.get(2).is_some());
    }

    #[test]
    fn test_function_key_zero_kept() {
        let set = build_macro_set(
            &defs("f0 = zero
f1 = one"),
            KeyPolicy::Strict,
            &MacroNaming::default(),
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().name, "Macro 0");
        assert_eq!(set.get(1).unwrap().contents, "one");
    }

    #[test]
    fn test_has_macro_keys() {
        assert!(has_macro_keys(&defs("title = x
m3 = y")));
        assert!(!has_macro_keys(&defs("title = x
name = y")));
        assert!(!has_macro_keys(&defs("")));
    }

    #[test]
    fn test_policy_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: KeyPolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"skip\"").unwrap();
        assert_eq!(w.policy, KeyPolicy::Skip);
    }
}
