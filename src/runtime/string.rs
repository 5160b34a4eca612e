//! Immutable UTF-16 strings
//!
//! Script strings are sequences of UTF-16 code units. Lone surrogates are
//! legal and survive every operation; they only become U+FFFD when a string
//! is handed to Rust as a `String`.

use std::fmt;
use std::rc::Rc;

/// A shared, immutable sequence of UTF-16 code units
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<[u16]>);

impl JsString {
    /// Longest string the runtime builds, in code units
    pub const MAX_LENGTH: usize = (1 << 28) - 16;

    /// The empty string
    pub fn empty() -> Self {
        JsString(Rc::from(Vec::new()))
    }

    /// Borrow the code units
    pub fn as_units(&self) -> &[u16] {
        &self.0
    }

    /// Length in code units
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the string has no code units
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Code unit at `index`
    pub fn unit_at(&self, index: usize) -> Option<u16> {
        self.0.get(index).copied()
    }

    /// Concatenate two strings
    pub fn concat(&self, other: &JsString) -> JsString {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut units = Vec::with_capacity(self.len() + other.len());
        units.extend_from_slice(&self.0);
        units.extend_from_slice(&other.0);
        JsString::from(units)
    }

    /// Code units in `[start, end)`, clamped to the string
    pub fn substring(&self, start: usize, end: usize) -> JsString {
        let end = end.min(self.len());
        let start = start.min(end);
        if start == 0 && end == self.len() {
            return self.clone();
        }
        JsString::from(&self.0[start..end])
    }

    /// First position at or after `from` where `needle` occurs
    pub fn index_of(&self, needle: &JsString, from: usize) -> Option<usize> {
        let (hay, pat) = (self.as_units(), needle.as_units());
        if pat.is_empty() {
            return Some(from.min(hay.len()));
        }
        if pat.len() > hay.len() {
            return None;
        }
        (from..=hay.len() - pat.len()).find(|&i| &hay[i..i + pat.len()] == pat)
    }

    /// Last position at or before `from` where `needle` occurs
    pub fn last_index_of(&self, needle: &JsString, from: usize) -> Option<usize> {
        let (hay, pat) = (self.as_units(), needle.as_units());
        if pat.len() > hay.len() {
            return None;
        }
        let start = from.min(hay.len() - pat.len());
        (0..=start).rev().find(|&i| &hay[i..i + pat.len()] == pat)
    }

    /// Parse as a canonical array index (`"0"`, `"17"`, never `"017"`)
    pub fn to_array_index(&self) -> Option<u32> {
        let units = self.as_units();
        if units.is_empty() || units.len() > 10 {
            return None;
        }
        if units.len() > 1 && units[0] == u16::from(b'0') {
            return None;
        }
        let mut n: u64 = 0;
        for &u in units {
            if !(u16::from(b'0')..=u16::from(b'9')).contains(&u) {
                return None;
            }
            n = n * 10 + u64::from(u - u16::from(b'0'));
        }
        // 2^32 - 1 is a valid length but not a valid index
        if n >= u64::from(u32::MAX) {
            return None;
        }
        Some(n as u32)
    }

    /// Whether the string equals the given ASCII/UTF-8 text
    pub fn eq_str(&self, s: &str) -> bool {
        self.0.iter().copied().eq(s.encode_utf16())
    }

    /// Lossy conversion to a Rust string
    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.0)
    }
}

impl Default for JsString {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.encode_utf16().collect::<Vec<_>>().into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString::from(s.as_str())
    }
}

impl From<Vec<u16>> for JsString {
    fn from(units: Vec<u16>) -> Self {
        JsString(units.into())
    }
}

impl From<&[u16]> for JsString {
    fn from(units: &[u16]) -> Self {
        JsString(units.into())
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rust_string())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_rust_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_index_canonical_form() {
        assert_eq!(JsString::from("0").to_array_index(), Some(0));
        assert_eq!(JsString::from("4294967294").to_array_index(), Some(4294967294));
        assert_eq!(JsString::from("4294967295").to_array_index(), None);
        assert_eq!(JsString::from("01").to_array_index(), None);
        assert_eq!(JsString::from("1.5").to_array_index(), None);
        assert_eq!(JsString::from("").to_array_index(), None);
    }

    #[test]
    fn test_search() {
        let s = JsString::from("abcabc");
        assert_eq!(s.index_of(&JsString::from("bc"), 0), Some(1));
        assert_eq!(s.index_of(&JsString::from("bc"), 2), Some(4));
        assert_eq!(s.last_index_of(&JsString::from("bc"), 6), Some(4));
        assert_eq!(s.index_of(&JsString::from("x"), 0), None);
        assert_eq!(s.substring(1, 3).to_string(), "bc");
    }

    #[test]
    fn test_lone_surrogate_survives() {
        let s = JsString::from(vec![0xD800, 0x41]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.unit_at(0), Some(0xD800));
        assert_eq!(s.to_rust_string(), "\u{FFFD}A");
    }
}
