//! Native stack headroom for the recursive walks
//!
//! The parser, the evaluator and the JSON engine all recurse on the Rust
//! stack. Each recursion point runs through [`guard`], which moves onto a
//! fresh heap-allocated segment when the current one runs low, so nesting
//! is bounded by the configured limits instead of by the host thread's
//! stack size.

use crate::error::{messages, Error, Result};

/// Headroom a single guarded step may use before the next check
const RED_ZONE: usize = 256 * 1024;
/// Size of each segment allocated when headroom runs out
const SEGMENT_SIZE: usize = 4 * 1024 * 1024;

/// Nesting levels of arrays and objects the JSON engine accepts
pub(crate) const MAX_JSON_DEPTH: usize = 5_000;
/// Nested productions the parser accepts
pub(crate) const MAX_PARSE_DEPTH: usize = 5_000;

/// Run `f` with at least [`RED_ZONE`] bytes of stack available
#[inline]
pub(crate) fn guard<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// Enter one nesting level; fails with a `RangeError` past `limit`
pub(crate) fn enter(depth: &mut usize, limit: usize) -> Result<()> {
    if *depth >= limit {
        return Err(Error::range_error(messages::NESTING_TOO_DEEP));
    }
    *depth += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_stops_at_limit() {
        let mut depth = 0;
        assert!(enter(&mut depth, 2).is_ok());
        assert!(enter(&mut depth, 2).is_ok());
        let err = enter(&mut depth, 2).unwrap_err();
        assert_eq!(err.kind(), Some(crate::ErrorKind::RangeError));
        assert_eq!(depth, 2);
    }

    #[test]
    fn test_guard_survives_deep_recursion() {
        fn down(n: u32) -> u32 {
            let pad = [n as u8; 512];
            if n == 0 {
                return u32::from(pad[0]);
            }
            guard(|| down(n - 1)) + u32::from(pad[511] & 0)
        }
        let handle = std::thread::Builder::new()
            .stack_size(1 << 20)
            .spawn(|| down(50_000))
            .unwrap();
        assert_eq!(handle.join().unwrap(), 0);
    }
}
