//! Stack headroom for the recursive passes.
//!
//! Parsing, resolution and evaluation all recurse over the syntax tree, and
//! evaluation also recurses once per interpreted call.  Each recursive entry
//! point runs through [`ensure_sufficient_stack`], which moves onto a fresh
//! heap‑allocated segment when the current one runs low.  Depth is bounded
//! separately (parser nesting limit, interpreter call ceiling); this only
//! keeps those bounds reachable on small thread stacks.

/// Minimum stack space to keep available.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than [`RED_ZONE`] bytes remain.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deep_recurse(n: usize) -> usize {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { deep_recurse(n - 1) + 1 })
    }

    #[test]
    fn deep_recursion_does_not_overflow() {
        assert_eq!(deep_recurse(100_000), 100_000);
    }

    #[test]
    fn passes_results_through() {
        let result: Result<i32, &str> = ensure_sufficient_stack(|| Ok(123));
        assert_eq!(result, Ok(123));
    }
}
