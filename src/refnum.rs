//! Reference number generation
//!
//! Externally quotable identifiers for transactions and withdrawal requests,
//! distinct from the internal ULID primary keys. Format:
//! `{PREFIX}-{YYYYMMDD}-{COUNTER}{RAND}` - readable over the phone, unique
//! within a process lifetime, and not guessable in sequence.

use once_cell::sync::Lazy;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(1));

/// Generate a reference number with the given prefix (e.g. "TXN", "WDL").
pub fn generate(prefix: &str) -> String {
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let date = chrono::Utc::now().format("%Y%m%d");
    let salt: u16 = rand::thread_rng().gen_range(1000..10000);
    format!("{prefix}-{date}-{seq:04}{salt}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_shape() {
        let r = generate("TXN");
        assert!(r.starts_with("TXN-"));
        // PREFIX-YYYYMMDD-NNNNSSSS
        let parts: Vec<&str> = r.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_unique_in_sequence() {
        let a = generate("WDL");
        let b = generate("WDL");
        assert_ne!(a, b);
    }
}
