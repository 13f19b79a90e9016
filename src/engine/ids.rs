use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Issues `{prefix}_{millis}` identifiers.
///
/// The millisecond part never repeats within one generator: a second id requested in
/// the same millisecond gets the next millisecond value.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, prefix: &str) -> String {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(prev + 1);
            match self.last.compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return format!("{}_{}", prefix, candidate),
                Err(actual) => prev = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_have_prefix_and_millis() {
        let ids = IdGenerator::new();
        let id = ids.next("farm");
        let millis: i64 = id.strip_prefix("farm_").unwrap().parse().unwrap();
        assert!(millis > 0);
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let ids = IdGenerator::new();
        let seen: HashSet<String> = (0..500).map(|_| ids.next("crop")).collect();
        assert_eq!(seen.len(), 500);
    }
}
