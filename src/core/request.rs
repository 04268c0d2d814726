/// Fetch tiers that can be superseded independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Domains,
    Categories,
    Locations,
}

impl Tier {
    fn index(self) -> usize {
        match self {
            Tier::Domains => 0,
            Tier::Categories => 1,
            Tier::Locations => 2,
        }
    }
}

/// Tag handed out when a fetch starts. Only the most recent token of a tier
/// is accepted back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    tier: Tier,
    seq: u64,
}

impl RequestToken {
    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    issued: [u64; 3],
    current: [Option<u64>; 3],
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, tier: Tier) -> RequestToken {
        let slot = tier.index();
        self.issued[slot] += 1;
        self.current[slot] = Some(self.issued[slot]);
        RequestToken {
            tier,
            seq: self.issued[slot],
        }
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current[token.tier.index()] == Some(token.seq)
    }

    pub fn is_pending(&self, tier: Tier) -> bool {
        self.current[tier.index()].is_some()
    }

    /// Drops the outstanding token of `tier`; its response will be ignored.
    pub fn invalidate(&mut self, tier: Tier) {
        self.current[tier.index()] = None;
    }

    /// Marks the token as answered so a duplicate delivery is rejected.
    pub fn complete(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.current[token.tier.index()] = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_token_supersedes_older() {
        let mut tracker = RequestTracker::new();
        let first = tracker.issue(Tier::Categories);
        let second = tracker.issue(Tier::Categories);

        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert!(second.seq() > first.seq());
    }

    #[test]
    fn test_tiers_are_independent() {
        let mut tracker = RequestTracker::new();
        let categories = tracker.issue(Tier::Categories);
        let _locations = tracker.issue(Tier::Locations);

        assert!(tracker.is_current(categories));
    }

    #[test]
    fn test_invalidate_and_complete() {
        let mut tracker = RequestTracker::new();
        let token = tracker.issue(Tier::Locations);
        tracker.invalidate(Tier::Locations);
        assert!(!tracker.complete(token));

        let token = tracker.issue(Tier::Locations);
        assert!(tracker.complete(token));
        assert!(!tracker.complete(token));
    }
}
