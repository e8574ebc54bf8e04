//! Per-resource sequence tokens.
//!
//! Every request against a resource is stamped with the next sequence number for
//! that resource. A response is only applied while its stamp is still the latest
//! issued and the resource is still waiting; anything else is stale and dropped.

/// Resources whose loads can overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Line list and metadata for the active city.
    Catalog,
    /// Stations on the selected lines.
    Availability,
    /// Stations reachable from the start station.
    Reachability,
    /// The single in-flight game operation (random, endpoints, submit, reveal, query).
    Operation,
}

impl Resource {
    const ALL: [Resource; 4] = [
        Resource::Catalog,
        Resource::Availability,
        Resource::Reachability,
        Resource::Operation,
    ];

    fn index(self) -> usize {
        match self {
            Resource::Catalog => 0,
            Resource::Availability => 1,
            Resource::Reachability => 2,
            Resource::Operation => 3,
        }
    }
}

/// Stamp carried by a request and echoed by its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    /// Resource the request targets.
    pub resource: Resource,
    /// Sequence number within that resource.
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    issued: u64,
    pending: bool,
}

/// Latest issued token and in-flight flag for each resource.
#[derive(Debug, Clone, Default)]
pub struct SequenceTokens {
    slots: [Slot; 4],
}

impl SequenceTokens {
    /// Issue a new token, superseding any outstanding one.
    pub fn issue(&mut self, resource: Resource) -> Token {
        let slot = &mut self.slots[resource.index()];
        slot.issued += 1;
        slot.pending = true;
        Token {
            resource,
            seq: slot.issued,
        }
    }

    /// Whether `token` is the latest one and still awaited.
    pub fn is_current(&self, token: Token) -> bool {
        let slot = &self.slots[token.resource.index()];
        slot.pending && slot.issued == token.seq
    }

    /// Accept the final response for `token`. Returns false for stale tokens.
    pub fn complete(&mut self, token: Token) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.slots[token.resource.index()].pending = false;
        true
    }

    /// Advance past any outstanding request without issuing a new one.
    pub fn invalidate(&mut self, resource: Resource) {
        let slot = &mut self.slots[resource.index()];
        slot.issued += 1;
        slot.pending = false;
    }

    /// Invalidate every resource.
    pub fn invalidate_all(&mut self) {
        for resource in Resource::ALL {
            self.invalidate(resource);
        }
    }

    /// Whether a request for `resource` is outstanding.
    pub fn is_pending(&self, resource: Resource) -> bool {
        self.slots[resource.index()].pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_token_supersedes_older() {
        let mut tokens = SequenceTokens::default();
        let first = tokens.issue(Resource::Availability);
        let second = tokens.issue(Resource::Availability);
        assert!(!tokens.complete(first));
        assert!(tokens.complete(second));
        assert!(!tokens.complete(second), "a token completes once");
        assert!(!tokens.is_pending(Resource::Availability));
    }

    #[test]
    fn resources_are_independent() {
        let mut tokens = SequenceTokens::default();
        let reach = tokens.issue(Resource::Reachability);
        let avail = tokens.issue(Resource::Availability);
        tokens.invalidate(Resource::Availability);
        assert!(!tokens.is_current(avail));
        assert!(tokens.is_current(reach));
    }

    #[test]
    fn invalidate_all_discards_everything_in_flight() {
        let mut tokens = SequenceTokens::default();
        let issued: Vec<Token> = Resource::ALL.iter().map(|r| tokens.issue(*r)).collect();
        tokens.invalidate_all();
        assert!(issued.into_iter().all(|token| !tokens.is_current(token)));
    }
}
