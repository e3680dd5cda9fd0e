//! Reaction entity - aggregated emoji reactions on a message

use super::Emoji;

/// One emoji's reactions on a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub emoji: Emoji,
    /// Total of normal and burst (super) reactions
    pub count: u32,
    pub normal_count: u32,
    pub burst_count: u32,
    /// Whether you added a normal reaction
    pub me: bool,
    /// Whether you added a super reaction
    pub me_burst: bool,
    /// Hex colors of the super reaction animation
    pub burst_colors: Vec<String>,
}

impl Reaction {
    /// First reaction with this emoji
    pub fn first(emoji: Emoji, by_me: bool, burst: bool, burst_colors: Vec<String>) -> Self {
        Self {
            emoji,
            count: 0,
            normal_count: 0,
            burst_count: 0,
            me: false,
            me_burst: false,
            burst_colors,
        }
        .incremented(by_me, burst)
    }

    #[must_use]
    pub fn incremented(&self, by_me: bool, burst: bool) -> Self {
        let mut next = self.clone();
        next.count += 1;
        if burst {
            next.burst_count += 1;
            next.me_burst |= by_me;
        } else {
            next.normal_count += 1;
            next.me |= by_me;
        }
        next
    }

    #[must_use]
    pub fn decremented(&self, by_me: bool, burst: bool) -> Self {
        let mut next = self.clone();
        next.count = next.count.saturating_sub(1);
        if burst {
            next.burst_count = next.burst_count.saturating_sub(1);
            if by_me {
                next.me_burst = false;
            }
        } else {
            next.normal_count = next.normal_count.saturating_sub(1);
            if by_me {
                next.me = false;
            }
        }
        next
    }
}
