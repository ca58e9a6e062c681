//! Ordered list of the effects currently in the signal path
//!
//! The chain is a cached view: it only names which effects run, in the fixed
//! order chorus -> delay -> reverb. The engine owns the effects themselves and
//! rebuilds the chain between blocks.

use super::EffectKind;

/// Active effect sequence (at most one entry per kind)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectsChain {
    slots: [Option<EffectKind>; 3],
    len: usize,
}

impl EffectsChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the chain from a per-kind activity test
    pub fn rebuild(&mut self, mut is_active: impl FnMut(EffectKind) -> bool) {
        self.slots = [None; 3];
        self.len = 0;
        for kind in EffectKind::ORDER {
            if is_active(kind) {
                self.slots[self.len] = Some(kind);
                self.len += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.iter().any(|k| k == kind)
    }

    /// Effects in processing order
    pub fn iter(&self) -> impl Iterator<Item = EffectKind> + '_ {
        self.slots[..self.len].iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain() {
        let mut chain = EffectsChain::new();
        chain.rebuild(|_| false);
        assert!(chain.is_empty());
        assert_eq!(chain.iter().count(), 0);
    }

    #[test]
    fn test_fixed_order() {
        let mut chain = EffectsChain::new();
        chain.rebuild(|_| true);
        let order: Vec<EffectKind> = chain.iter().collect();
        assert_eq!(
            order,
            vec![EffectKind::Chorus, EffectKind::Delay, EffectKind::Reverb]
        );
    }

    #[test]
    fn test_rebuild_drops_inactive() {
        let mut chain = EffectsChain::new();
        chain.rebuild(|_| true);
        chain.rebuild(|kind| kind != EffectKind::Delay);

        let order: Vec<EffectKind> = chain.iter().collect();
        assert_eq!(order, vec![EffectKind::Chorus, EffectKind::Reverb]);
        assert!(!chain.contains(EffectKind::Delay));
        assert_eq!(chain.len(), 2);
    }
}
