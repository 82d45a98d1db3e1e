//! Dense boolean variable space.
//!
//! `x[g, t, s]` (guide g staffs tour t at slot s) occupies ids
//! `[0, G*T*S)`, guide-major. `y[t, s]` (tour t runs at slot s) follows
//! immediately after, tour-major.

use super::VarId;

/// What a variable id stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Assign { guide: usize, tour: usize, slot: usize },
    Active { tour: usize, slot: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableSpace {
    guides: usize,
    tours: usize,
    slots: usize,
}

impl VariableSpace {
    pub fn new(guides: usize, tours: usize, slots: usize) -> Self {
        VariableSpace { guides, tours, slots }
    }

    pub fn guides(&self) -> usize {
        self.guides
    }

    pub fn tours(&self) -> usize {
        self.tours
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Number of assignment variables.
    #[inline]
    pub fn assign_count(&self) -> usize {
        self.guides * self.tours * self.slots
    }

    /// Number of tour-active variables.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.tours * self.slots
    }

    /// Total number of variables.
    #[inline]
    pub fn len(&self) -> usize {
        self.assign_count() + self.active_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn assign(&self, guide: usize, tour: usize, slot: usize) -> VarId {
        debug_assert!(guide < self.guides && tour < self.tours && slot < self.slots);
        VarId((guide * self.tours + tour) * self.slots + slot)
    }

    #[inline]
    pub fn active(&self, tour: usize, slot: usize) -> VarId {
        debug_assert!(tour < self.tours && slot < self.slots);
        VarId(self.assign_count() + tour * self.slots + slot)
    }

    pub fn decode(&self, var: VarId) -> Option<Variable> {
        let id = var.0;
        if id < self.assign_count() {
            let slot = id % self.slots;
            let rest = id / self.slots;
            Some(Variable::Assign {
                guide: rest / self.tours,
                tour: rest % self.tours,
                slot,
            })
        } else if id < self.len() {
            let id = id - self.assign_count();
            Some(Variable::Active {
                tour: id / self.slots,
                slot: id % self.slots,
            })
        } else {
            None
        }
    }

    /// Iterate over every `(guide, tour, slot)` triple in id order.
    pub fn assignments(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..self.guides).flat_map(move |g| {
            (0..self.tours).flat_map(move |t| (0..self.slots).map(move |s| (g, t, s)))
        })
    }

    /// Stable variable names, indexed by id.
    pub fn names(&self) -> Vec<String> {
        (0..self.len())
            .filter_map(|id| self.decode(VarId(id)))
            .map(|var| match var {
                Variable::Assign { guide, tour, slot } => {
                    format!("assign_{}_{}_{}", guide, tour, slot)
                }
                Variable::Active { tour, slot } => format!("tour_{}_{}", tour, slot),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_disjoint() {
        let space = VariableSpace::new(2, 3, 5);
        assert_eq!(space.assign_count(), 30);
        assert_eq!(space.active_count(), 15);
        assert_eq!(space.len(), 45);

        let mut seen = vec![false; space.len()];
        for (g, t, s) in space.assignments() {
            let id = space.assign(g, t, s).0;
            assert!(!seen[id]);
            seen[id] = true;
        }
        for t in 0..3 {
            for s in 0..5 {
                let id = space.active(t, s).0;
                assert!(!seen[id]);
                seen[id] = true;
            }
        }
        assert!(seen.into_iter().all(|b| b));
    }

    #[test]
    fn test_decode_inverts_lookup() {
        let space = VariableSpace::new(3, 2, 4);
        assert_eq!(
            space.decode(space.assign(2, 1, 3)),
            Some(Variable::Assign { guide: 2, tour: 1, slot: 3 })
        );
        assert_eq!(
            space.decode(space.active(1, 2)),
            Some(Variable::Active { tour: 1, slot: 2 })
        );
        assert_eq!(space.decode(VarId(space.len())), None);
    }

    #[test]
    fn test_names() {
        let space = VariableSpace::new(1, 1, 2);
        assert_eq!(
            space.names(),
            vec!["assign_0_0_0", "assign_0_0_1", "tour_0_0", "tour_0_1"]
        );
    }
}
