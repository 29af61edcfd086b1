use serde::{Deserialize, Serialize};

/// Limited pool of charges that absorb one s2/s3 event each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefenseService {
    charges: u32,
}

impl DefenseService {
    pub fn new(charges: u32) -> Self {
        Self { charges }
    }

    pub fn charges(&self) -> u32 {
        self.charges
    }

    pub fn add_charges(&mut self, amount: u32) {
        self.charges = self.charges.saturating_add(amount);
    }

    /// Uses one charge if any remain.
    pub fn consume(&mut self) -> bool {
        if self.charges == 0 {
            return false;
        }
        self.charges -= 1;
        true
    }
}
