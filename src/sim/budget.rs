use crate::error::ActionError;

/// Default number of actions a faction may take per turn.
pub const DEFAULT_ACTIONS_PER_TURN: u32 = 8;

/// Per-turn action allotment. One unit per discrete action; units taken for
/// an action that is then rejected go back with [`ActionBudget::refund`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionBudget {
    per_turn: u32,
    remaining: u32,
}

impl ActionBudget {
    pub fn new(per_turn: u32) -> Self {
        Self {
            per_turn,
            remaining: per_turn,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn per_turn(&self) -> u32 {
        self.per_turn
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn consume(&mut self) -> Result<(), ActionError> {
        if self.remaining == 0 {
            return Err(ActionError::BudgetExhausted);
        }
        self.remaining -= 1;
        Ok(())
    }

    /// Give back a unit taken this turn. Never exceeds the allotment.
    pub fn refund(&mut self) {
        self.remaining = (self.remaining + 1).min(self.per_turn);
    }

    pub fn reset(&mut self) {
        self.remaining = self.per_turn;
    }
}

impl Default for ActionBudget {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIONS_PER_TURN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_until_exhausted() {
        let mut budget = ActionBudget::new(2);
        assert!(budget.consume().is_ok());
        assert!(budget.consume().is_ok());
        assert!(budget.is_exhausted());
        assert_eq!(budget.consume(), Err(ActionError::BudgetExhausted));
    }

    #[test]
    fn refund_is_capped() {
        let mut budget = ActionBudget::new(3);
        budget.refund();
        assert_eq!(budget.remaining(), 3);
        budget.consume().unwrap();
        budget.refund();
        assert_eq!(budget.remaining(), 3);
    }

    #[test]
    fn reset_restores_allotment() {
        let mut budget = ActionBudget::default();
        for _ in 0..5 {
            budget.consume().unwrap();
        }
        budget.reset();
        assert_eq!(budget.remaining(), DEFAULT_ACTIONS_PER_TURN);
    }
}
