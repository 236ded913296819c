//! Plan Catalog
//!
//! The subscription tiers and add-ons sold by the storefront. Prices
//! are fixed in Ethiopian birr and never computed client-side from
//! anything the user can edit.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Charge currency for every plan
pub const CURRENCY: &str = "ETB";

/// Subscription tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanTier {
    Basic,
    SecondTier,
    ThirdTier,
}

impl PlanTier {
    pub fn all() -> [PlanTier; 3] {
        [PlanTier::Basic, PlanTier::SecondTier, PlanTier::ThirdTier]
    }

    /// Display title, also sent to the backend as the plan name
    pub fn title(&self) -> &'static str {
        match self {
            PlanTier::Basic => "Basic Plan",
            PlanTier::SecondTier => "Second Tier",
            PlanTier::ThirdTier => "Third Tier",
        }
    }

    pub fn price(&self) -> Decimal {
        match self {
            PlanTier::Basic => dec!(12500),
            PlanTier::SecondTier => dec!(25000),
            PlanTier::ThirdTier => dec!(35000),
        }
    }
}

/// Optional extras added on top of a tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddOn {
    MobileApp,
    ExtendedSupport,
}

impl AddOn {
    pub fn all() -> [AddOn; 2] {
        [AddOn::MobileApp, AddOn::ExtendedSupport]
    }

    pub fn label(&self) -> &'static str {
        match self {
            AddOn::MobileApp => "Mobile App",
            AddOn::ExtendedSupport => "Extended Support",
        }
    }

    pub fn price(&self) -> Decimal {
        match self {
            AddOn::MobileApp => dec!(10000),
            AddOn::ExtendedSupport => dec!(5000),
        }
    }
}

/// A tier plus any chosen add-ons
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSelection {
    pub tier: PlanTier,
    pub add_ons: Vec<AddOn>,
}

impl PlanSelection {
    pub fn new(tier: PlanTier) -> Self {
        Self {
            tier,
            add_ons: Vec::new(),
        }
    }

    pub fn with_add_on(mut self, add_on: AddOn) -> Self {
        if !self.add_ons.contains(&add_on) {
            self.add_ons.push(add_on);
        }
        self
    }

    /// Add the add-on if absent, remove it if present
    pub fn toggle_add_on(&mut self, add_on: AddOn) {
        if let Some(index) = self.add_ons.iter().position(|a| *a == add_on) {
            self.add_ons.remove(index);
        } else {
            self.add_ons.push(add_on);
        }
    }

    /// Amount to charge for this selection
    pub fn total(&self) -> Decimal {
        self.add_ons
            .iter()
            .fold(self.tier.price(), |sum, add_on| sum + add_on.price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_prices() {
        assert_eq!(PlanTier::Basic.price(), dec!(12500));
        assert_eq!(PlanTier::SecondTier.price(), dec!(25000));
        assert_eq!(PlanTier::ThirdTier.price(), dec!(35000));
    }

    #[test]
    fn test_selection_total_includes_add_ons() {
        let selection = PlanSelection::new(PlanTier::SecondTier)
            .with_add_on(AddOn::MobileApp)
            .with_add_on(AddOn::ExtendedSupport);

        assert_eq!(selection.total(), dec!(40000));
    }

    #[test]
    fn test_with_add_on_does_not_duplicate() {
        let selection = PlanSelection::new(PlanTier::Basic)
            .with_add_on(AddOn::MobileApp)
            .with_add_on(AddOn::MobileApp);

        assert_eq!(selection.add_ons.len(), 1);
        assert_eq!(selection.total(), dec!(22500));
    }

    #[test]
    fn test_toggle_add_on_flips_membership() {
        let mut selection = PlanSelection::new(PlanTier::Basic);

        selection.toggle_add_on(AddOn::ExtendedSupport);
        assert_eq!(selection.total(), dec!(17500));

        selection.toggle_add_on(AddOn::ExtendedSupport);
        assert_eq!(selection.total(), dec!(12500));
    }
}
