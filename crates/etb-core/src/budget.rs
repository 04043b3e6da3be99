//! Fixed budget taxonomy: subcategories per category, the miscellaneous
//! marker, and display targets.

use rust_decimal::Decimal;

use crate::domain::Category;

pub const NEEDS_SUBCATEGORIES: &[&str] = &[
    "Food",
    "Subscription",
    "Transport",
    "Groceries",
    "Misc Needs",
];
pub const WANTS_SUBCATEGORIES: &[&str] = &[
    "Dining Out",
    "Alcohol",
    "Dates",
    "Gifts",
    "Clothes",
    "Misc Wants",
];

/// Subcategories whose name starts with this need an extra label.
pub const MISC_PREFIX: &str = "Misc";

/// Button label that returns from subcategory selection to category selection.
pub const BACK_TOKEN: &str = "⬅ Back";

pub const DEFAULT_NEEDS_TARGET: Decimal = Decimal::from_parts(500, 0, 0, false, 0);
pub const DEFAULT_WANTS_TARGET: Decimal = Decimal::from_parts(300, 0, 0, false, 0);

pub fn subcategories(category: Category) -> &'static [&'static str] {
    match category {
        Category::Needs => NEEDS_SUBCATEGORIES,
        Category::Wants => WANTS_SUBCATEGORIES,
    }
}

/// Exact (trimmed) match against the list for `category`.
pub fn find_subcategory(category: Category, input: &str) -> Option<&'static str> {
    let wanted = input.trim();
    subcategories(category).iter().copied().find(|s| *s == wanted)
}

pub fn is_miscellaneous(subcategory: &str) -> bool {
    subcategory.starts_with(MISC_PREFIX)
}

/// Per-category spending ceilings, shown next to summary totals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetTargets {
    pub needs: Decimal,
    pub wants: Decimal,
}

impl BudgetTargets {
    pub fn for_category(&self, category: Category) -> Decimal {
        match category {
            Category::Needs => self.needs,
            Category::Wants => self.wants,
        }
    }
}

impl Default for BudgetTargets {
    fn default() -> Self {
        Self {
            needs: DEFAULT_NEEDS_TARGET,
            wants: DEFAULT_WANTS_TARGET,
        }
    }
}
