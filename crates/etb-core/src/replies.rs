//! Fixed user-facing texts shared by the dialogue and the dispatcher.

pub const MENU_TEXT: &str = "Here’s what I can do:\n\
/start → log an expense\n\
/needs → see Needs totals\n\
/wants → see Wants totals\n\
/undo → undo last entry\n\
/restart → clear all your data\n\
/help → show this menu";

pub const ASK_AMOUNT: &str = "How much did you spend? (e.g., 12.50)";
pub const ASK_CATEGORY_AGAIN: &str = "Choose again: Needs or Wants?";
pub const ASK_SUBCATEGORY: &str = "Pick a subcategory:";
pub const ASK_LABEL: &str = "Enter a short label for this Misc item:";

pub const INVALID_AMOUNT: &str = "Please enter a valid positive number.";
pub const INVALID_CATEGORY: &str = "Please choose Needs or Wants.";
pub const INVALID_SUBCATEGORY: &str = "Please pick from the buttons.";
pub const INVALID_LABEL: &str = "Please enter a non-empty label.";

pub const NO_EXPENSES: &str = "No expenses yet.";
pub const NOTHING_TO_UNDO: &str = "Nothing to undo.";
pub const CLEARED: &str = "All your data cleared. ✅";

pub const STORAGE_FAILURE: &str =
    "⚠️ Could not reach the ledger. Nothing was changed; please try again.";
pub const ENTRY_ABANDONED: &str = "Use /start to begin again.";
