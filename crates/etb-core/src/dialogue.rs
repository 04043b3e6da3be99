//! Per-user expense entry dialogue.
//!
//! amount → category → subcategory → (label, for Misc buckets) → commit.
//! Transitions are computed by the pure [`advance`] function; [`DialogueEngine`]
//! owns the per-user sessions and performs the single ledger write on commit.

use std::{collections::HashMap, sync::Arc};

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    budget::{self, BACK_TOKEN},
    domain::{Category, NewExpense, UserId},
    ledger::LedgerStore,
    messaging::types::{Keyboard, Reply},
    money::{format_money, parse_amount, AmountError},
    replies,
};

/// Where a user's in-flight entry stands. Fields accumulate as the state advances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogueState {
    AwaitingAmount,
    AwaitingCategory {
        amount: Decimal,
    },
    AwaitingSubcategory {
        amount: Decimal,
        category: Category,
    },
    AwaitingLabel {
        amount: Decimal,
        category: Category,
        subcategory: String,
    },
}

/// Input that does not fit the current state's grammar. Never leaves this module
/// as an error: it becomes a re-prompt and the state is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid amount: {0}")]
    Amount(AmountError),
    #[error("unrecognized category")]
    Category,
    #[error("unrecognized subcategory")]
    Subcategory,
    #[error("empty label")]
    Label,
}

impl ValidationError {
    pub fn reprompt(self) -> Reply {
        let text = match self {
            ValidationError::Amount(_) => replies::INVALID_AMOUNT,
            ValidationError::Category => replies::INVALID_CATEGORY,
            ValidationError::Subcategory => replies::INVALID_SUBCATEGORY,
            ValidationError::Label => replies::INVALID_LABEL,
        };
        Reply::text(text)
    }
}

/// Fully collected entry, ready to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    pub amount: Decimal,
    pub category: Category,
    pub subcategory: String,
    pub label: Option<String>,
}

impl Draft {
    pub fn into_expense(self, user_id: UserId) -> NewExpense {
        NewExpense {
            user_id,
            category: self.category,
            subcategory: self.subcategory,
            amount: self.amount,
            label: self.label,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Move to a new state and send the prompt for it.
    Next(DialogueState, Reply),
    /// All fields collected; write the entry and end the session.
    Commit(Draft),
    /// Stay in the current state and re-prompt.
    Invalid(ValidationError),
}

/// Compute the effect of `input` in `state`. Pure: no I/O, no session mutation.
pub fn advance(state: &DialogueState, input: &str) -> Transition {
    match state {
        DialogueState::AwaitingAmount => match parse_amount(input) {
            Ok(amount) => Transition::Next(
                DialogueState::AwaitingCategory { amount },
                category_prompt(format!(
                    "Amount noted: {}.\nIs this a Need or a Want?",
                    format_money(amount)
                )),
            ),
            Err(e) => Transition::Invalid(ValidationError::Amount(e)),
        },

        DialogueState::AwaitingCategory { amount } => match Category::parse_input(input) {
            Some(category) => Transition::Next(
                DialogueState::AwaitingSubcategory {
                    amount: *amount,
                    category,
                },
                subcategory_prompt(category),
            ),
            None => Transition::Invalid(ValidationError::Category),
        },

        DialogueState::AwaitingSubcategory { amount, category } => {
            if input.trim() == BACK_TOKEN {
                return Transition::Next(
                    DialogueState::AwaitingCategory { amount: *amount },
                    category_prompt(replies::ASK_CATEGORY_AGAIN.to_string()),
                );
            }
            let Some(sub) = budget::find_subcategory(*category, input) else {
                return Transition::Invalid(ValidationError::Subcategory);
            };
            if budget::is_miscellaneous(sub) {
                return Transition::Next(
                    DialogueState::AwaitingLabel {
                        amount: *amount,
                        category: *category,
                        subcategory: sub.to_string(),
                    },
                    Reply::text(replies::ASK_LABEL).with_keyboard(Keyboard::Remove),
                );
            }
            Transition::Commit(Draft {
                amount: *amount,
                category: *category,
                subcategory: sub.to_string(),
                label: None,
            })
        }

        DialogueState::AwaitingLabel {
            amount,
            category,
            subcategory,
        } => {
            let label = input.trim();
            if label.is_empty() {
                return Transition::Invalid(ValidationError::Label);
            }
            Transition::Commit(Draft {
                amount: *amount,
                category: *category,
                subcategory: subcategory.clone(),
                label: Some(label.to_string()),
            })
        }
    }
}

fn category_prompt(text: String) -> Reply {
    Reply::text(text).with_keyboard(Keyboard::column(&[
        Category::Needs.title(),
        Category::Wants.title(),
    ]))
}

fn subcategory_prompt(category: Category) -> Reply {
    Reply::text(replies::ASK_SUBCATEGORY).with_keyboard(Keyboard::grid(
        budget::subcategories(category),
        2,
        Some(BACK_TOKEN),
    ))
}

/// `Logged $12.50 to Needs → Food (label).`
pub fn describe_logged(draft: &Draft) -> String {
    format!(
        "Logged {} to {} → {}{}.",
        format_money(draft.amount),
        draft.category.title(),
        draft.subcategory,
        label_suffix(draft.label.as_deref())
    )
}

pub(crate) fn label_suffix(label: Option<&str>) -> String {
    label.map(|l| format!(" ({l})")).unwrap_or_default()
}

type Slot = Arc<Mutex<Option<DialogueState>>>;

/// Owns every user's session.
///
/// The outer map lock is held only to look up a user's slot; the slot lock
/// serializes that one user's turns (including the commit write) while other
/// users proceed in parallel. Only `start` creates a slot, and a slot is
/// dropped again once its session ends and no other turn is waiting on it.
pub struct DialogueEngine {
    ledger: Arc<dyn LedgerStore>,
    sessions: Mutex<HashMap<UserId, Slot>>,
}

impl DialogueEngine {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self {
            ledger,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    async fn slot_of(&self, user_id: UserId) -> Option<Slot> {
        self.sessions.lock().await.get(&user_id).cloned()
    }

    async fn release_if_idle(&self, user_id: UserId, slot: Slot) {
        let mut map = self.sessions.lock().await;
        // One reference in the map, one held here.
        let idle = Arc::strong_count(&slot) == 2
            && slot.try_lock().map(|s| s.is_none()).unwrap_or(false);
        if idle && map.get(&user_id).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
            map.remove(&user_id);
        }
    }

    /// Begin a new entry. An unfinished session for this user is discarded
    /// without confirmation; re-entry is not queued.
    pub async fn start(&self, user_id: UserId) -> Reply {
        let slot = {
            let mut map = self.sessions.lock().await;
            map.entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .clone()
        };
        let mut session = slot.lock_owned().await;
        if let Some(previous) = session.replace(DialogueState::AwaitingAmount) {
            debug!(user_id = user_id.0, ?previous, "discarding unfinished entry");
        }
        Reply::text(replies::ASK_AMOUNT).with_keyboard(Keyboard::Remove)
    }

    #[cfg(test)]
    pub(crate) async fn state_of(&self, user_id: UserId) -> Option<DialogueState> {
        let slot = self.slot_of(user_id).await?;
        let state = slot.lock().await.clone();
        state
    }

    #[cfg(test)]
    pub(crate) async fn open_slots(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Feed one free-text message into the user's session.
    ///
    /// Returns `None` when the user has no active session so the caller can
    /// fall back to the menu.
    pub async fn handle_input(&self, user_id: UserId, input: &str) -> Option<Reply> {
        let slot = self.slot_of(user_id).await?;
        let mut session = slot.clone().lock_owned().await;

        let reply = match session.as_ref().map(|state| advance(state, input)) {
            None => None,
            Some(Transition::Next(next, reply)) => {
                debug!(user_id = user_id.0, ?next, "dialogue advanced");
                *session = Some(next);
                return Some(reply);
            }
            Some(Transition::Invalid(err)) => {
                debug!(user_id = user_id.0, %err, "re-prompting");
                return Some(err.reprompt());
            }
            Some(Transition::Commit(draft)) => {
                // The session ends whatever the outcome of the write.
                *session = None;
                Some(self.commit(user_id, draft).await)
            }
        };

        drop(session);
        self.release_if_idle(user_id, slot).await;
        reply
    }

    async fn commit(&self, user_id: UserId, draft: Draft) -> Reply {
        let text = describe_logged(&draft);
        match self.ledger.insert(draft.clone().into_expense(user_id)).await {
            Ok(entry_id) => {
                info!(
                    user_id = user_id.0,
                    entry_id = entry_id.0,
                    category = draft.category.as_str(),
                    subcategory = %draft.subcategory,
                    "expense logged"
                );
                Reply::text(text).with_keyboard(Keyboard::Remove)
            }
            Err(e) => {
                warn!(user_id = user_id.0, error = %e, "failed to log expense");
                Reply::text(format!(
                    "{}\n{}",
                    replies::STORAGE_FAILURE,
                    replies::ENTRY_ABANDONED
                ))
                .with_keyboard(Keyboard::Remove)
            }
        }
    }
}
