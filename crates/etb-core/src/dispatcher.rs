//! Top-level routing: commands first, then the user's dialogue, then the menu.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{
    budget::BudgetTargets,
    dialogue::{label_suffix, DialogueEngine},
    domain::{Category, ExpenseEntry, SubcategoryTotal, UserId},
    ledger::LedgerStore,
    messaging::types::{Keyboard, Reply, TextMessage},
    money::format_money,
    replies,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    StartEntry,
    Summary(Category),
    Undo,
    ClearAll,
    Help,
}

impl Command {
    /// Recognize a command message. Case-sensitive; tolerates a `@botname`
    /// suffix on the command word. Anything else starting with `/` is `Help`.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let word = trimmed.strip_prefix('/')?;
        let name = word.split('@').next().unwrap_or("");

        Some(match name {
            "start" => Command::StartEntry,
            "needs" => Command::Summary(Category::Needs),
            "wants" => Command::Summary(Category::Wants),
            "undo" => Command::Undo,
            "restart" => Command::ClearAll,
            _ => Command::Help,
        })
    }
}

/// Routes every inbound text message for every user.
pub struct Dispatcher {
    ledger: Arc<dyn LedgerStore>,
    dialogue: DialogueEngine,
    targets: BudgetTargets,
}

impl Dispatcher {
    pub fn new(ledger: Arc<dyn LedgerStore>, targets: BudgetTargets) -> Self {
        Self {
            dialogue: DialogueEngine::new(ledger.clone()),
            ledger,
            targets,
        }
    }

    #[cfg(test)]
    pub(crate) fn dialogue(&self) -> &DialogueEngine {
        &self.dialogue
    }

    pub async fn handle(&self, msg: &TextMessage) -> Reply {
        let user_id = msg.user_id;
        if let Some(cmd) = Command::parse(&msg.text) {
            info!(
                user_id = user_id.0,
                username = msg.username.as_deref().unwrap_or("unknown"),
                ?cmd,
                "command"
            );
            return self.run_command(user_id, cmd).await;
        }

        match self.dialogue.handle_input(user_id, &msg.text).await {
            Some(reply) => reply,
            None => Reply::text(replies::MENU_TEXT),
        }
    }

    pub async fn run_command(&self, user_id: UserId, cmd: Command) -> Reply {
        match cmd {
            Command::StartEntry => self.dialogue.start(user_id).await,
            Command::Summary(category) => self.summary(user_id, category).await,
            Command::Undo => self.undo(user_id).await,
            Command::ClearAll => self.clear_all(user_id).await,
            Command::Help => Reply::text(replies::MENU_TEXT),
        }
    }

    async fn summary(&self, user_id: UserId, category: Category) -> Reply {
        match self.ledger.summarize(user_id, category).await {
            Ok(rows) if rows.is_empty() => Reply::text(replies::NO_EXPENSES),
            Ok(rows) => Reply::text(render_summary(
                category,
                &rows,
                self.targets.for_category(category),
            )),
            Err(e) => storage_failure(user_id, "summary", &e),
        }
    }

    async fn undo(&self, user_id: UserId) -> Reply {
        match self.ledger.delete_most_recent(user_id).await {
            Ok(Some(entry)) => {
                info!(user_id = user_id.0, entry_id = entry.id.0, "entry removed");
                Reply::text(describe_removed(&entry))
            }
            Ok(None) => Reply::text(replies::NOTHING_TO_UNDO),
            Err(e) => storage_failure(user_id, "undo", &e),
        }
    }

    async fn clear_all(&self, user_id: UserId) -> Reply {
        match self.ledger.delete_all(user_id).await {
            Ok(count) => {
                info!(user_id = user_id.0, count, "entries cleared");
                Reply::text(replies::CLEARED).with_keyboard(Keyboard::Remove)
            }
            Err(e) => storage_failure(user_id, "clear", &e),
        }
    }
}

fn storage_failure(user_id: UserId, op: &str, err: &crate::Error) -> Reply {
    warn!(user_id = user_id.0, op, error = %err, "ledger operation failed");
    Reply::text(replies::STORAGE_FAILURE)
}

/// Summary body: one bullet per subcategory, then total against target.
pub fn render_summary(category: Category, rows: &[SubcategoryTotal], target: Decimal) -> String {
    let total: Decimal = rows.iter().map(|r| r.total).sum();
    let lines = rows
        .iter()
        .map(|r| format!("• {}: {}", r.subcategory, format_money(r.total)))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "📊 {} summary\n{lines}\n\nTotal: {} / {}",
        category.title(),
        format_money(total),
        format_money(target)
    )
}

pub fn describe_removed(entry: &ExpenseEntry) -> String {
    format!(
        "Removed last entry: {} from {} → {}{}.",
        format_money(entry.amount),
        entry.category.title(),
        entry.subcategory,
        label_suffix(entry.label.as_deref())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dialogue::DialogueState,
        domain::{ChatId, EntryId, NewExpense},
        errors::Error,
        ledger::memory::InMemoryLedger,
        Result,
    };
    use async_trait::async_trait;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Delegates to an in-memory ledger until switched off.
    #[derive(Default)]
    struct FlakyLedger {
        inner: InMemoryLedger,
        down: AtomicBool,
    }

    impl FlakyLedger {
        fn check(&self) -> Result<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(Error::storage("pool timed out"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl LedgerStore for FlakyLedger {
        async fn insert(&self, expense: NewExpense) -> Result<EntryId> {
            self.check()?;
            self.inner.insert(expense).await
        }
        async fn delete_most_recent(&self, user_id: UserId) -> Result<Option<ExpenseEntry>> {
            self.check()?;
            self.inner.delete_most_recent(user_id).await
        }
        async fn delete_all(&self, user_id: UserId) -> Result<u64> {
            self.check()?;
            self.inner.delete_all(user_id).await
        }
        async fn summarize(
            &self,
            user_id: UserId,
            category: Category,
        ) -> Result<Vec<SubcategoryTotal>> {
            self.check()?;
            self.inner.summarize(user_id, category).await
        }
    }

    fn msg(user: i64, text: &str) -> TextMessage {
        TextMessage {
            chat_id: ChatId(user),
            user_id: UserId(user),
            username: None,
            text: text.to_string(),
        }
    }

    fn setup() -> (Arc<FlakyLedger>, Dispatcher) {
        let ledger = Arc::new(FlakyLedger::default());
        let d = Dispatcher::new(ledger.clone(), BudgetTargets::default());
        (ledger, d)
    }

    async fn log(d: &Dispatcher, user: i64, amount: &str, cat: &str, sub: &str) -> Reply {
        d.handle(&msg(user, "/start")).await;
        d.handle(&msg(user, amount)).await;
        d.handle(&msg(user, cat)).await;
        d.handle(&msg(user, sub)).await
    }

    #[test]
    fn parses_command_surface() {
        assert_eq!(Command::parse("/start"), Some(Command::StartEntry));
        assert_eq!(Command::parse("/needs@budget_bot"), Some(Command::Summary(Category::Needs)));
        assert_eq!(Command::parse("/wants"), Some(Command::Summary(Category::Wants)));
        assert_eq!(Command::parse("/undo"), Some(Command::Undo));
        assert_eq!(Command::parse("/restart"), Some(Command::ClearAll));
        assert_eq!(Command::parse("/Start"), Some(Command::Help));
        assert_eq!(Command::parse("/whatever"), Some(Command::Help));
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse("12.50"), None);
    }

    #[tokio::test]
    async fn summary_totals_against_target() {
        let (_, d) = setup();
        log(&d, 1, "10.00", "needs", "Food").await;
        log(&d, 1, "5.50", "needs", "Food").await;
        log(&d, 1, "2", "needs", "Transport").await;
        log(&d, 2, "99", "needs", "Food").await;

        let reply = d.handle(&msg(1, "/needs")).await;
        assert_eq!(
            reply.text,
            "📊 Needs summary\n• Food: $15.50\n• Transport: $2.00\n\nTotal: $17.50 / $500.00"
        );

        let empty = d.handle(&msg(1, "/wants")).await;
        assert_eq!(empty.text, replies::NO_EXPENSES);
    }

    #[tokio::test]
    async fn undo_walks_back_in_insertion_order() {
        let (_, d) = setup();
        log(&d, 1, "1", "needs", "Food").await;
        log(&d, 1, "2", "wants", "Gifts").await;
        log(&d, 1, "3", "needs", "Transport").await;

        assert_eq!(
            d.handle(&msg(1, "/undo")).await.text,
            "Removed last entry: $3.00 from Needs → Transport."
        );
        assert_eq!(
            d.handle(&msg(1, "/undo")).await.text,
            "Removed last entry: $2.00 from Wants → Gifts."
        );
        assert_eq!(
            d.handle(&msg(1, "/undo")).await.text,
            "Removed last entry: $1.00 from Needs → Food."
        );
        assert_eq!(d.handle(&msg(1, "/undo")).await.text, replies::NOTHING_TO_UNDO);
    }

    #[tokio::test]
    async fn undo_reply_names_the_label() {
        let (ledger, d) = setup();
        d.handle(&msg(1, "/start")).await;
        d.handle(&msg(1, "4.20")).await;
        d.handle(&msg(1, "wants")).await;
        d.handle(&msg(1, "Misc Wants")).await;
        d.handle(&msg(1, "parking")).await;

        assert_eq!(
            d.handle(&msg(1, "/undo")).await.text,
            "Removed last entry: $4.20 from Wants → Misc Wants (parking)."
        );
        assert!(ledger.inner.entries_for(UserId(1)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_all_always_reports_success() {
        let (ledger, d) = setup();
        assert_eq!(d.handle(&msg(1, "/restart")).await.text, replies::CLEARED);
        assert_eq!(d.handle(&msg(1, "/restart")).await.text, replies::CLEARED);

        log(&d, 1, "4", "wants", "Dates").await;
        log(&d, 2, "4", "wants", "Dates").await;
        assert_eq!(d.handle(&msg(1, "/restart")).await.text, replies::CLEARED);
        assert!(ledger.inner.entries_for(UserId(1)).unwrap().is_empty());
        assert_eq!(ledger.inner.entries_for(UserId(2)).unwrap().len(), 1);
    }

    #[test]
    fn menu_lists_every_command() {
        for cmd in ["/start", "/needs", "/wants", "/undo", "/restart", "/help"] {
            assert!(replies::MENU_TEXT.contains(cmd), "{cmd}");
            assert!(Command::parse(cmd).is_some());
        }
    }

    #[tokio::test]
    async fn free_text_without_session_gets_menu() {
        let (_, d) = setup();
        assert_eq!(d.handle(&msg(1, "hello")).await.text, replies::MENU_TEXT);
        assert_eq!(d.handle(&msg(1, "/help")).await.text, replies::MENU_TEXT);
    }

    #[tokio::test]
    async fn commands_bypass_active_session() {
        let (_, d) = setup();
        log(&d, 1, "8", "needs", "Food").await;

        d.handle(&msg(1, "/start")).await;
        d.handle(&msg(1, "6")).await;
        let summary = d.handle(&msg(1, "/needs")).await;
        assert!(summary.text.contains("Food: $8.00"));

        // Session survived the command and still expects a category.
        assert!(matches!(
            d.dialogue().state_of(UserId(1)).await,
            Some(DialogueState::AwaitingCategory { .. })
        ));
        let next = d.handle(&msg(1, "wants")).await;
        assert_eq!(next.text, replies::ASK_SUBCATEGORY);
    }

    #[tokio::test]
    async fn storage_outage_is_reported_without_mutation() {
        let (ledger, d) = setup();
        log(&d, 1, "3", "needs", "Food").await;
        ledger.down.store(true, Ordering::SeqCst);

        for cmd in ["/needs", "/undo", "/restart"] {
            let reply = d.handle(&msg(1, cmd)).await;
            assert_eq!(reply.text, replies::STORAGE_FAILURE, "{cmd}");
        }

        let failed = log(&d, 1, "5", "needs", "Food").await;
        assert!(failed.text.starts_with(replies::STORAGE_FAILURE));
        assert!(d.dialogue().state_of(UserId(1)).await.is_none());

        ledger.down.store(false, Ordering::SeqCst);
        let rows = ledger.inner.entries_for(UserId(1)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, Decimal::from_str("3.00").unwrap());
    }
}
