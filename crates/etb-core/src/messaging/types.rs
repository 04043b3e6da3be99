use crate::domain::{ChatId, UserId};

/// Cross-messenger incoming text message.
///
/// Transport-specific fields stay in the adapter crate.
#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: String,
}

/// What to do with the reply keyboard shown under the input field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Keyboard {
    /// Leave whatever keyboard is currently shown.
    #[default]
    Keep,
    /// Hide the reply keyboard.
    Remove,
    /// One-time keyboard; each inner vec is a row of button labels.
    Choices(Vec<Vec<String>>),
}

impl Keyboard {
    /// One button per row.
    pub fn column<S: AsRef<str>>(labels: &[S]) -> Self {
        Self::Choices(
            labels
                .iter()
                .map(|l| vec![l.as_ref().to_string()])
                .collect(),
        )
    }

    /// `per_row` buttons per row, plus optional trailing single-button row.
    pub fn grid<S: AsRef<str>>(labels: &[S], per_row: usize, trailer: Option<&str>) -> Self {
        let mut rows: Vec<Vec<String>> = labels
            .chunks(per_row.max(1))
            .map(|chunk| chunk.iter().map(|l| l.as_ref().to_string()).collect())
            .collect();
        if let Some(t) = trailer {
            rows.push(vec![t.to_string()]);
        }
        Self::Choices(rows)
    }
}

/// Plain-text reply plus keyboard instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Keep,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_pairs_buttons_and_appends_trailer() {
        let kb = Keyboard::grid(&["a", "b", "c"], 2, Some("back"));
        assert_eq!(
            kb,
            Keyboard::Choices(vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string()],
                vec!["back".to_string()],
            ])
        );
    }

    #[test]
    fn column_is_one_per_row() {
        let kb = Keyboard::column(&["Needs", "Wants"]);
        assert_eq!(
            kb,
            Keyboard::Choices(vec![vec!["Needs".to_string()], vec!["Wants".to_string()]])
        );
    }
}
