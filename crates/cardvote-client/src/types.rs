use anyhow::{bail, Result};
use cardvote_types::{RoomId, RoomRules, DEFAULT_SELECTION};

/// Backend used when `BACKEND_URL` is not set.
pub const DEFAULT_BACKEND_URL: &str = "ws://localhost:8000";

/// Backend URL from `BACKEND_URL`, falling back to [`DEFAULT_BACKEND_URL`].
pub fn backend_url_from_env() -> String {
    std::env::var("BACKEND_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

/// Map a socket URL onto the HTTP URL of the same service.
pub fn http_base_url(backend_url: &str) -> String {
    let url = backend_url.trim_end_matches('/');
    if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else {
        url.to_string()
    }
}

/// Socket URL of a player connection: `{backend}/{room_id}/{user_id}`.
pub fn socket_url(backend_url: &str, room_id: &RoomId, user_id: &cardvote_types::UserId) -> String {
    format!(
        "{}/{}/{}",
        backend_url.trim_end_matches('/'),
        room_id,
        user_id
    )
}

/// Link to a room page on the web frontend.
pub fn room_url(frontend_url: &str, room_id: &RoomId) -> String {
    format!("{}/{}/", frontend_url.trim_end_matches('/'), room_id)
}

/// A player's selection slots before submission.
///
/// Every slot starts out as [`DEFAULT_SELECTION`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDraft {
    slots: Vec<String>,
}

impl SelectionDraft {
    pub fn new(rules: RoomRules) -> Self {
        Self {
            slots: vec![DEFAULT_SELECTION.to_string(); rules.selections_per_user()],
        }
    }

    /// Replace the card in one slot.
    pub fn set(&mut self, index: usize, card: impl Into<String>) -> Result<()> {
        let len = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = card.into();
                Ok(())
            }
            None => bail!("Selection slot {} out of range (room allows {})", index, len),
        }
    }

    /// Fill slots from the front with the given cards.
    pub fn fill<I, S>(&mut self, cards: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (index, card) in cards.into_iter().enumerate() {
            self.set(index, card)?;
        }
        Ok(())
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn into_selections(self) -> Vec<String> {
        self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_base_url() {
        assert_eq!(http_base_url("ws://localhost:8000"), "http://localhost:8000");
        assert_eq!(http_base_url("wss://vote.example/"), "https://vote.example");
        assert_eq!(http_base_url("http://127.0.0.1:1"), "http://127.0.0.1:1");
    }

    #[test]
    fn test_urls() {
        let room = RoomId::parse("4abcdef0").unwrap();
        let user = cardvote_types::UserId::parse("u1").unwrap();
        assert_eq!(
            socket_url("ws://localhost:8000/", &room, &user),
            "ws://localhost:8000/4abcdef0/u1"
        );
        assert_eq!(
            room_url("http://localhost:3000", &room),
            "http://localhost:3000/4abcdef0/"
        );
    }

    #[test]
    fn test_selection_draft() {
        let rules = RoomRules::new(2, 3).unwrap();
        let mut draft = SelectionDraft::new(rules);
        assert_eq!(draft.slots(), &[DEFAULT_SELECTION; 3]);

        draft.fill(["Moat", "Chapel"]).unwrap();
        assert!(draft.set(3, "Witch").is_err());
        assert_eq!(
            draft.into_selections(),
            vec!["Moat".to_string(), "Chapel".to_string(), DEFAULT_SELECTION.to_string()]
        );
    }

    #[test]
    fn test_selection_draft_rejects_too_many_cards() {
        let mut draft = SelectionDraft::new(RoomRules::new(2, 1).unwrap());
        assert!(draft.fill(["Moat", "Chapel"]).is_err());
    }
}
