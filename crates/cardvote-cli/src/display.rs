//! Plain-text rendering of room events.

use cardvote_types::{RoomOverview, ServerEvent, UserStatus};

/// One line per player: `name - 選択完了` once submitted, `name - 選択中` before.
pub fn render_users(users: &[UserStatus]) -> String {
    users
        .iter()
        .map(|user| {
            let state = if user.submitted { "選択完了" } else { "選択中" };
            format!("{} - {}", user.user_name, state)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_result(cards: &[String], logs: &[String]) -> String {
    let mut out = String::from("Cards:\n");
    for card in cards {
        out.push_str(&format!("  {}\n", card));
    }
    out.push_str("Log:\n");
    for line in logs {
        out.push_str(&format!("  {}\n", line));
    }
    out
}

pub fn render_event(event: &ServerEvent) -> String {
    match event {
        ServerEvent::UsersUpdated { users } => render_users(users),
        ServerEvent::VotingCompleted { cards, logs } => render_result(cards, logs),
    }
}

pub fn render_overview(overview: &RoomOverview) -> String {
    if overview.is_empty() {
        return "No open rooms.".to_string();
    }
    overview
        .iter()
        .map(|(room, users)| format!("{} ({}): {}", room, users.len(), users.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}
