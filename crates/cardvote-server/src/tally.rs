//! Result of a completed vote.

use cardvote_types::ServerEvent;
use std::collections::HashSet;

/// Cards chosen in a room and a log line per player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VotingResult {
    /// Distinct cards in order of first appearance.
    pub cards: Vec<String>,
    /// One line per player, in join order.
    pub logs: Vec<String>,
}

impl VotingResult {
    pub fn into_event(self) -> ServerEvent {
        ServerEvent::voting_completed(self.cards, self.logs)
    }
}

/// Tally the ballots of a room, given as `(user name, selections)` in join order.
pub fn tally<'a, I>(ballots: I) -> VotingResult
where
    I: IntoIterator<Item = (&'a str, &'a [String])>,
{
    let mut seen = HashSet::new();
    let mut result = VotingResult::default();

    for (user_name, selections) in ballots {
        result.logs.push(log_line(user_name, selections));
        for selection in selections {
            if seen.insert(selection.as_str()) {
                result.cards.push(selection.clone());
            }
        }
    }

    result
}

/// `{name}は「a」と「b」を指定しました。`
pub fn log_line(user_name: &str, selections: &[String]) -> String {
    let quoted: Vec<String> = selections.iter().map(|s| format!("「{}」", s)).collect();
    format!("{}は{}を指定しました。", user_name, quoted.join("と"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_log_line_format() {
        assert_eq!(
            log_line("alice", &strings(&["村", "鍛冶屋"])),
            "aliceは「村」と「鍛冶屋」を指定しました。"
        );
        assert_eq!(log_line("bob", &strings(&["堀"])), "bobは「堀」を指定しました。");
    }

    #[test]
    fn test_cards_deduplicated_in_first_seen_order() {
        let alice = strings(&["Smithy", "Village"]);
        let bob = strings(&["Moat", "Smithy"]);
        let carol = strings(&["Village", "Chapel"]);

        let result = tally([
            ("alice", alice.as_slice()),
            ("bob", bob.as_slice()),
            ("carol", carol.as_slice()),
        ]);

        assert_eq!(result.cards, strings(&["Smithy", "Village", "Moat", "Chapel"]));
        assert_eq!(result.logs.len(), 3);
        assert!(result.logs[1].starts_with("bobは"));
    }

    #[test]
    fn test_into_event() {
        let ballot = strings(&["Moat"]);
        let event = tally([("alice", ballot.as_slice())]).into_event();
        assert_eq!(
            event,
            ServerEvent::voting_completed(
                strings(&["Moat"]),
                strings(&["aliceは「Moat」を指定しました。"])
            )
        );
    }
}
