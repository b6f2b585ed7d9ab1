//! Submission window selection
//!
//! Pure function from the full entry sequence to the bounded subsequence
//! actually sent to the backend: the leading system entry (always, when
//! present) plus the most recent turns up to a fixed number of assistant
//! replies.

use crate::session::{Message, Role};

/// Selects the window for one submission.
///
/// Scans the non-system entries from most recent backwards and stops as soon
/// as `max_assistant_turns` assistant entries have been collected, so the
/// result never holds more assistant replies than that. The cut lands right
/// on the oldest counted assistant, which therefore arrives without its
/// paired user entry; a dangling trailing user entry awaiting its reply is
/// always kept. Chronological order is preserved.
pub fn submission_window(entries: &[Message], max_assistant_turns: usize) -> Vec<Message> {
    let (system, rest) = match entries.first() {
        Some(first) if first.role == Role::System => (Some(first), &entries[1..]),
        _ => (None, entries),
    };

    let mut recent: Vec<Message> = Vec::new();
    let mut assistant_seen = 0;
    for entry in rest.iter().rev() {
        recent.push(entry.clone());
        if entry.role == Role::Assistant {
            assistant_seen += 1;
        }
        if assistant_seen >= max_assistant_turns {
            break;
        }
    }
    recent.reverse();

    match system {
        Some(system) => std::iter::once(system.clone()).chain(recent).collect(),
        None => recent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(count: usize) -> Vec<Message> {
        let mut entries = vec![Message::system("layout rules")];
        for i in 1..=count {
            entries.push(Message::user(format!("query {i}")));
            entries.push(Message::assistant(format!("reply {i}")));
        }
        entries
    }

    fn assistant_count(window: &[Message]) -> usize {
        window.iter().filter(|m| m.role == Role::Assistant).count()
    }

    #[test]
    fn short_history_passes_through_whole() {
        let entries = turns(3);
        let window = submission_window(&entries, 5);
        assert_eq!(window, entries);
    }

    #[test]
    fn caps_assistant_entries_and_keeps_system_first() {
        let entries = turns(7);
        let window = submission_window(&entries, 5);

        assert_eq!(window[0].role, Role::System);
        assert_eq!(assistant_count(&window), 5);
        // The scan stops on the 5th assistant reply counted backwards, so the
        // window opens with "reply 3" while "query 3" falls outside it.
        assert_eq!(window[1].content, "reply 3");
        assert_eq!(window[2].content, "query 4");
        assert_eq!(window.last().unwrap().content, "reply 7");
        assert_eq!(window.len(), 10);
    }

    #[test]
    fn dangling_user_entry_is_included() {
        let mut entries = turns(6);
        entries.push(Message::user("query 7"));
        let window = submission_window(&entries, 5);

        assert_eq!(window.last().unwrap().content, "query 7");
        assert_eq!(assistant_count(&window), 5);
        // 1 system + the capped tail ("reply 2" through "reply 6") + the
        // unanswered user entry.
        assert_eq!(window[1].content, "reply 2");
        assert_eq!(window.len(), 11);
    }

    #[test]
    fn works_without_a_system_entry() {
        let entries = vec![
            Message::user("query 1"),
            Message::assistant("reply 1"),
            Message::user("query 2"),
        ];
        let window = submission_window(&entries, 5);
        assert_eq!(window, entries);
    }

    #[test]
    fn empty_sequence_yields_empty_window() {
        assert!(submission_window(&[], 5).is_empty());
    }

    #[test]
    fn window_is_chronological() {
        let entries = turns(8);
        let window = submission_window(&entries, 5);
        let mut last_index = 0;
        for entry in &window[1..] {
            let index = entries.iter().position(|e| e == entry).unwrap();
            assert!(index > last_index);
            last_index = index;
        }
    }
}
