use serde::Serialize;

use crate::events::{EventPayload, ToastVariant, VoteChoice};
use crate::format::short_address;

/// Text of a toast shown for a relayed event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
}

impl Notification {
    pub fn render(payload: &EventPayload) -> Self {
        match payload {
            EventPayload::Vote(vote) => {
                let (mark, word) = match vote.vote {
                    VoteChoice::Yes => ("✅", "YES"),
                    VoteChoice::No => ("❌", "NO"),
                };
                let voter = vote
                    .actor_address
                    .as_deref()
                    .map(short_address)
                    .unwrap_or_else(|| "Someone".to_string());
                Notification {
                    title: format!("{mark} {voter} voted {word}!"),
                    description: Some(format!(
                        "On {} blockchain • Pool: {}",
                        vote.blockchain.display_name(),
                        vote.pool_id
                    )),
                    variant: ToastVariant::Default,
                }
            }
            EventPayload::PoolCreated(pool) => Notification {
                title: format!("🎯 New {} Pool Created!", pool.blockchain.display_name()),
                description: Some(format!(
                    "\"{}\" - {} ETH total",
                    pool.question, pool.total_amount
                )),
                variant: ToastVariant::Default,
            },
            EventPayload::Toast(toast) => Notification {
                title: toast.title.clone(),
                description: toast.description.clone(),
                variant: toast.variant,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Blockchain, PoolCreatedPayload, ToastPayload, VotePayload};

    #[test]
    fn vote_notification_names_voter_and_pool() {
        let note = Notification::render(&EventPayload::Vote(VotePayload {
            pool_id: "flow-3".to_string(),
            vote: VoteChoice::Yes,
            actor_address: Some("0x1234567890abcdef1234567890abcdef12345678".to_string()),
            blockchain: Blockchain::Flow,
        }));
        assert_eq!(note.title, "✅ 0x1234...5678 voted YES!");
        assert_eq!(
            note.description.as_deref(),
            Some("On Flow blockchain • Pool: flow-3")
        );
    }

    #[test]
    fn anonymous_no_vote() {
        let note = Notification::render(&EventPayload::Vote(VotePayload {
            pool_id: "ronin-1".to_string(),
            vote: VoteChoice::No,
            actor_address: None,
            blockchain: Blockchain::Ronin,
        }));
        assert_eq!(note.title, "❌ Someone voted NO!");
    }

    #[test]
    fn pool_created_notification() {
        let note = Notification::render(&EventPayload::PoolCreated(PoolCreatedPayload {
            pool_id: "ronin-9".to_string(),
            question: "Will it snow?".to_string(),
            blockchain: Blockchain::Ronin,
            total_amount: 0.5,
            creator_address: "0xB".to_string(),
        }));
        assert_eq!(note.title, "🎯 New Ronin Pool Created!");
        assert_eq!(note.description.as_deref(), Some("\"Will it snow?\" - 0.5 ETH total"));
    }

    #[test]
    fn toast_passes_through() {
        let note = Notification::render(&EventPayload::Toast(ToastPayload {
            title: "Transaction failed".to_string(),
            description: Some("Try again".to_string()),
            variant: ToastVariant::Destructive,
        }));
        assert_eq!(note.variant, ToastVariant::Destructive);
        assert_eq!(note.title, "Transaction failed");
    }
}
