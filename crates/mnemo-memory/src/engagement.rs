// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engagement scoring.
//!
//! Engagement feeds the initial relevance score of every memory
//! extracted from the conversation, and the snapshot is persisted per
//! `(user, conversation)` pair.

use mnemo_core::types::ChatMessage;

/// Weight of the user's share of turns.
const TURN_RATIO_WEIGHT: f64 = 0.5;
/// Weight of average user message length.
const LENGTH_WEIGHT: f64 = 0.3;
/// Weight of the recency bonus.
const RECENCY_WEIGHT: f64 = 0.2;
/// User message length (in bytes) that saturates the length component.
const LENGTH_TARGET: f64 = 200.0;

/// Computed engagement for one conversation slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Engagement {
    pub message_count: i64,
    pub user_message_count: i64,
    /// Average user message length in bytes (integer division).
    pub avg_user_length: i64,
    /// Weighted score in [0, 1].
    pub score: f64,
}

/// Score how engaged the user was in a conversation.
///
/// `0.5 * turn_ratio + 0.3 * min(avg_user_length / 200, 1) + 0.2 * 1.0`.
/// The recency component is a constant bonus: anything being extracted
/// is by definition recent. Conversations without user messages score
/// zero.
pub fn calculate_engagement(messages: &[ChatMessage]) -> Engagement {
    let message_count = messages.len() as i64;

    let mut user_message_count = 0i64;
    let mut total_user_length = 0i64;
    for msg in messages {
        if msg.role == "user" {
            user_message_count += 1;
            total_user_length += msg.content.len() as i64;
        }
    }

    if message_count == 0 || user_message_count == 0 {
        return Engagement {
            message_count,
            user_message_count,
            avg_user_length: 0,
            score: 0.0,
        };
    }

    let turn_ratio = user_message_count as f64 / message_count as f64;
    let avg_user_length = total_user_length / user_message_count;
    let length_score = (avg_user_length as f64 / LENGTH_TARGET).min(1.0);

    let score =
        TURN_RATIO_WEIGHT * turn_ratio + LENGTH_WEIGHT * length_score + RECENCY_WEIGHT * 1.0;

    Engagement {
        message_count,
        user_message_count,
        avg_user_length,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: &str, content: &str) -> ChatMessage {
        ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn empty_conversation_scores_zero() {
        let e = calculate_engagement(&[]);
        assert_eq!(e.score, 0.0);
        assert_eq!(e.message_count, 0);
    }

    #[test]
    fn assistant_only_conversation_scores_zero() {
        let e = calculate_engagement(&[msg("assistant", "hello there")]);
        assert_eq!(e.score, 0.0);
        assert_eq!(e.user_message_count, 0);
    }

    #[test]
    fn balanced_conversation_with_long_messages_maxes_out() {
        // Every turn is a user turn at the length target.
        let long = "x".repeat(400);
        let e = calculate_engagement(&[msg("user", &long), msg("user", &long)]);
        assert_eq!(e.user_message_count, 2);
        assert_eq!(e.avg_user_length, 400);
        assert!((e.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_components_add_up() {
        // 1 user turn of 4 messages, avg length 100 bytes.
        let e = calculate_engagement(&[
            msg("user", &"x".repeat(100)),
            msg("assistant", "a"),
            msg("assistant", "b"),
            msg("assistant", "c"),
        ]);
        // 0.5 * 0.25 + 0.3 * 0.5 + 0.2 * 1.0
        assert!((e.score - 0.475).abs() < 1e-9);
    }

    #[test]
    fn average_length_uses_integer_division() {
        let e = calculate_engagement(&[
            msg("user", &"x".repeat(100)),
            msg("user", &"x".repeat(101)),
        ]);
        assert_eq!(e.avg_user_length, 100);
    }
}
