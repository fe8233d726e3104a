//! Conversation provisioning.
//!
//! Given a group of bot identities, ensures every pair is connected and then
//! locates or creates the conversation the scenario will run in.

use tracing::debug;

use super::connect::connect_pair;
use super::session::{Bot, ConvId, Sessions};
use crate::config::Config;
use crate::error::{HarnessError, Result};

/// Ensure all pairs in `bots` are connected, then return a conversation
/// containing the whole group.
///
/// - Fewer than 2 bots is a caller bug and fails with
///   [`HarnessError::Precondition`].
/// - For exactly 2 bots, the 1:1 conversation created as a side effect of
///   connection acceptance is looked up as the first bot; its absence is a
///   post-condition failure ([`HarnessError::MissingConversation`]).
/// - For 3 or more bots, the first bot creates a group conversation with the
///   remaining bots as initial members, and membership is checked against the
///   service before the id is returned.
pub fn prepare_conv<S: Sessions>(sessions: &mut S, config: &Config, bots: &[Bot]) -> Result<ConvId> {
    if bots.len() < 2 {
        return Err(HarnessError::Precondition(format!(
            "prepare_conv needs at least 2 bots, got {}",
            bots.len()
        )));
    }

    // All C(n,2) unordered pairs, one at a time. Interleaving two views of
    // the same pair would race on which side observes "pending" first.
    for i in 0..bots.len() {
        for j in (i + 1)..bots.len() {
            connect_pair(sessions, &bots[i], &bots[j], &config.connect.greeting)?;
        }
    }

    let owner = &bots[0];
    if bots.len() == 2 {
        let other = &bots[1];
        let conv = sessions
            .conversation_with(owner, other.id)?
            .ok_or(HarnessError::MissingConversation {
                a: owner.id,
                b: other.id,
            })?;
        debug!(%conv, a = %owner.id, b = %other.id, "using 1:1 conversation");
        Ok(conv)
    } else {
        let members: Vec<_> = bots[1..].iter().map(|b| b.id).collect();
        let conv = sessions.create_group(owner, &config.conversation.group_name, &members)?;
        sessions.assert_conversation_created(conv, &members)?;
        debug!(%conv, owner = %owner.id, members = members.len(), "created group conversation");
        Ok(conv)
    }
}
