//! The transfer transaction engine.
//!
//! Moves wealth between two canonical players. Validation short-circuits
//! at the first failure with a distinct user-facing message and no state
//! mutation of any kind; a successful transfer registers both parties,
//! applies one two-operation batch (actor debited, target credited), and
//! commits it as a single unit, so no reader ever observes a one-sided
//! state. The target is then notified out-of-band with a whisper.

use serde_json::json;
use tracing::{info, warn};

use idlewild_players::Registry;
use idlewild_state::GameState;
use idlewild_types::{ChannelMessage, PatchOp};

use crate::outbox::Outbox;

/// Response when the state actor is unreachable mid-transfer.
const LEDGER_DOWN: &str = "the ledger is unavailable right now; nothing was transferred.";

/// Handle a `!transfer <amount> <user>` message.
///
/// Always returns the user-facing response text; every rejection leaves
/// the world untouched.
pub async fn handle_transfer(
    registry: &Registry,
    outbox: &Outbox,
    message: &ChannelMessage,
) -> String {
    // 1. The message must carry an actor and a text body.
    let (Some(actor_raw), Some(object)) = (message.actor.as_deref(), message.object.as_deref())
    else {
        return String::from("transfer needs a sender and a message text.");
    };

    // 2. Exactly three tokens: !transfer <amount> <user>.
    let tokens: Vec<&str> = object.split_whitespace().collect();
    let (Some(&"!transfer"), Some(amount_token), Some(target_raw), None) = (
        tokens.first(),
        tokens.get(1).copied(),
        tokens.get(2).copied(),
        tokens.get(3),
    ) else {
        return String::from("usage: !transfer <amount> <user>");
    };

    let actor_id = match Registry::canonicalize(actor_raw) {
        Ok(id) => id,
        Err(e) => {
            warn!(actor = actor_raw, error = %e, "transfer from unrecognizable actor");
            return format!("`{actor_raw}` is not a player id I recognize.");
        }
    };
    let Ok(target_id) = Registry::canonicalize(target_raw) else {
        return format!("`{target_raw}` is not a player id I recognize.");
    };

    // 3. No self-transfers.
    if actor_id == target_id {
        return String::from("you cannot transfer wealth to yourself.");
    }

    // 4. The amount must be a positive whole number.
    let Ok(amount_signed) = amount_token.parse::<i64>() else {
        return format!("`{amount_token}` is not a whole number.");
    };
    let Ok(amount) = u64::try_from(amount_signed) else {
        return String::from("the amount must be a positive whole number.");
    };
    if amount == 0 {
        return String::from("the amount must be a positive whole number.");
    }

    let actor_canonical = actor_id.to_string();
    let target_canonical = target_id.to_string();

    let Ok((_, actor_profile)) = registry.get_profile(&actor_canonical).await else {
        return String::from(LEDGER_DOWN);
    };

    // 5. The actor must have something to give.
    if actor_profile.wealth == 0 {
        return String::from("you have no wealth to transfer.");
    }

    // 6. The actor must be able to cover the amount.
    if amount > actor_profile.wealth {
        let shortfall = amount.saturating_sub(actor_profile.wealth);
        return format!("you need {shortfall} more wealth to transfer {amount}.");
    }

    let Ok((_, target_profile)) = registry.get_profile(&target_canonical).await else {
        return String::from(LEDGER_DOWN);
    };

    // Ensure both parties exist in the tree before the replace patches.
    if registry
        .register_player(&actor_canonical, &actor_profile)
        .await
        .is_err()
        || registry
            .register_player(&target_canonical, &target_profile)
            .await
            .is_err()
    {
        return String::from(LEDGER_DOWN);
    }

    let actor_path = GameState::player_path(&actor_id);
    let target_path = GameState::player_path(&target_id);
    let debited = actor_profile.wealth.saturating_sub(amount);
    let credited = target_profile.wealth.saturating_add(amount);

    let batch = vec![
        PatchOp::replace(format!("{actor_path}/wealth"), json!(debited)),
        PatchOp::replace(format!("{target_path}/wealth"), json!(credited)),
    ];

    match registry.state().apply_commit(batch).await {
        Ok(_) => {
            info!(
                actor = %actor_canonical,
                target = %target_canonical,
                amount,
                "transfer committed"
            );
            outbox.whisper(
                target_canonical.clone(),
                format!("{actor_canonical} sent you {amount} wealth."),
            );
            format!("you transferred {amount} wealth to {target_canonical}.")
        }
        Err(e) => {
            warn!(error = %e, "transfer commit failed");
            String::from(LEDGER_DOWN)
        }
    }
}
