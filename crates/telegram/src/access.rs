use {
    teloxide::types::{ChatId, UserId},
    tracing::{debug, warn},
};

use crate::transport::{MemberStatus, Transport};

/// Whether a standing in the gating group grants access.
///
/// Only owners, administrators and regular members pass. Restricted users
/// are denied even if they are technically still in the chat.
pub fn grants_access(status: MemberStatus) -> bool {
    matches!(
        status,
        MemberStatus::Owner | MemberStatus::Administrator | MemberStatus::Member
    )
}

/// Check whether `user` currently belongs to `group`.
///
/// Queries the Bot API on every call. Any lookup failure counts as "not a
/// member".
pub async fn is_member(transport: &dyn Transport, user: UserId, group: ChatId) -> bool {
    match transport.member_status(group, user).await {
        Ok(status) => {
            let granted = grants_access(status);
            debug!(
                user_id = user.0,
                group_id = group.0,
                ?status,
                granted,
                "membership checked"
            );
            granted
        },
        Err(e) => {
            warn!(
                user_id = user.0,
                group_id = group.0,
                error = %e,
                "membership lookup failed, denying access"
            );
            false
        },
    }
}
