//! Session ownership check.

use infograph_core::{session::ResearchSession, store::SessionStore};
use uuid::Uuid;

use crate::AccessError;

/// Load `session_id` and confirm `caller` owns it.
///
/// Runs before any read or mutation reachable through a session-scoped path,
/// including messages, sources and infographics nested under the session.
pub async fn authorize_session_access<S>(
  store: &S,
  session_id: Uuid,
  caller: Uuid,
) -> Result<ResearchSession, AccessError>
where
  S: SessionStore + ?Sized,
{
  let session = store
    .get_session(session_id)
    .await?
    .ok_or(AccessError::NotFound(session_id))?;

  if !session.is_owned_by(caller) {
    tracing::warn!(
      %session_id,
      caller = %caller,
      owner = %session.user_id,
      "session access denied"
    );
    return Err(AccessError::Forbidden(session_id));
  }
  Ok(session)
}
