//! Host authority checks
//!
//! The host is fixed when the room is created and never migrates. Every
//! room-level transition goes through [`ensure_host`] before touching state.

use crate::error::{RoomError, RoomResult};
use crate::types::{Participant, Room};

/// Check that the room has exactly one host and that it matches `host_id`
pub fn validate_host(room: &Room) -> RoomResult<&Participant> {
    let mut hosts = room.participants.iter().filter(|p| p.is_host);
    match (hosts.next(), hosts.next()) {
        (Some(host), None) if host.id == room.host_id => Ok(host),
        (Some(_), None) => Err(RoomError::ValidationError(
            "Host flag does not match the room's host".to_string(),
        )),
        (None, _) => Err(RoomError::ValidationError("Room has no host".to_string())),
        (Some(_), Some(_)) => Err(RoomError::ValidationError(
            "Room has more than one host".to_string(),
        )),
    }
}

/// Reject `actor` unless it is the room's host
pub fn ensure_host<'a>(room: &'a Room, actor: &str) -> RoomResult<&'a Participant> {
    let host = validate_host(room)?;
    if host.id != actor {
        tracing::warn!(room_id = %room.id, actor, "Rejected host action from non-host");
        return Err(RoomError::PermissionError(
            "Only the host can do that".to_string(),
        ));
    }
    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameKind;

    fn room() -> Room {
        let mut room = Room::new(Participant::new("host".to_string(), true), GameKind::Poll);
        room.participants
            .push(Participant::new("guest".to_string(), false));
        room
    }

    #[test]
    fn test_host_passes() {
        let room = room();
        let host_id = room.host_id.clone();
        assert_eq!(ensure_host(&room, &host_id).unwrap().nickname, "host");
    }

    #[test]
    fn test_guest_rejected() {
        let room = room();
        let guest = room.participants[1].id.clone();
        assert!(matches!(
            ensure_host(&room, &guest),
            Err(RoomError::PermissionError(_))
        ));
        assert!(matches!(
            ensure_host(&room, "stranger"),
            Err(RoomError::PermissionError(_))
        ));
    }

    #[test]
    fn test_two_hosts_is_invalid() {
        let mut room = room();
        room.participants[1].is_host = true;
        assert!(matches!(
            validate_host(&room),
            Err(RoomError::ValidationError(_))
        ));
    }

    #[test]
    fn test_host_flag_must_match_host_id() {
        let mut room = room();
        room.participants[0].is_host = false;
        room.participants[1].is_host = true;
        assert!(validate_host(&room).is_err());
    }
}
