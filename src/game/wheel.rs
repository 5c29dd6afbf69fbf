//! Spinning wheel
//!
//! The host broadcasts a single scalar (total clockwise rotation in degrees)
//! and every client maps it back to the slice under the 12 o'clock pointer.

use crate::error::{RoomError, RoomResult};
use crate::types::{ParticipantId, Room};
use rand::Rng;

/// Spins land between 5 and 10 full turns
pub const MIN_SPIN_DEGREES: f64 = 1800.0;
pub const SPIN_RANGE_DEGREES: f64 = 1800.0;

const FULL_TURN: f64 = 360.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelPayload {
    pub target_degrees: f64,
}

impl WheelPayload {
    pub fn encode(&self) -> serde_json::Value {
        serde_json::Value::String(self.target_degrees.to_string())
    }

    pub fn decode(value: &serde_json::Value) -> RoomResult<Self> {
        let raw = value
            .as_str()
            .ok_or_else(|| RoomError::DecodeError("Wheel payload must be a string".to_string()))?;
        let target_degrees: f64 = raw
            .trim()
            .parse()
            .map_err(|e| RoomError::DecodeError(format!("Bad wheel angle {:?}: {}", raw, e)))?;
        if !target_degrees.is_finite() || target_degrees < 0.0 {
            return Err(RoomError::DecodeError(format!(
                "Wheel angle out of range: {}",
                raw
            )));
        }
        Ok(Self { target_degrees })
    }
}

/// Slice index under the pointer after rotating by `target_degrees`.
///
/// Slices are laid out clockwise from 12 o'clock, so a clockwise rotation
/// brings the slice at `360 - angle` under the pointer.
pub fn winning_index(target_degrees: f64, slices: usize) -> Option<usize> {
    if slices == 0 {
        return None;
    }
    let slice_width = FULL_TURN / slices as f64;
    let under_pointer = (FULL_TURN - target_degrees.rem_euclid(FULL_TURN)).rem_euclid(FULL_TURN);
    let index = (under_pointer / slice_width).floor() as usize;
    Some(index.min(slices - 1))
}

#[derive(Debug, Clone, PartialEq)]
pub struct WheelSlice {
    pub participant_id: ParticipantId,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WheelSpin {
    pub target_degrees: f64,
    pub winning_index: usize,
    pub winner: ParticipantId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WheelView {
    pub slices: Vec<WheelSlice>,
    /// `None` until the host spins
    pub spin: Option<WheelSpin>,
}

pub fn derive(room: &Room) -> RoomResult<WheelView> {
    let slices: Vec<WheelSlice> = room
        .participants
        .iter()
        .map(|p| WheelSlice {
            participant_id: p.id.clone(),
            nickname: p.nickname.clone(),
        })
        .collect();

    let spin = match &room.payload {
        Some(raw) => {
            let payload = WheelPayload::decode(raw)?;
            winning_index(payload.target_degrees, slices.len()).map(|index| WheelSpin {
                target_degrees: payload.target_degrees,
                winning_index: index,
                winner: slices[index].participant_id.clone(),
            })
        }
        None => None,
    };

    Ok(WheelView { slices, spin })
}

pub fn spin<R: Rng + ?Sized>(room: &Room, rng: &mut R) -> RoomResult<Room> {
    if room.payload.is_some() {
        return Err(RoomError::InvalidStateError(
            "Wheel is already spinning; reset it first".to_string(),
        ));
    }
    let target_degrees = MIN_SPIN_DEGREES + rng.random::<f64>() * SPIN_RANGE_DEGREES;
    let mut next = room.clone();
    next.payload = Some(WheelPayload { target_degrees }.encode());
    Ok(next)
}

pub fn reset(room: &Room) -> Room {
    let mut next = room.clone();
    next.payload = None;
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GameKind, Participant};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_winning_index_reference_angles() {
        assert_eq!(winning_index(0.0, 4), Some(0));
        assert_eq!(winning_index(90.0, 4), Some(3));
        assert_eq!(winning_index(180.0, 4), Some(2));
        assert_eq!(winning_index(270.0, 4), Some(1));
        for k in 1..=10 {
            assert_eq!(winning_index(360.0 * k as f64, 4), Some(0));
        }
    }

    #[test]
    fn test_winning_index_edges() {
        assert_eq!(winning_index(1234.0, 0), None);
        assert_eq!(winning_index(1234.0, 1), Some(0));
        // Just short of a full turn leaves the pointer at the start of slice 0
        assert_eq!(winning_index(359.999, 4), Some(0));
        assert_eq!(winning_index(0.001, 4), Some(3));
    }

    #[test]
    fn test_decode_grammar() {
        let payload = WheelPayload::decode(&serde_json::json!("3421")).unwrap();
        assert_eq!(payload.target_degrees, 3421.0);
        assert!(WheelPayload::decode(&serde_json::json!("north")).is_err());
        assert!(WheelPayload::decode(&serde_json::json!("-5")).is_err());
        assert!(WheelPayload::decode(&serde_json::json!(3421)).is_err());
    }

    #[test]
    fn test_spin_range_and_lock() {
        let mut room = Room::new(Participant::new("host".to_string(), true), GameKind::Wheel);
        room.participants
            .push(Participant::new("guest".to_string(), false));
        let mut rng = StdRng::seed_from_u64(11);

        let spun = spin(&room, &mut rng).unwrap();
        let payload = WheelPayload::decode(spun.payload.as_ref().unwrap()).unwrap();
        assert!((MIN_SPIN_DEGREES..MIN_SPIN_DEGREES + SPIN_RANGE_DEGREES)
            .contains(&payload.target_degrees));

        assert!(matches!(
            spin(&spun, &mut rng),
            Err(RoomError::InvalidStateError(_))
        ));

        let view = derive(&spun).unwrap();
        let result = view.spin.unwrap();
        assert_eq!(
            Some(result.winning_index),
            winning_index(payload.target_degrees, 2)
        );
        assert_eq!(result.winner, view.slices[result.winning_index].participant_id);

        assert!(derive(&reset(&spun)).unwrap().spin.is_none());
    }
}
