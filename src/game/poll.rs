//! Binary-choice poll
//!
//! Wire payload: `"<question>|<optionA>|<optionB>"`. The tally is never
//! stored; it is recounted from the participants' selected answers.

use crate::error::{RoomError, RoomResult};
use crate::types::{Answer, ParticipantId, Room};
use rand::Rng;

const SEPARATOR: char = '|';

/// Built-in question catalog (question, option A, option B)
pub const CATALOG: &[(&str, &str, &str)] = &[
    ("평생 한 가지만 먹어야 한다면?", "짜장면", "짬뽕"),
    ("여행을 간다면?", "바다", "산"),
    ("하루를 시작하는 음료는?", "커피", "차"),
    ("주말에 나는?", "집순이/집돌이", "밖순이/밖돌이"),
    ("더 참기 힘든 것은?", "더위", "추위"),
    ("초능력을 하나 고른다면?", "순간이동", "투명인간"),
    ("탕수육은?", "부먹", "찍먹"),
    ("반려동물을 키운다면?", "강아지", "고양이"),
    ("일할 때 더 좋은 곳은?", "사무실", "재택"),
    ("민트초코는?", "맛있다", "치약맛"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPayload {
    pub question: String,
    pub option_a: String,
    pub option_b: String,
}

impl PollPayload {
    /// Build a host-authored question, rejecting text the wire grammar cannot carry
    pub fn new(question: &str, option_a: &str, option_b: &str) -> RoomResult<Self> {
        let fields = [question.trim(), option_a.trim(), option_b.trim()];
        if fields.iter().any(|f| f.is_empty()) {
            return Err(RoomError::ValidationError(
                "Question and both options must be non-empty".to_string(),
            ));
        }
        if fields.iter().any(|f| f.contains(SEPARATOR)) {
            return Err(RoomError::ValidationError(format!(
                "Question text may not contain '{}'",
                SEPARATOR
            )));
        }
        Ok(Self {
            question: fields[0].to_string(),
            option_a: fields[1].to_string(),
            option_b: fields[2].to_string(),
        })
    }

    pub fn encode(&self) -> serde_json::Value {
        serde_json::Value::String(format!(
            "{}{sep}{}{sep}{}",
            self.question,
            self.option_a,
            self.option_b,
            sep = SEPARATOR
        ))
    }

    pub fn parse(raw: &str) -> RoomResult<Self> {
        let fields: Vec<&str> = raw.split(SEPARATOR).collect();
        match fields.as_slice() {
            [question, option_a, option_b] => Ok(Self {
                question: question.to_string(),
                option_a: option_a.to_string(),
                option_b: option_b.to_string(),
            }),
            _ => Err(RoomError::DecodeError(format!(
                "Poll payload needs exactly 3 fields, got {}",
                fields.len()
            ))),
        }
    }

    pub fn decode(value: &serde_json::Value) -> RoomResult<Self> {
        match value.as_str() {
            Some(raw) => Self::parse(raw),
            None => Err(RoomError::DecodeError(
                "Poll payload must be a string".to_string(),
            )),
        }
    }
}

/// Vote counts recomputed from participant rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollTally {
    pub a: usize,
    pub b: usize,
    pub undecided: usize,
}

pub fn tally(room: &Room) -> PollTally {
    room.participants
        .iter()
        .fold(PollTally::default(), |mut t, p| {
            match p.selected_answer {
                Some(Answer::A) => t.a += 1,
                Some(Answer::B) => t.b += 1,
                None => t.undecided += 1,
            }
            t
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollView {
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub result_open: bool,
    pub tally: PollTally,
    pub voters_a: Vec<ParticipantId>,
    pub voters_b: Vec<ParticipantId>,
}

/// `Ok(None)` while no question has been posted
pub fn derive(room: &Room) -> RoomResult<Option<PollView>> {
    let Some(raw) = &room.payload else {
        return Ok(None);
    };
    let payload = PollPayload::decode(raw)?;

    let voters = |answer: Answer| -> Vec<ParticipantId> {
        room.participants
            .iter()
            .filter(|p| p.selected_answer == Some(answer))
            .map(|p| p.id.clone())
            .collect()
    };

    Ok(Some(PollView {
        question: payload.question,
        option_a: payload.option_a,
        option_b: payload.option_b,
        result_open: room.result_open,
        tally: tally(room),
        voters_a: voters(Answer::A),
        voters_b: voters(Answer::B),
    }))
}

fn open_question(room: &Room, payload: PollPayload) -> Room {
    let mut next = room.clone();
    next.payload = Some(payload.encode());
    next.result_open = false;
    for p in &mut next.participants {
        p.selected_answer = None;
    }
    next
}

/// Post a catalog question picked uniformly at random
pub fn next_question<R: Rng + ?Sized>(room: &Room, rng: &mut R) -> Room {
    let (question, option_a, option_b) = CATALOG[rng.random_range(0..CATALOG.len())];
    let payload = PollPayload {
        question: question.to_string(),
        option_a: option_a.to_string(),
        option_b: option_b.to_string(),
    };
    open_question(room, payload)
}

pub fn ask(room: &Room, question: &str, option_a: &str, option_b: &str) -> RoomResult<Room> {
    let payload = PollPayload::new(question, option_a, option_b)?;
    Ok(open_question(room, payload))
}

pub fn reveal(room: &Room) -> RoomResult<Room> {
    if room.payload.is_none() {
        return Err(RoomError::InvalidStateError(
            "No question to reveal".to_string(),
        ));
    }
    let mut next = room.clone();
    next.result_open = true;
    Ok(next)
}

pub fn reset(room: &Room) -> Room {
    let mut next = room.clone();
    next.payload = None;
    next.result_open = false;
    for p in &mut next.participants {
        p.selected_answer = None;
    }
    next
}

pub fn select(room: &Room, participant_id: &str, answer: Answer) -> RoomResult<Room> {
    if room.payload.is_none() {
        return Err(RoomError::InvalidStateError(
            "No question is open".to_string(),
        ));
    }
    if room.result_open {
        return Err(RoomError::InvalidStateError(
            "Answers are locked after reveal".to_string(),
        ));
    }
    let mut next = room.clone();
    let participant = next
        .participant_mut(participant_id)
        .ok_or_else(|| RoomError::PermissionError("Not a participant".to_string()))?;
    participant.selected_answer = Some(answer);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GameKind, Participant};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn room_with_guests(n: usize) -> Room {
        let mut room = Room::new(Participant::new("host".to_string(), true), GameKind::Poll);
        for i in 0..n {
            room.participants
                .push(Participant::new(format!("guest{}", i), false));
        }
        room
    }

    #[test]
    fn test_parse_requires_three_fields() {
        let payload = PollPayload::parse("Q?|yes|no").unwrap();
        assert_eq!(payload.question, "Q?");
        assert_eq!(payload.option_b, "no");

        assert!(matches!(
            PollPayload::parse("Q?|yes"),
            Err(RoomError::DecodeError(_))
        ));
        assert!(matches!(
            PollPayload::parse("Q?|yes|no|maybe"),
            Err(RoomError::DecodeError(_))
        ));
        assert!(matches!(
            PollPayload::decode(&serde_json::json!(42)),
            Err(RoomError::DecodeError(_))
        ));
    }

    #[test]
    fn test_catalog_entries_fit_grammar() {
        for (q, a, b) in CATALOG {
            assert!(PollPayload::new(q, a, b).is_ok(), "bad catalog entry {}", q);
        }
    }

    #[test]
    fn test_ask_rejects_separator_and_blank() {
        let room = room_with_guests(1);
        assert!(matches!(
            ask(&room, "a|b", "x", "y"),
            Err(RoomError::ValidationError(_))
        ));
        assert!(matches!(
            ask(&room, "  ", "x", "y"),
            Err(RoomError::ValidationError(_))
        ));
    }

    #[test]
    fn test_next_question_clears_answers() {
        let mut room = room_with_guests(2);
        room.result_open = true;
        for p in &mut room.participants {
            p.selected_answer = Some(Answer::B);
        }

        let mut rng = StdRng::seed_from_u64(3);
        let next = next_question(&room, &mut rng);

        assert!(!next.result_open);
        assert!(next.participants.iter().all(|p| p.selected_answer.is_none()));
        let view = derive(&next).unwrap().unwrap();
        assert!(CATALOG.iter().any(|(q, _, _)| *q == view.question));
    }

    #[test]
    fn test_tally_counts_on_demand() {
        let room = ask(&room_with_guests(3), "Pick", "left", "right").unwrap();
        let ids: Vec<String> = room.participants.iter().map(|p| p.id.clone()).collect();
        let room = select(&room, &ids[0], Answer::A).unwrap();
        let room = select(&room, &ids[1], Answer::B).unwrap();
        let room = select(&room, &ids[2], Answer::A).unwrap();

        let view = derive(&room).unwrap().unwrap();
        assert_eq!(
            view.tally,
            PollTally {
                a: 2,
                b: 1,
                undecided: 1
            }
        );
        assert_eq!(view.voters_a, vec![ids[0].clone(), ids[2].clone()]);
    }

    #[test]
    fn test_select_locked_after_reveal() {
        let room = ask(&room_with_guests(1), "Pick", "left", "right").unwrap();
        let revealed = reveal(&room).unwrap();
        let guest = revealed.participants[1].id.clone();

        let result = select(&revealed, &guest, Answer::A);
        assert!(matches!(result, Err(RoomError::InvalidStateError(_))));
        assert!(revealed
            .participants
            .iter()
            .all(|p| p.selected_answer.is_none()));
    }

    #[test]
    fn test_reveal_requires_question() {
        let room = room_with_guests(1);
        assert!(matches!(
            reveal(&room),
            Err(RoomError::InvalidStateError(_))
        ));
        assert_eq!(derive(&room).unwrap(), None);
    }
}
