//! Message-based command protocol.
//!
//! Commands arrive as `(topic, payload)` pairs from a message bus. A topic
//! addresses a head by containing its name, for example
//! `JMRI/signal/light/set/AMW-A/green`. The text after the head name is the
//! qualifier. Two grammars are accepted for setting an aspect, and both
//! produce the same [`HeadAction::SetIndication`]:
//!
//! - explicit payload: `GREEN`, `RED`, `YELLOW`, `DARK`, `FLASHINGGREEN`,
//!   `FLASHINGRED` or `FLASHINGYELLOW`, in any case;
//! - legacy on/off: payload `ON` with the color named in the qualifier, for
//!   controllers that only know how to switch lights on and off.
//!
//! Unrecognized commands are dropped without a reply.

use crate::types::{Aspect, HeadId, Indication};

/// A mutation or query aimed at one head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeadAction {
    /// Turn the flashing overlay on or off, keeping the aspect.
    SetFlashing(bool),
    /// Replace the requested indication and restart the transition.
    SetIndication(Indication),
    /// Echo the requested state without changing it.
    Query,
}

/// State that should be published after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    /// Combined indication plus the green, yellow, red and flashing flags.
    AspectState,
    /// Only the flashing flag.
    FlashingState,
}

/// Action targeting a specific head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeadCommand {
    pub head: HeadId,
    pub action: HeadAction,
}

impl HeadCommand {
    /// Creates command.
    pub fn new(head: HeadId, action: HeadAction) -> Self {
        Self { head, action }
    }
}

/// Colors recognized in legacy on/off topics, in match priority order.
const LEGACY_COLORS: [(&str, Aspect); 3] = [
    ("green", Aspect::Green),
    ("red", Aspect::Red),
    ("yellow", Aspect::Yellow),
];

/// Parses an inbound message into a command for one of `names`.
///
/// `names` are scanned in order and the first name found in `topic` wins;
/// its position becomes the [`HeadId`]. Returns `None` when no head matches
/// or the message is not understood.
pub fn parse_command<'a, N>(topic: &str, payload: &str, names: N) -> Option<HeadCommand>
where
    N: IntoIterator<Item = &'a str>,
{
    let (index, qualifier) = names
        .into_iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .find_map(|(index, name)| {
            topic
                .find(name)
                .map(|pos| (index, &topic[pos + name.len()..]))
        })?;

    match parse_action(topic, qualifier, payload) {
        Some(action) => Some(HeadCommand::new(HeadId(index), action)),
        None => {
            debug!("ignoring unrecognized command {} = {}", topic, payload);
            None
        }
    }
}

/// Parses the action part of a message whose head is already resolved.
pub fn parse_action(topic: &str, qualifier: &str, payload: &str) -> Option<HeadAction> {
    if topic.contains("set") {
        if topic.contains("flashing") {
            return Some(HeadAction::SetFlashing(payload != "OFF"));
        }

        Indication::parse(payload)
            .or_else(|| parse_legacy_on(qualifier, payload))
            .map(HeadAction::SetIndication)
    } else if payload == "?" {
        Some(HeadAction::Query)
    } else {
        None
    }
}

/// Parses `ON` with the color carried in the topic qualifier.
fn parse_legacy_on(qualifier: &str, payload: &str) -> Option<Indication> {
    if payload != "ON" {
        return None;
    }

    LEGACY_COLORS
        .iter()
        .find(|(word, _)| contains_ignore_ascii_case(qualifier, word))
        .map(|&(_, aspect)| Indication::steady(aspect))
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 2] = ["AMW-A", "AMW-B"];

    fn parse(topic: &str, payload: &str) -> Option<HeadCommand> {
        parse_command(topic, payload, NAMES)
    }

    #[test]
    fn explicit_payload_sets_indication() {
        assert_eq!(
            parse("JMRI/signal/AMW-B/set", "flashingRed"),
            Some(HeadCommand::new(
                HeadId(1),
                HeadAction::SetIndication(Indication::flashing(Aspect::Red))
            ))
        );
    }

    #[test]
    fn legacy_on_reads_color_from_qualifier() {
        assert_eq!(
            parse("JMRI/signal/light/set/AMW-A/Yellow", "ON"),
            Some(HeadCommand::new(
                HeadId(0),
                HeadAction::SetIndication(Indication::steady(Aspect::Yellow))
            ))
        );
        assert_eq!(parse("JMRI/signal/light/set/AMW-A/yellow", "OFF"), None);
    }

    #[test]
    fn legacy_color_is_not_read_from_head_name() {
        let names = ["RED-1"];
        assert_eq!(parse_command("x/set/RED-1/lamp", "ON", names), None);
    }

    #[test]
    fn flashing_topic_only_off_clears() {
        assert_eq!(
            parse("JMRI/signal/light/set/AMW-A/flashing", "OFF").map(|c| c.action),
            Some(HeadAction::SetFlashing(false))
        );
        assert_eq!(
            parse("JMRI/signal/light/set/AMW-A/flashing", "whatever").map(|c| c.action),
            Some(HeadAction::SetFlashing(true))
        );
    }

    #[test]
    fn query_requires_exact_question_mark() {
        assert_eq!(
            parse("JMRI/signal/AMW-A", "?").map(|c| c.action),
            Some(HeadAction::Query)
        );
        assert_eq!(parse("JMRI/signal/AMW-A", "??"), None);
    }

    #[test]
    fn own_state_echoes_are_ignored() {
        assert_eq!(parse("JMRI/signal/light/AMW-A/green", "ON"), None);
        assert_eq!(parse("JMRI/signal/AMW-A", "GREEN"), None);
    }

    #[test]
    fn unknown_head_or_payload_is_ignored() {
        assert_eq!(parse("JMRI/signal/light/set/AMW-Z/green", "ON"), None);
        assert_eq!(parse("JMRI/signal/light/set/AMW-A", "PURPLE"), None);
    }

    #[test]
    fn first_matching_head_wins() {
        let names = ["AMW", "AMW-B"];
        assert_eq!(
            parse_command("JMRI/signal/AMW-B", "?", names).map(|c| c.head),
            Some(HeadId(0))
        );
    }
}
