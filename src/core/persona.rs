//! Persona tags and marker-based detection.
//!
//! The assistant's "agents" only exist in the model's narrative. The system
//! prompt asks the model to announce its routing decision as `CALL: <CODE>`
//! and to bold the code of the specialist it is playing, so the active
//! persona is recovered by looking for those markers in the accumulated text.

/// Which simulated role a model message is currently attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonaTag {
    /// Routing in progress; no specialist has been announced yet.
    Dispatcher,
    AccountManagement,
    TransactionProcessing,
    CustomerSupport,
    FinancialReporting,
    /// The turn failed and the message carries app-authored error text.
    SystemError,
}

/// Specialists in detection priority order. When several markers are present
/// the earliest entry here wins, regardless of where the markers appear.
pub const SPECIALISTS: [PersonaTag; 4] = [
    PersonaTag::AccountManagement,
    PersonaTag::TransactionProcessing,
    PersonaTag::CustomerSupport,
    PersonaTag::FinancialReporting,
];

impl PersonaTag {
    /// Short routing code used by the system prompt.
    pub fn code(self) -> &'static str {
        match self {
            PersonaTag::Dispatcher => "ROUTING",
            PersonaTag::AccountManagement => "AMA",
            PersonaTag::TransactionProcessing => "TPA",
            PersonaTag::CustomerSupport => "CSA",
            PersonaTag::FinancialReporting => "FRA",
            PersonaTag::SystemError => "SYSTEM",
        }
    }

    pub fn is_specialist(self) -> bool {
        SPECIALISTS.contains(&self)
    }

    fn markers(self) -> Option<[String; 2]> {
        if !self.is_specialist() {
            return None;
        }
        let code = self.code();
        Some([format!("CALL: {code}"), format!("**{code}**")])
    }
}

/// Returns the highest-priority specialist whose marker occurs in `full_text`.
pub fn detect(full_text: &str) -> Option<PersonaTag> {
    if full_text.trim().is_empty() {
        return None;
    }

    SPECIALISTS.into_iter().find(|tag| {
        tag.markers()
            .is_some_and(|markers| markers.iter().any(|marker| full_text.contains(marker)))
    })
}

/// Sticky fold used while a message streams: a fresh detection replaces the
/// previous tag, an empty detection keeps it.
pub fn next_persona(previous: PersonaTag, full_text: &str) -> PersonaTag {
    detect(full_text).unwrap_or(previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_text_detect_nothing() {
        assert_eq!(detect(""), None);
        assert_eq!(detect("   \n\t"), None);
        assert_eq!(detect("Saya akan membantu Anda."), None);
    }

    #[test]
    fn routing_call_marker_selects_each_specialist() {
        let cases = [
            ("CALL: AMA", PersonaTag::AccountManagement),
            ("CALL: TPA", PersonaTag::TransactionProcessing),
            ("CALL: CSA", PersonaTag::CustomerSupport),
            ("CALL: FRA", PersonaTag::FinancialReporting),
        ];

        for (marker, expected) in cases {
            let text = format!("**[DISPATCHER RESULT]**\n**Routing Keputusan:** {marker}\n");
            assert_eq!(detect(&text), Some(expected), "marker {marker}");
        }
    }

    #[test]
    fn bold_name_marker_selects_specialist() {
        assert_eq!(
            detect("Menjawab sebagai **CSA** untuk pertanyaan umum."),
            Some(PersonaTag::CustomerSupport)
        );
    }

    #[test]
    fn priority_follows_declaration_order_not_text_position() {
        let text = "CALL: FRA ... later the narrative mentions **TPA** and CALL: AMA";
        assert_eq!(detect(text), Some(PersonaTag::AccountManagement));

        let text = "CALL: CSA first, then **TPA**";
        assert_eq!(detect(text), Some(PersonaTag::TransactionProcessing));
    }

    #[test]
    fn partial_markers_do_not_match() {
        assert_eq!(detect("CALL: TP"), None);
        assert_eq!(detect("CALL:TPA"), None);
        assert_eq!(detect("*TPA*"), None);
        assert_eq!(detect("**[DISPATCHER RESULT]**"), None);
    }

    #[test]
    fn detection_is_idempotent() {
        let text = "**Routing Keputusan:** CALL: TPA";
        assert_eq!(detect(text), detect(text));
    }

    #[test]
    fn next_persona_keeps_previous_tag_without_markers() {
        let tag = next_persona(PersonaTag::TransactionProcessing, "no markers here");
        assert_eq!(tag, PersonaTag::TransactionProcessing);

        let tag = next_persona(PersonaTag::Dispatcher, "");
        assert_eq!(tag, PersonaTag::Dispatcher);
    }

    #[test]
    fn next_persona_replaces_previous_tag_on_detection() {
        let tag = next_persona(PersonaTag::Dispatcher, "CALL: FRA");
        assert_eq!(tag, PersonaTag::FinancialReporting);
    }

    #[test]
    fn only_specialists_have_markers() {
        assert!(PersonaTag::Dispatcher.markers().is_none());
        assert!(PersonaTag::SystemError.markers().is_none());
        assert!(SPECIALISTS.iter().all(|tag| tag.is_specialist()));
    }
}
