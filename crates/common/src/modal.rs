//! Site-wide modal state
//!
//! Only one modal is open at a time. The partner contact form carries the
//! partner it was opened for, so there is no separate "selected partner" to
//! keep in sync.

use serde::{Deserialize, Serialize};

use crate::vehicle::Partner;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "modal", content = "partner", rename_all = "kebab-case")]
pub enum ModalState {
    #[default]
    Closed,
    Contact,
    Partners,
    PartnerContact(Partner),
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, ModalState::Closed)
    }

    pub fn selected_partner(&self) -> Option<&Partner> {
        match self {
            ModalState::PartnerContact(partner) => Some(partner),
            _ => None,
        }
    }

    pub fn open_contact(&mut self) {
        *self = ModalState::Contact;
    }

    pub fn open_partners(&mut self) {
        *self = ModalState::Partners;
    }

    pub fn open_partner_contact(&mut self, partner: Partner) {
        *self = ModalState::PartnerContact(partner);
    }

    /// "Back" from the partner form returns to the partner list.
    pub fn back_to_partners(&mut self) {
        if matches!(self, ModalState::PartnerContact(_)) {
            *self = ModalState::Partners;
        }
    }

    pub fn close(&mut self) {
        *self = ModalState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partner() -> Partner {
        Partner {
            id: "p1".into(),
            name: "Equity Finance".into(),
            logo: None,
            email: Some("loans@equity.example".into()),
            disabled: false,
        }
    }

    #[test]
    fn test_partner_flow() {
        let mut state = ModalState::default();
        assert!(!state.is_open());

        state.open_partners();
        state.open_partner_contact(partner());
        assert_eq!(state.selected_partner().map(|p| p.id.as_str()), Some("p1"));

        state.back_to_partners();
        assert_eq!(state, ModalState::Partners);
        assert!(state.selected_partner().is_none());

        state.close();
        assert_eq!(state, ModalState::Closed);
    }

    #[test]
    fn test_back_is_noop_elsewhere() {
        let mut state = ModalState::Contact;
        state.back_to_partners();
        assert_eq!(state, ModalState::Contact);
    }

    #[test]
    fn test_opening_contact_drops_partner() {
        let mut state = ModalState::PartnerContact(partner());
        state.open_contact();
        assert_eq!(state, ModalState::Contact);
    }

    #[test]
    fn test_serialized_tag() {
        let json = serde_json::to_value(ModalState::Partners).unwrap();
        assert_eq!(json, serde_json::json!({"modal": "partners"}));
    }
}
