//! Two-step reference selector for `source` and `owner` metadata.
//!
//! The referenced object may be of any kind implementing a generic
//! (`DataSource` or `DataOwner`), so a single flat option list cannot
//! identify it. The user first picks a kind, then an instance of that kind:
//!
//! ```text
//! Unselected --choose_type--> TypeChosen --choose_instance--> InstanceChosen
//!      ^                          |  ^                              |
//!      +---------- clear ---------+  +-------- choose_type ---------+
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::SelectorError;
use crate::form::descriptor::SelectOption;
use crate::model::Ref;

/// Progress of a reference selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectorState {
    Unselected,
    TypeChosen { kind: String },
    InstanceChosen { kind: String, id: String },
}

/// Selector for a polymorphic reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceSelector {
    /// Generic the offered kinds implement.
    generic: String,
    type_options: Vec<SelectOption>,
    instances: BTreeMap<String, Vec<SelectOption>>,
    state: SelectorState,
}

impl ReferenceSelector {
    /// Creates an unselected selector offering `kinds` (kind, label) as first step.
    pub fn new<'a>(
        generic: impl Into<String>,
        kinds: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let type_options: Vec<SelectOption> = kinds
            .into_iter()
            .map(|(kind, label)| SelectOption::schema(kind, label))
            .collect();
        let instances = type_options
            .iter()
            .filter_map(|o| o.value_str())
            .map(|kind| (kind.to_string(), Vec::new()))
            .collect();
        Self {
            generic: generic.into(),
            type_options,
            instances,
            state: SelectorState::Unselected,
        }
    }

    /// Sets the second-step options of one offered kind.
    ///
    /// Kinds the selector does not offer are ignored.
    pub fn with_instances<'r>(mut self, kind: &str, peers: impl IntoIterator<Item = &'r Ref>) -> Self {
        if let Some(slot) = self.instances.get_mut(kind) {
            *slot = peers.into_iter().map(SelectOption::peer).collect();
        }
        self
    }

    /// Pre-selects the current reference, if it is one of the offered instances.
    ///
    /// A reference of an offered kind whose instance is not listed still
    /// selects the kind, so the second step stays answerable.
    pub fn with_current(mut self, current: Option<&Ref>) -> Self {
        if let Some(current) = current {
            if self.choose_type(&current.typename).is_ok() {
                let _ = self.choose_instance(&current.id);
            }
        }
        self
    }

    pub fn generic(&self) -> &str {
        &self.generic
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    /// First-step options.
    pub fn type_options(&self) -> &[SelectOption] {
        &self.type_options
    }

    /// Second-step options for the chosen kind; empty until a kind is chosen.
    pub fn instance_options(&self) -> &[SelectOption] {
        self.chosen_kind()
            .and_then(|kind| self.instances.get(kind))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the chosen kind, in either of the later states.
    pub fn chosen_kind(&self) -> Option<&str> {
        match &self.state {
            SelectorState::Unselected => None,
            SelectorState::TypeChosen { kind } | SelectorState::InstanceChosen { kind, .. } => Some(kind),
        }
    }

    /// Returns the chosen instance id once both steps are answered.
    pub fn selected_id(&self) -> Option<&str> {
        match &self.state {
            SelectorState::InstanceChosen { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Returns true once the second step is answered.
    pub fn is_answered(&self) -> bool {
        matches!(self.state, SelectorState::InstanceChosen { .. })
    }

    /// Chooses the kind. Re-choosing resets any chosen instance.
    pub fn choose_type(&mut self, kind: &str) -> Result<(), SelectorError> {
        if !self.instances.contains_key(kind) {
            return Err(SelectorError::UnknownType(kind.to_string()));
        }
        self.state = SelectorState::TypeChosen { kind: kind.to_string() };
        Ok(())
    }

    /// Chooses an instance of the chosen kind.
    pub fn choose_instance(&mut self, id: &str) -> Result<(), SelectorError> {
        let kind = self.chosen_kind().ok_or(SelectorError::NoTypeChosen)?.to_string();
        let offered = self
            .instances
            .get(&kind)
            .is_some_and(|options| options.iter().any(|o| o.value_str() == Some(id)));
        if !offered {
            return Err(SelectorError::UnknownInstance {
                kind,
                id: id.to_string(),
            });
        }
        self.state = SelectorState::InstanceChosen {
            kind,
            id: id.to_string(),
        };
        Ok(())
    }

    /// Returns to the unselected state.
    pub fn clear(&mut self) {
        self.state = SelectorState::Unselected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_selector() -> ReferenceSelector {
        let accounts = [Ref::new("a1", "Account").with_label("alice")];
        let teams = [Ref::new("t1", "Team").with_label("netops"), Ref::new("t2", "Team")];
        ReferenceSelector::new("DataOwner", [("Account", "Account"), ("Team", "Team")])
            .with_instances("Account", &accounts)
            .with_instances("Team", &teams)
    }

    #[test]
    fn test_two_step_flow() {
        let mut selector = owner_selector();
        assert_eq!(selector.state(), &SelectorState::Unselected);
        assert!(selector.instance_options().is_empty());

        let kinds: Vec<_> = selector.type_options().iter().filter_map(|o| o.value_str()).collect();
        assert_eq!(kinds, vec!["Account", "Team"]);

        selector.choose_type("Team").unwrap();
        let ids: Vec<_> = selector.instance_options().iter().filter_map(|o| o.value_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert!(!selector.is_answered());

        selector.choose_instance("t2").unwrap();
        assert!(selector.is_answered());
        assert_eq!(selector.selected_id(), Some("t2"));

        // Changing the kind discards the instance
        selector.choose_type("Account").unwrap();
        assert!(!selector.is_answered());
        assert_eq!(selector.instance_options().len(), 1);

        selector.clear();
        assert_eq!(selector.chosen_kind(), None);
    }

    #[test]
    fn test_rejected_transitions() {
        let mut selector = owner_selector();
        assert_eq!(selector.choose_instance("t1"), Err(SelectorError::NoTypeChosen));
        assert_eq!(
            selector.choose_type("Device"),
            Err(SelectorError::UnknownType("Device".to_string()))
        );

        selector.choose_type("Account").unwrap();
        // An instance of another kind is not offered at this step
        assert!(matches!(
            selector.choose_instance("t1"),
            Err(SelectorError::UnknownInstance { .. })
        ));
        assert_eq!(selector.chosen_kind(), Some("Account"));
    }

    #[test]
    fn test_with_current() {
        let current = Ref::new("t1", "Team");
        let selector = owner_selector().with_current(Some(&current));
        assert_eq!(selector.selected_id(), Some("t1"));

        let unlisted = Ref::new("t9", "Team");
        let selector = owner_selector().with_current(Some(&unlisted));
        assert_eq!(
            selector.state(),
            &SelectorState::TypeChosen { kind: "Team".to_string() }
        );

        let foreign = Ref::new("d1", "Device");
        assert_eq!(owner_selector().with_current(Some(&foreign)).state(), &SelectorState::Unselected);
    }
}
