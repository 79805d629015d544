/// Visibility of the upload dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Hidden,
    /// Close button shown; clicking outside hides it.
    Dismissible,
    /// Close button hidden; clicks outside are ignored.
    Mandatory,
}

#[derive(Debug, Clone, Default)]
pub struct UploadModal {
    state: ModalState,
}

impl UploadModal {
    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn show(&mut self, mandatory: bool) -> ModalState {
        self.state = if mandatory {
            ModalState::Mandatory
        } else {
            ModalState::Dismissible
        };
        self.state
    }

    pub fn hide(&mut self) -> ModalState {
        self.state = ModalState::Hidden;
        self.state
    }

    /// Close button or a click outside the dialog. Returns the new state
    /// when anything changed.
    pub fn dismiss(&mut self) -> Option<ModalState> {
        match self.state {
            ModalState::Dismissible => Some(self.hide()),
            ModalState::Mandatory | ModalState::Hidden => None,
        }
    }

    /// Picking a file leaves mandatory mode entirely.
    pub fn file_chosen(&mut self) -> Option<ModalState> {
        if self.state == ModalState::Mandatory {
            self.state = ModalState::Dismissible;
            return Some(self.state);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandatory_modal_ignores_dismissal() {
        let mut modal = UploadModal::default();
        modal.show(true);
        assert_eq!(modal.dismiss(), None);
        assert_eq!(modal.state(), ModalState::Mandatory);
    }

    #[test]
    fn choosing_a_file_makes_the_modal_dismissible() {
        let mut modal = UploadModal::default();
        modal.show(true);
        assert_eq!(modal.file_chosen(), Some(ModalState::Dismissible));
        assert_eq!(modal.dismiss(), Some(ModalState::Hidden));
    }

    #[test]
    fn file_choice_outside_mandatory_mode_changes_nothing() {
        let mut modal = UploadModal::default();
        modal.show(false);
        assert_eq!(modal.file_chosen(), None);
        assert_eq!(modal.state(), ModalState::Dismissible);
    }
}
