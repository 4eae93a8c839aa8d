//! The view-state store: scroll positions, edit mode, and which secondary
//! views are showing.

use crate::store::StoreState;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The clock list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterViewState {
    pub scroll_offset_y: f64,
    pub is_editing: bool,
}

/// The detail/edit screen for one timezone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailViewState {
    pub uuid: Uuid,
}

/// The timezone picker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionViewState {
    pub scroll_offset_y: f64,
    pub search_text: String,
}

/// The whole view tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub master_view: MasterViewState,
    /// Present while a detail view is shown.
    pub detail_view: Option<DetailViewState>,
    /// Present while the picker is shown.
    pub selection_view: Option<SelectionViewState>,
}

/// A requested view change.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewStateMutation {
    ScrollMaster(f64),
    ScrollSelection(f64),
    /// Show the detail view for a timezone, or hide it.
    SelectDetail(Option<Uuid>),
    ToggleEditMode,
    SetSearchText(String),
    SetSelectionVisible(bool),
}

/// The view change that happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    MasterScrolled,
    EditModeChanged,
    DetailChanged,
    SelectionVisibilityChanged,
    SelectionScrolled,
    SearchTextChanged,
}

impl fmt::Display for ViewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViewAction::MasterScrolled => "Scroll clocks",
            ViewAction::EditModeChanged => "Toggle edit mode",
            ViewAction::DetailChanged => "Change selection",
            ViewAction::SelectionVisibilityChanged => "Toggle timezone picker",
            ViewAction::SelectionScrolled => "Scroll timezone picker",
            ViewAction::SearchTextChanged => "Search timezones",
        };
        f.write_str(label)
    }
}

impl StoreState for ViewState {
    const NAME: &'static str = "view_state";
    type Mutation = ViewStateMutation;
    type Change = ViewAction;

    fn apply(&mut self, mutation: ViewStateMutation) -> Option<ViewAction> {
        match mutation {
            ViewStateMutation::ScrollMaster(offset) => {
                if !offset.is_finite() || self.master_view.scroll_offset_y == offset {
                    return None;
                }
                self.master_view.scroll_offset_y = offset;
                Some(ViewAction::MasterScrolled)
            }
            ViewStateMutation::ScrollSelection(offset) => {
                let selection = self.selection_view.as_mut()?;
                if !offset.is_finite() || selection.scroll_offset_y == offset {
                    return None;
                }
                selection.scroll_offset_y = offset;
                Some(ViewAction::SelectionScrolled)
            }
            ViewStateMutation::SelectDetail(uuid) => {
                let next = uuid.map(|uuid| DetailViewState { uuid });
                if self.detail_view == next {
                    return None;
                }
                self.detail_view = next;
                Some(ViewAction::DetailChanged)
            }
            ViewStateMutation::ToggleEditMode => {
                self.master_view.is_editing = !self.master_view.is_editing;
                Some(ViewAction::EditModeChanged)
            }
            ViewStateMutation::SetSearchText(text) => {
                let selection = self.selection_view.as_mut()?;
                if selection.search_text == text {
                    return None;
                }
                selection.search_text = text;
                Some(ViewAction::SearchTextChanged)
            }
            ViewStateMutation::SetSelectionVisible(visible) => {
                if self.selection_view.is_some() == visible {
                    return None;
                }
                self.selection_view = visible.then(SelectionViewState::default);
                Some(ViewAction::SelectionVisibilityChanged)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clocks_history::Snapshot;

    #[test]
    fn test_scroll_master() {
        let mut view = ViewState::default();
        assert_eq!(
            view.apply(ViewStateMutation::ScrollMaster(120.0)),
            Some(ViewAction::MasterScrolled)
        );
        assert_eq!(view.apply(ViewStateMutation::ScrollMaster(120.0)), None);
        assert_eq!(view.master_view.scroll_offset_y, 120.0);
    }

    #[test]
    fn test_non_finite_scroll_ignored() {
        let mut view = ViewState::default();
        assert_eq!(view.apply(ViewStateMutation::ScrollMaster(f64::NAN)), None);
        assert_eq!(view.apply(ViewStateMutation::ScrollMaster(f64::INFINITY)), None);
        assert_eq!(view.master_view.scroll_offset_y, 0.0);
    }

    #[test]
    fn test_toggle_edit_mode() {
        let mut view = ViewState::default();
        view.apply(ViewStateMutation::ToggleEditMode);
        assert!(view.master_view.is_editing);
        view.apply(ViewStateMutation::ToggleEditMode);
        assert!(!view.master_view.is_editing);
    }

    #[test]
    fn test_select_detail() {
        let mut view = ViewState::default();
        let id = Uuid::from_u128(7);

        assert_eq!(view.apply(ViewStateMutation::SelectDetail(None)), None);
        assert_eq!(
            view.apply(ViewStateMutation::SelectDetail(Some(id))),
            Some(ViewAction::DetailChanged)
        );
        assert_eq!(view.apply(ViewStateMutation::SelectDetail(Some(id))), None);
        assert_eq!(view.detail_view, Some(DetailViewState { uuid: id }));

        view.apply(ViewStateMutation::SelectDetail(None));
        assert_eq!(view.detail_view, None);
    }

    #[test]
    fn test_hidden_selection_ignores_scroll_and_search() {
        let mut view = ViewState::default();
        assert_eq!(view.apply(ViewStateMutation::ScrollSelection(10.0)), None);
        assert_eq!(
            view.apply(ViewStateMutation::SetSearchText("par".to_string())),
            None
        );
        assert_eq!(view.selection_view, None);
    }

    #[test]
    fn test_selection_lifecycle() {
        let mut view = ViewState::default();
        assert_eq!(view.apply(ViewStateMutation::SetSelectionVisible(false)), None);
        assert_eq!(
            view.apply(ViewStateMutation::SetSelectionVisible(true)),
            Some(ViewAction::SelectionVisibilityChanged)
        );
        assert_eq!(view.apply(ViewStateMutation::SetSelectionVisible(true)), None);

        assert_eq!(
            view.apply(ViewStateMutation::SetSearchText("par".to_string())),
            Some(ViewAction::SearchTextChanged)
        );
        assert_eq!(
            view.apply(ViewStateMutation::SetSearchText("par".to_string())),
            None
        );
        assert_eq!(
            view.apply(ViewStateMutation::ScrollSelection(40.0)),
            Some(ViewAction::SelectionScrolled)
        );

        let selection = view.selection_view.clone().unwrap();
        assert_eq!(selection.search_text, "par");
        assert_eq!(selection.scroll_offset_y, 40.0);

        view.apply(ViewStateMutation::SetSelectionVisible(false));
        assert_eq!(view.selection_view, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let view: ViewState =
            serde_json::from_str(r#"{"master_view": {"is_editing": true}, "unknown": 1}"#).unwrap();
        assert!(view.master_view.is_editing);
        assert_eq!(view.master_view.scroll_offset_y, 0.0);
        assert_eq!(view.detail_view, None);
        assert_eq!(view.selection_view, None);
    }

    #[test]
    fn test_scroll_offsets_survive_snapshot() {
        let mut offset = 0.1_f64;
        for step in 0..5_000 {
            offset = offset * 1.618_033_988_749_895 + f64::from(step) / 7.0;
            if offset > 1.0e12 {
                offset = offset.sqrt() / 3.0;
            }

            let mut view = ViewState::default();
            view.apply(ViewStateMutation::ScrollMaster(offset));
            view.apply(ViewStateMutation::SetSelectionVisible(true));
            view.apply(ViewStateMutation::ScrollSelection(-offset / 11.0));

            let snapshot = Snapshot::encode(ViewState::NAME, &view).unwrap();
            let decoded: ViewState = snapshot.decode(ViewState::NAME).unwrap();
            assert_eq!(decoded, view, "scroll offset {offset:e} changed after decode");
        }
    }
}
