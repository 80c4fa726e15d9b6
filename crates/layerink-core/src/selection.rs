//! Canonical layer selection shared by the layer list and the canvas.

use crate::layer::LayerId;
use crate::scene::{SceneAdapter, SceneEvent};
use crate::store::LayerStore;

/// The canonical selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(LayerId),
}

impl Selection {
    pub fn id(&self) -> Option<&str> {
        match self {
            Selection::Unselected => None,
            Selection::Selected(id) => Some(id),
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.id() == Some(id)
    }
}

/// Something that asks for the selection to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionInput {
    /// The canvas picked the object tagged with this layer id.
    PointerSelected(LayerId),
    /// The canvas lost its active object.
    PointerCleared,
    /// The user clicked a row in the layer list.
    ListClicked(LayerId),
    /// A layer was removed from the store.
    LayerDeleted(LayerId),
}

impl From<SceneEvent> for SelectionInput {
    fn from(event: SceneEvent) -> Self {
        match event {
            SceneEvent::Selected(id) => SelectionInput::PointerSelected(id),
            SceneEvent::Cleared => SelectionInput::PointerCleared,
        }
    }
}

/// Single writer of the canonical selection.
///
/// Every change goes through [`SelectionCoordinator::apply`], which writes the
/// store's selected id and projects the result onto the canvas, so the list
/// and the canvas never disagree about which layer is selected.
#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    current: Selection,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Selection {
        &self.current
    }

    /// The state `input` leads to from `current`.
    pub fn transition(current: &Selection, input: &SelectionInput) -> Selection {
        match input {
            SelectionInput::PointerSelected(id) | SelectionInput::ListClicked(id) => {
                Selection::Selected(id.clone())
            }
            SelectionInput::PointerCleared => Selection::Unselected,
            SelectionInput::LayerDeleted(id) => {
                if current.is_selected(id) {
                    Selection::Unselected
                } else {
                    current.clone()
                }
            }
        }
    }

    /// Apply an input and fan the result out to the store and the canvas.
    ///
    /// Selecting an id the store does not hold is ignored. Returns true if
    /// the canonical selection changed.
    pub fn apply(
        &mut self,
        input: SelectionInput,
        store: &mut LayerStore,
        scene: Option<&mut SceneAdapter>,
    ) -> bool {
        if let SelectionInput::PointerSelected(id) | SelectionInput::ListClicked(id) = &input {
            if !store.contains(id) {
                log::warn!("Ignoring selection of unknown layer {}", id);
                return false;
            }
        }

        let next = Self::transition(&self.current, &input);
        let changed = next != self.current;
        self.current = next;
        self.resync(store, scene);
        changed
    }

    /// Write the canonical selection to the store and the canvas again.
    pub fn resync(&self, store: &mut LayerStore, scene: Option<&mut SceneAdapter>) {
        let id = self.current.id();
        store.select(id.map(str::to_string));
        if let Some(scene) = scene {
            scene.project_selection(id);
        }
    }

    /// Back to `Unselected`, without fan-out.
    pub fn reset(&mut self) {
        self.current = Selection::Unselected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{BASE_LAYER_ID, Layer, SegmentDescriptor};
    use kurbo::{Point, Size};

    fn segment(id: &str) -> SegmentDescriptor {
        SegmentDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            path: "M 0 0 L 100 0 L 100 100 L 0 100 Z".to_string(),
            color: "#4ecdc4".to_string(),
            bbox: None,
            confidence: None,
        }
    }

    fn fixture() -> (LayerStore, SceneAdapter) {
        let mut store = LayerStore::new();
        let mut scene = SceneAdapter::mount(Size::new(800.0, 600.0));
        scene.place_base_image(400, 300).unwrap();
        store.add_or_replace(Layer::base_image("a.png")).unwrap();
        for id in ["a", "b"] {
            scene.materialize_segment(&segment(id), 0.7).unwrap();
            store.add_or_replace(Layer::from_segment(segment(id), 0.7)).unwrap();
        }
        (store, scene)
    }

    #[test]
    fn test_list_click_projects_to_canvas() {
        let (mut store, mut scene) = fixture();
        let mut selection = SelectionCoordinator::new();
        assert!(selection.apply(SelectionInput::ListClicked("a".into()), &mut store, Some(&mut scene)));
        assert_eq!(store.selected(), Some("a"));
        assert_eq!(scene.active(), Some("a"));
    }

    #[test]
    fn test_pointer_selection_reaches_store() {
        let (mut store, mut scene) = fixture();
        let mut selection = SelectionCoordinator::new();
        let event = scene.pointer_down(Point::new(50.0, 50.0));
        selection.apply(event.into(), &mut store, Some(&mut scene));
        assert_eq!(selection.current(), &Selection::Selected("b".into()));
        assert_eq!(store.selected(), Some("b"));
        assert_eq!(scene.active(), Some("b"));

        let event = scene.pointer_down(Point::new(700.0, 10.0));
        assert_eq!(event, SceneEvent::Cleared);
        selection.apply(event.into(), &mut store, Some(&mut scene));
        assert_eq!(store.selected(), None);
        assert_eq!(scene.active(), None);
    }

    #[test]
    fn test_deleting_other_layer_keeps_selection() {
        let (mut store, mut scene) = fixture();
        let mut selection = SelectionCoordinator::new();
        selection.apply(SelectionInput::ListClicked("a".into()), &mut store, Some(&mut scene));

        store.remove("b");
        scene.remove_object("b");
        assert!(!selection.apply(SelectionInput::LayerDeleted("b".into()), &mut store, Some(&mut scene)));
        assert_eq!(store.selected(), Some("a"));

        store.remove("a");
        scene.remove_object("a");
        assert!(selection.apply(SelectionInput::LayerDeleted("a".into()), &mut store, Some(&mut scene)));
        assert_eq!(selection.current(), &Selection::Unselected);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let (mut store, mut scene) = fixture();
        let mut selection = SelectionCoordinator::new();
        selection.apply(SelectionInput::ListClicked("a".into()), &mut store, Some(&mut scene));
        assert!(!selection.apply(SelectionInput::ListClicked("nope".into()), &mut store, Some(&mut scene)));
        assert_eq!(store.selected(), Some("a"));
    }

    #[test]
    fn test_base_layer_selected_in_list_only() {
        let (mut store, mut scene) = fixture();
        let mut selection = SelectionCoordinator::new();
        selection.apply(
            SelectionInput::ListClicked(BASE_LAYER_ID.into()),
            &mut store,
            Some(&mut scene),
        );
        assert_eq!(store.selected(), Some(BASE_LAYER_ID));
        assert_eq!(scene.active(), None);
    }

    #[test]
    fn test_works_without_canvas() {
        let (mut store, _) = fixture();
        let mut selection = SelectionCoordinator::new();
        selection.apply(SelectionInput::ListClicked("b".into()), &mut store, None);
        assert_eq!(store.selected(), Some("b"));
    }

    #[test]
    fn test_transition_table() {
        let selected = Selection::Selected("a".into());
        assert_eq!(
            SelectionCoordinator::transition(&Selection::Unselected, &SelectionInput::PointerCleared),
            Selection::Unselected
        );
        assert_eq!(
            SelectionCoordinator::transition(&selected, &SelectionInput::PointerSelected("b".into())),
            Selection::Selected("b".into())
        );
        assert_eq!(
            SelectionCoordinator::transition(&Selection::Unselected, &SelectionInput::LayerDeleted("a".into())),
            Selection::Unselected
        );
    }
}
