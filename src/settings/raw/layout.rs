use facetree_widgets::WidgetSpec;
use serde::Deserialize;

/// `[[layout.widgets]]` entries, mounted on the root index in order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct LayoutSection {
    pub(super) widgets: Vec<WidgetSpec>,
}
