use std::fmt;

use super::Mountable;

/// An index waiting to be mounted, together with the widgets it will own.
pub struct IndexWidget {
    index_name: String,
    index_id: String,
    widgets: Vec<Mountable>,
}

/// Create an index over `index_name`; its id defaults to the index name.
pub fn index(index_name: impl Into<String>) -> IndexWidget {
    let index_name = index_name.into();
    IndexWidget {
        index_id: index_name.clone(),
        index_name,
        widgets: Vec::new(),
    }
}

impl IndexWidget {
    #[must_use]
    pub fn with_id(mut self, index_id: impl Into<String>) -> Self {
        self.index_id = index_id.into();
        self
    }

    /// Queue widgets to mount, after the ones already queued.
    #[must_use]
    pub fn add_widgets(mut self, widgets: impl IntoIterator<Item = Mountable>) -> Self {
        self.widgets.extend(widgets);
        self
    }

    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    #[must_use]
    pub fn index_id(&self) -> &str {
        &self.index_id
    }

    pub(crate) fn widgets(&self) -> &[Mountable] {
        &self.widgets
    }

    pub(crate) fn into_parts(self) -> (String, String, Vec<Mountable>) {
        (self.index_name, self.index_id, self.widgets)
    }
}

impl fmt::Debug for IndexWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexWidget")
            .field("index_name", &self.index_name)
            .field("index_id", &self.index_id)
            .field("widgets", &self.widgets)
            .finish()
    }
}
