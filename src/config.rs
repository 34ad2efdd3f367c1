//! Configuration for the encoders and the XML import

use std::collections::HashSet;

use crate::extract::TreeIndex;
use crate::model::schema::SERVICE_NAMES;

/// Default scratch buffer size for binary export (1 MiB)
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Default limit on `<Item>` nesting during import
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options for the binary chunk writer
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryConfig {
    metadata: Vec<(String, String)>,
    initial_capacity: usize,
}

impl BinaryConfig {
    /// Default configuration: one `ExplicitAutoJoints = true` META entry
    pub fn new() -> Self {
        Self {
            metadata: vec![("ExplicitAutoJoints".to_string(), "true".to_string())],
            initial_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Replace the META chunk entries
    pub fn with_metadata<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Set the initial scratch buffer size; it doubles when exceeded
    pub fn with_initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    /// META chunk entries
    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    /// Initial scratch buffer size
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }
}

impl Default for BinaryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for the XML writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlConfig {
    indent: Option<usize>,
    static_services: bool,
}

impl XmlConfig {
    /// Two-space indentation with the static services appended
    pub fn new() -> Self {
        Self {
            indent: Some(2),
            static_services: true,
        }
    }

    /// Indent nested elements by `width` spaces
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = Some(width);
        self
    }

    /// Write everything on one line
    pub fn compact(mut self) -> Self {
        self.indent = None;
        self
    }

    /// Whether to append StarterPlayer, HttpService and TestService items
    pub fn with_static_services(mut self, enabled: bool) -> Self {
        self.static_services = enabled;
        self
    }

    /// Indentation width, `None` for compact output
    pub fn indent(&self) -> Option<usize> {
        self.indent
    }

    /// Whether the static services are appended
    pub fn static_services(&self) -> bool {
        self.static_services
    }
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for the XML import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    known_containers: HashSet<String>,
    max_depth: usize,
}

impl ImportConfig {
    /// Recognise the standard service names as top-level containers
    pub fn new() -> Self {
        Self {
            known_containers: SERVICE_NAMES.iter().map(|s| s.to_string()).collect(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Recognise exactly the root-level identifiers of `index`
    pub fn from_index(index: &TreeIndex) -> Self {
        Self {
            known_containers: index.root_children().iter().cloned().collect(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Add one more recognised container name
    pub fn with_container(mut self, name: impl Into<String>) -> Self {
        self.known_containers.insert(name.into());
        self
    }

    /// Limit `<Item>` nesting; deeper documents are rejected
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Whether a top-level item with this name is imported
    pub fn is_known_container(&self, name: &str) -> bool {
        self.known_containers.contains(name)
    }

    /// Maximum `<Item>` nesting depth
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::new()
    }
}
