//! XML import for `.rbxlx` place files
//!
//! Import runs in two steps. [`parse_import`] reads the whole document into
//! a list of [`ImportInstruction`]s and fails without side effects on
//! malformed input. [`apply_instructions`] then replays them against a
//! [`SceneSink`], so a broken file never leaves a half-built scene behind.
//!
//! Only `Item`s directly under the root whose `Name` is a known container
//! are descended into; everything else is skipped silently.

mod items;

use crate::config::ImportConfig;
use crate::error::{Error, Result};
use crate::model::{Color3, Quaternion, Vector3};
use quick_xml::Reader;
use quick_xml::events::Event;

pub use items::decompose_transform;

/// Everything needed to create one physical object
#[derive(Debug, Clone, PartialEq)]
pub struct PartOptions {
    /// `Part` or `SpawnLocation`
    pub class_name: String,
    /// Display name, the class name when the item had none
    pub name: String,
    /// World position
    pub position: Vector3,
    /// World orientation
    pub orientation: Quaternion,
    /// Size, zero when absent
    pub size: Vector3,
    /// Base colour, mid-gray when absent
    pub color: Color3,
    /// Anchored flag, false when absent
    pub anchored: bool,
    /// Collision flag, true when absent
    pub can_collide: bool,
    /// Locked flag, false when absent
    pub locked: bool,
}

/// One side effect the import will perform
#[derive(Debug, Clone, PartialEq)]
pub enum ImportInstruction {
    /// Create a physical object
    CreatePart(PartOptions),
    /// Create a script
    CreateScript {
        /// Script name
        name: String,
        /// Source text, empty when absent
        source: String,
        /// Name of the enclosing item
        parent_name: String,
    },
}

/// Notification raised after each creation, for UI collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationEvent<'a> {
    /// A physical object was created
    ObjectCreated {
        /// Class of the object
        class_name: &'a str,
        /// Name of the object
        name: &'a str,
    },
    /// A script was created
    ScriptAdded {
        /// Script name
        name: &'a str,
        /// Name of the enclosing item
        parent_name: &'a str,
    },
}

/// The scene-construction side of an import
pub trait SceneSink {
    /// Create a physical object
    fn create_object(&mut self, options: &PartOptions);

    /// Create a script with the given source
    fn create_script(&mut self, name: &str, source: &str);

    /// Observe a completed creation; ignored by default
    fn notify(&mut self, _event: &CreationEvent<'_>) {}
}

/// Counts of what an import created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Physical objects created
    pub objects: usize,
    /// Scripts created
    pub scripts: usize,
}

impl ImportSummary {
    /// Objects and scripts together
    pub fn total(&self) -> usize {
        self.objects + self.scripts
    }
}

/// Read an XML place document into creation instructions
///
/// Instructions come out in document order, each item before its children.
/// A `<!DOCTYPE>` in the prolog is rejected.
pub fn parse_import(xml: &str, config: &ImportConfig) -> Result<Vec<ImportInstruction>> {
    let mut reader = Reader::from_str(xml);
    let mut instructions = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            // DTDs can pull in external entities
            Event::DocType(_) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in place files".to_string(),
                ));
            }
            Event::Start(e) => {
                if seen_root {
                    reader.read_to_end(e.name())?;
                    continue;
                }
                seen_root = true;
                if e.name().as_ref() == b"roblox" {
                    items::read_root(&mut reader, config, &mut instructions)?;
                } else {
                    log::warn!(
                        "Root element is <{}>, not <roblox>; nothing to import",
                        String::from_utf8_lossy(e.name().as_ref())
                    );
                    reader.read_to_end(e.name())?;
                }
            }
            Event::Empty(_) => {
                if !seen_root {
                    log::warn!("No items found in the file");
                }
                seen_root = true;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(Error::InvalidXml("document has no root element".to_string()));
    }

    log::debug!("Parsed {} import instructions", instructions.len());
    Ok(instructions)
}

/// Replay parsed instructions against `sink`, in order
pub fn apply_instructions<S>(instructions: &[ImportInstruction], sink: &mut S) -> ImportSummary
where
    S: SceneSink + ?Sized,
{
    let mut summary = ImportSummary::default();

    for instruction in instructions {
        match instruction {
            ImportInstruction::CreatePart(options) => {
                sink.create_object(options);
                sink.notify(&CreationEvent::ObjectCreated {
                    class_name: &options.class_name,
                    name: &options.name,
                });
                summary.objects += 1;
            }
            ImportInstruction::CreateScript {
                name,
                source,
                parent_name,
            } => {
                sink.create_script(name, source);
                sink.notify(&CreationEvent::ScriptAdded {
                    name,
                    parent_name,
                });
                summary.scripts += 1;
            }
        }
    }

    summary
}
