//! Toolkit catalogue
//!
//! The generator never runs catalogue tools; it only needs their names and
//! descriptions to let the tool-selection agent choose among them. Each tool
//! group is a [`StaticToolkit`]; [`ToolCatalogue`] resolves group names to toolkits.

pub mod user_interaction;

use agent_generator_sdk::{async_trait, ToolInfo, Toolkit};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::error::{GeneratorError, Result};

pub use user_interaction::{AskFunction, UserInteractionToolkit};

/// Tool groups offered to the tool-selection step by default
pub const DEFAULT_TOOLKITS: [&str; 6] = ["search", "document", "image", "audio", "bash", "tabular"];

/// Toolkits keyed by group name, in request order
pub type ToolkitMap = IndexMap<String, Arc<dyn Toolkit>>;

/// A toolkit described by a fixed list of tools
#[derive(Debug, Clone)]
pub struct StaticToolkit {
    name: String,
    tools: Vec<ToolInfo>,
}

impl StaticToolkit {
    pub fn new(name: impl Into<String>, tools: Vec<ToolInfo>) -> Self {
        Self {
            name: name.into(),
            tools,
        }
    }
}

#[async_trait]
impl Toolkit for StaticToolkit {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_tools_in_agents(&self) -> anyhow::Result<Vec<ToolInfo>> {
        Ok(self.tools.clone())
    }
}

/// Catalogue file layout
#[derive(Debug, Deserialize)]
struct CatalogueFile {
    toolkits: IndexMap<String, Vec<CatalogueTool>>,
}

#[derive(Debug, Deserialize)]
struct CatalogueTool {
    name: String,
    #[serde(default)]
    description: String,
}

/// Resolves tool-group names to toolkits
#[derive(Clone)]
pub struct ToolCatalogue {
    toolkits: ToolkitMap,
}

impl ToolCatalogue {
    pub fn empty() -> Self {
        Self {
            toolkits: IndexMap::new(),
        }
    }

    /// Catalogue describing the built-in tool groups
    pub fn builtin() -> Self {
        let groups: [(&str, &[(&str, &str)]); 6] = [
            (
                "search",
                &[
                    ("web_search", "Search the web and return the top results with titles, links and snippets."),
                    ("web_qa", "Answer a question about the content of a web page given its URL."),
                ],
            ),
            (
                "document",
                &[
                    ("pdf_reader", "Extract the text of a PDF document from a local path or URL."),
                    ("document_qa", "Answer a question about a document (PDF, DOCX, PPTX, XLSX, TXT)."),
                ],
            ),
            (
                "image",
                &[("image_qa", "Answer a question about an image from a local path or URL.")],
            ),
            (
                "audio",
                &[
                    ("audio_transcribe", "Transcribe speech in an audio file to text."),
                    ("audio_qa", "Answer a question about the content of an audio file."),
                ],
            ),
            (
                "bash",
                &[("run_bash", "Run a bash command in a sandboxed shell and return its output.")],
            ),
            (
                "tabular",
                &[
                    ("get_tabular_columns", "List the columns of a CSV, TSV or Excel file."),
                    ("get_column_info", "Summarize the values and types of the columns of a tabular file."),
                ],
            ),
        ];

        let mut catalogue = Self::empty();
        for (group, tools) in groups {
            let tools = tools
                .iter()
                .map(|(name, description)| ToolInfo::new(*name, *description))
                .collect();
            catalogue = catalogue.with_toolkit(Arc::new(StaticToolkit::new(group, tools)));
        }
        catalogue
    }

    /// Catalogue containing only the groups described in `yaml`
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: CatalogueFile = serde_yaml::from_str(yaml)
            .map_err(|e| GeneratorError::Config(format!("invalid toolkit catalogue: {}", e)))?;

        let mut catalogue = Self::empty();
        for (group, tools) in file.toolkits {
            let tools = tools
                .into_iter()
                .map(|t| ToolInfo::new(t.name, t.description))
                .collect();
            catalogue = catalogue.with_toolkit(Arc::new(StaticToolkit::new(group, tools)));
        }
        Ok(catalogue)
    }

    /// Built-in catalogue with the groups of the file at `path` added or replaced
    pub fn load(path: &Path) -> Result<Self> {
        let yaml =
            std::fs::read_to_string(path).map_err(|e| GeneratorError::io(path, e))?;
        let overrides = Self::from_yaml(&yaml)?;
        Ok(Self::builtin().merge(overrides))
    }

    /// Add a toolkit, replacing any toolkit with the same name
    pub fn with_toolkit(mut self, toolkit: Arc<dyn Toolkit>) -> Self {
        self.toolkits.insert(toolkit.name().to_string(), toolkit);
        self
    }

    pub fn merge(mut self, other: ToolCatalogue) -> Self {
        for (name, toolkit) in other.toolkits {
            self.toolkits.insert(name, toolkit);
        }
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.toolkits.keys().map(String::as_str)
    }

    /// Resolve `names` to their toolkits, preserving the requested order
    pub fn get_toolkits_map(&self, names: &[String]) -> Result<ToolkitMap> {
        names
            .iter()
            .map(|name| {
                self.toolkits
                    .get(name)
                    .map(|toolkit| (name.clone(), Arc::clone(toolkit)))
                    .ok_or_else(|| GeneratorError::UnknownToolkit(name.clone()))
            })
            .collect()
    }
}

impl Default for ToolCatalogue {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for ToolCatalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCatalogue")
            .field("toolkits", &self.toolkits.keys().collect::<Vec<_>>())
            .finish()
    }
}
