/*!
 * Document collaborator boundary.
 *
 * Container parsing (EPUB/HTML extraction and rewriting) lives outside
 * the pipeline; this module only fixes the contract: a document exposes,
 * per chapter, an ordered list of translatable blocks, and accepts a
 * same-length list of rendered target blocks spliced back node-for-node.
 */

use crate::errors::PipelineError;

/// A chaptered document the pipeline can read blocks from and write
/// rendered output back into.
pub trait DocumentSource {
    /// Total number of chapters in document order
    fn chapter_count(&self) -> usize;

    /// The ordered translatable blocks of one chapter. An empty vector
    /// means the chapter has nothing to translate.
    fn chapter_blocks(&self, chapter: usize) -> Vec<String>;

    /// Splice rendered target blocks back into the chapter, one per
    /// source block. Implementations must reject length mismatches.
    fn apply_chapter(&mut self, chapter: usize, rendered: &[String]) -> Result<(), PipelineError>;
}

/// In-memory document, the reference adapter and test double
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocument {
    /// Source blocks per chapter
    chapters: Vec<Vec<String>>,
    /// Rendered blocks per chapter, filled by apply_chapter
    rendered: Vec<Option<Vec<String>>>,
}

impl InMemoryDocument {
    /// Build a document from per-chapter block lists
    pub fn new(chapters: Vec<Vec<String>>) -> Self {
        let rendered = vec![None; chapters.len()];
        Self { chapters, rendered }
    }

    /// Rendered output of a chapter, if it was applied
    pub fn rendered_chapter(&self, chapter: usize) -> Option<&Vec<String>> {
        self.rendered.get(chapter).and_then(|r| r.as_ref())
    }
}

impl DocumentSource for InMemoryDocument {
    fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    fn chapter_blocks(&self, chapter: usize) -> Vec<String> {
        self.chapters.get(chapter).cloned().unwrap_or_default()
    }

    fn apply_chapter(&mut self, chapter: usize, rendered: &[String]) -> Result<(), PipelineError> {
        let source_len = self
            .chapters
            .get(chapter)
            .map(|blocks| blocks.len())
            .ok_or_else(|| PipelineError::Document(format!("no such chapter: {}", chapter)))?;
        if rendered.len() != source_len {
            return Err(PipelineError::Document(format!(
                "chapter {}: {} rendered blocks for {} source nodes",
                chapter,
                rendered.len(),
                source_len
            )));
        }
        self.rendered[chapter] = Some(rendered.to_vec());
        Ok(())
    }
}
