//! Document loading
//!
//! Turns files on disk into plain text ready for chunking. Each format
//! has its own loader behind the [`DocumentLoader`] trait; the registry
//! dispatches on file extension.

use async_trait::async_trait;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::io::Read;
use std::path::{Path, PathBuf};

use folio_core::{DocumentKind, DocumentLoader, Error, LoadedDocument, Result};

/// Render markdown to plain text, keeping paragraph structure so the
/// chunker can still find boundaries. Code blocks survive verbatim,
/// formatting markers and link targets do not.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::new();
    let mut in_code_block = false;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                out.push('\n');
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                out.push('\n');
            }
            Event::Start(Tag::Item) => out.push_str("\n- "),
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Heading(_)) => {
                out.push_str("\n\n")
            }
            Event::End(TagEnd::List(_)) => {
                if !in_code_block {
                    out.push_str("\n\n");
                }
            }
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Plain `.txt` files
pub struct TextLoader;

#[async_trait]
impl DocumentLoader for TextLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["txt"]
    }

    async fn load(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::DocumentLoad(format!("{}: {}", path.display(), e)))
    }
}

/// Markdown files, returned raw so frontmatter survives for the pipeline
pub struct MarkdownLoader;

#[async_trait]
impl DocumentLoader for MarkdownLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["md", "markdown"]
    }

    async fn load(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::DocumentLoad(format!("{}: {}", path.display(), e)))
    }
}

/// PDF text extraction. The extraction itself is CPU-bound, so it runs on
/// the blocking pool.
pub struct PdfLoader;

#[async_trait]
impl DocumentLoader for PdfLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["pdf"]
    }

    async fn load(&self, path: &Path) -> Result<String> {
        let path = path.to_path_buf();
        let display = path.display().to_string();
        tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
            .await
            .map_err(|e| Error::DocumentLoad(format!("{}: {}", display, e)))?
            .map_err(|e| Error::DocumentLoad(format!("{}: {}", display, e)))
    }
}

/// DOCX loader: a docx file is a zip archive whose `word/document.xml`
/// holds the text runs.
pub struct DocxLoader;

fn extract_docx_text(path: &Path) -> Result<String> {
    let err = |e: String| Error::DocumentLoad(format!("{}: {}", path.display(), e));

    let file = std::fs::File::open(path).map_err(|e| err(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| err(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| err(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| err(e.to_string()))?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut out = String::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Text(t)) => {
                out.push_str(&t.unescape().map_err(|e| err(e.to_string()))?);
            }
            // Paragraph close marks a text boundary
            Ok(quick_xml::events::Event::End(e)) if e.name().as_ref() == b"w:p" => {
                out.push_str("\n\n");
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(err(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim().to_string())
}

#[async_trait]
impl DocumentLoader for DocxLoader {
    fn extensions(&self) -> &'static [&'static str] {
        &["docx"]
    }

    async fn load(&self, path: &Path) -> Result<String> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_docx_text(&path))
            .await
            .map_err(|e| Error::DocumentLoad(e.to_string()))?
    }
}

/// Extension-keyed loader dispatch
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn DocumentLoader>>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self {
            loaders: vec![
                Box::new(TextLoader),
                Box::new(MarkdownLoader),
                Box::new(PdfLoader),
                Box::new(DocxLoader),
            ],
        }
    }
}

impl LoaderRegistry {
    fn loader_for(&self, extension: &str) -> Option<&dyn DocumentLoader> {
        let extension = extension.to_ascii_lowercase();
        self.loaders
            .iter()
            .find(|l| l.extensions().contains(&extension.as_str()))
            .map(|l| l.as_ref())
    }

    fn kind_for(extension: &str) -> DocumentKind {
        match extension.to_ascii_lowercase().as_str() {
            "md" | "markdown" => DocumentKind::Markdown,
            "pdf" => DocumentKind::Pdf,
            "docx" => DocumentKind::Docx,
            _ => DocumentKind::Text,
        }
    }

    /// Load a single file, or None if no loader handles its extension
    pub async fn load_file(&self, path: &Path) -> Result<Option<LoadedDocument>> {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Ok(None);
        };
        let Some(loader) = self.loader_for(ext) else {
            return Ok(None);
        };

        let content = loader.load(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(Some(LoadedDocument {
            filename,
            content,
            kind: Self::kind_for(ext),
        }))
    }
}

fn collect_paths(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::DocumentLoad(format!("{}: {}", dir.display(), e)))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::DocumentLoad(e.to_string()))?;
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_paths(&path, recursive, out)?;
            }
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Load every supported document under `dir`. Unsupported extensions are
/// skipped with a warning; a file that fails to parse aborts the load so a
/// partial corpus is never ingested silently.
pub async fn load_documents(dir: &Path, recursive: bool) -> Result<Vec<LoadedDocument>> {
    let registry = LoaderRegistry::default();

    let mut paths = Vec::new();
    collect_paths(dir, recursive, &mut paths)?;
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        match registry.load_file(&path).await? {
            Some(mut doc) => {
                // Path relative to the ingest root; subdirectories classify
                // the document downstream
                doc.filename = path
                    .strip_prefix(dir)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .into_owned();
                tracing::debug!(file = %path.display(), chars = doc.content.len(), "loaded");
                documents.push(doc);
            }
            None => {
                tracing::warn!(file = %path.display(), "skipping unsupported file type");
            }
        }
    }

    Ok(documents)
}
