//! Writing a finished item to disk.

use explodeit_core::{GenerationItem, InlineData, MIME_MP4, MIME_PNG, MIME_WAV, UsageTotals};
use explodeit_error::{ExplodeItResult, JsonError, StorageError, StorageErrorKind};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

fn extension(mime_type: &str) -> &'static str {
    match mime_type {
        MIME_PNG => "png",
        MIME_MP4 => "mp4",
        MIME_WAV => "wav",
        "image/jpeg" => "jpg",
        _ => "bin",
    }
}

/// Writes an item's assets, article, plan and usage ledger into a directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Writer rooted at `dir`. Each item gets its own subdirectory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory that holds the files of `item`.
    pub fn item_dir(&self, item: &GenerationItem) -> PathBuf {
        self.dir.join(item.id().as_str())
    }

    /// Write every artifact `item` has so far and return the written paths.
    ///
    /// Missing artifacts are skipped, so a failed run still leaves whatever
    /// its finished stages produced.
    #[instrument(skip(self, item), fields(id = %item.id()))]
    pub fn write(&self, item: &GenerationItem) -> ExplodeItResult<Vec<PathBuf>> {
        let dir = self.item_dir(item);
        std::fs::create_dir_all(&dir).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                dir.display(),
                e
            )))
        })?;

        let mut written = Vec::new();
        let media = [
            ("infographic", item.infographic_url()),
            ("assembled", item.assembled_url()),
            ("animation", item.video_url()),
            ("narration", item.audio_url()),
        ];
        for (stem, url) in media {
            if let Some(url) = url {
                let data = InlineData::from_data_url(url)?;
                let path = dir.join(format!("{stem}.{}", extension(&data.mime_type)));
                write_file(&path, &data.data)?;
                written.push(path);
            }
        }

        if let Some(script) = item.narration_script() {
            let path = dir.join("narration.txt");
            write_file(&path, script.as_bytes())?;
            written.push(path);
        }

        if let Some(plan) = item.plan() {
            let json = serde_json::to_vec_pretty(plan).map_err(|e| JsonError::new(e.to_string()))?;
            let path = dir.join("plan.json");
            write_file(&path, &json)?;
            written.push(path);

            let path = dir.join("article.md");
            write_file(&path, render_article(item).as_bytes())?;
            written.push(path);
        }

        let ledger = serde_json::json!({
            "records": item.usage(),
            "totals": UsageTotals::from_records(item.usage()),
        });
        let json = serde_json::to_vec_pretty(&ledger).map_err(|e| JsonError::new(e.to_string()))?;
        let path = dir.join("usage.json");
        write_file(&path, &json)?;
        written.push(path);

        debug!(files = written.len(), "Artifacts written");
        Ok(written)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    std::fs::write(path, contents).map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })
}

/// Markdown article for an item: origin, anatomy with the enriched parts,
/// the long-form article, trivia and every cited source.
///
/// Returns an empty string until the item has a plan.
pub fn render_article(item: &GenerationItem) -> String {
    let Some(plan) = item.plan() else {
        return String::new();
    };
    let titles = &plan.section_titles;
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", plan.display_title);
    let _ = writeln!(out, "*{}*\n", plan.category);
    let _ = writeln!(out, "## {}\n\n{}\n", titles.origin, plan.origin_story);

    let _ = writeln!(out, "## {}\n", titles.anatomy);
    let mut sources: Vec<&str> = Vec::new();
    for part in item.components().iter().flatten() {
        let _ = writeln!(out, "### {}\n", part.name);
        if !part.composition.is_empty() {
            let _ = writeln!(out, "**Composition:** {}\n", part.composition);
        }
        let _ = writeln!(out, "{}\n", part.short_description);
        if let Some(body) = part.detailed_content.as_deref().filter(|b| !b.is_empty()) {
            let _ = writeln!(out, "{body}\n");
        }
        for url in part.sources.iter().flatten() {
            if !sources.contains(&url.as_str()) {
                sources.push(url);
            }
        }
    }

    let _ = writeln!(out, "## {}\n\n{}\n", titles.article, plan.detailed_article);

    let _ = writeln!(out, "## {}\n", titles.trivia);
    for fact in &plan.trivia {
        let _ = writeln!(out, "- {fact}");
    }

    if !sources.is_empty() {
        let _ = writeln!(out, "\n## Sources\n");
        for url in sources {
            let _ = writeln!(out, "- <{url}>");
        }
    }
    out
}
