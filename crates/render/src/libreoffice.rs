//! Slide rendering with LibreOffice and poppler.
//!
//! The deck is converted to PDF with `soffice --headless`, then each page is
//! rasterised to PNG with `pdftoppm` at the output video width.

use crate::tool::run_tool;
use async_trait::async_trait;
use deckcast_core::{Dimension, Error, Result, SlideImage, SlideRenderer};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// File name prefix for rasterised pages.
const PAGE_PREFIX: &str = "slide";

/// Impress PDF export that keeps hidden slides, so page N is always slide N.
const PDF_EXPORT_FILTER: &str =
    r#"pdf:impress_pdf_Export:{"ExportHiddenSlides":{"type":"boolean","value":"true"}}"#;

/// Renders slides through `soffice` and `pdftoppm`.
#[derive(Debug, Clone)]
pub struct LibreOfficeRenderer {
    /// Path to soffice executable.
    soffice: PathBuf,
    /// Path to pdftoppm executable.
    pdftoppm: PathBuf,
    dimension: Dimension,
}

impl LibreOfficeRenderer {
    /// Create a renderer that finds both tools in PATH.
    pub fn new(dimension: Dimension) -> Self {
        Self {
            soffice: PathBuf::from("soffice"),
            pdftoppm: PathBuf::from("pdftoppm"),
            dimension,
        }
    }

    /// Set a custom path to the soffice executable.
    pub fn with_soffice_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.soffice = path.into();
        self
    }

    /// Set a custom path to the pdftoppm executable.
    pub fn with_pdftoppm_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdftoppm = path.into();
        self
    }

    /// Arguments for exporting `input` as PDF into `workdir`.
    fn convert_args(&self, input: &Path, workdir: &Path) -> Vec<OsString> {
        // A private profile lets several conversions run side by side.
        let mut profile = OsString::from("-env:UserInstallation=file://");
        profile.push(workdir.join("profile"));

        vec![
            profile,
            "--headless".into(),
            "--convert-to".into(),
            PDF_EXPORT_FILTER.into(),
            "--outdir".into(),
            workdir.as_os_str().into(),
            input.as_os_str().into(),
        ]
    }

    /// Arguments for rasterising `pdf` to `<prefix>-N.png` files.
    ///
    /// Only the width is fixed so the deck keeps its aspect ratio.
    fn rasterise_args(&self, pdf: &Path, prefix: &Path) -> Vec<OsString> {
        vec![
            "-png".into(),
            "-scale-to-x".into(),
            self.dimension.width.to_string().into(),
            "-scale-to-y".into(),
            "-1".into(),
            pdf.as_os_str().into(),
            prefix.as_os_str().into(),
        ]
    }

    /// Convert the deck to PDF inside `workdir`, returning the PDF path.
    async fn convert_to_pdf(&self, input: &Path, workdir: &Path) -> Result<PathBuf> {
        run_tool(&self.soffice, &self.convert_args(input, workdir)).await?;

        let pdf = workdir.join(pdf_name(input).ok_or_else(|| Error::ExternalTool {
            tool: "soffice".to_string(),
            message: format!("input {} has no file name", input.display()),
        })?);

        if !pdf.exists() {
            return Err(Error::ExternalTool {
                tool: "soffice".to_string(),
                message: format!("expected {} after conversion", pdf.display()),
            });
        }
        Ok(pdf)
    }

    /// Rasterise every PDF page to PNG in `workdir`.
    async fn rasterise(&self, pdf: &Path, workdir: &Path) -> Result<()> {
        run_tool(
            &self.pdftoppm,
            &self.rasterise_args(pdf, &workdir.join(PAGE_PREFIX)),
        )
        .await?;
        Ok(())
    }
}

/// Name soffice gives the exported PDF: the input stem with `.pdf` appended.
fn pdf_name(input: &Path) -> Option<OsString> {
    let mut name = input.file_stem()?.to_os_string();
    name.push(".pdf");
    Some(name)
}

#[async_trait]
impl SlideRenderer for LibreOfficeRenderer {
    async fn render(&self, input: &Path) -> Result<Vec<SlideImage>> {
        let workdir = tempfile::tempdir()?;
        log::info!("Rendering slides of {}", input.display());

        let pdf = self.convert_to_pdf(input, workdir.path()).await?;
        self.rasterise(&pdf, workdir.path()).await?;

        let mut images = Vec::new();
        for (slide_number, path) in collect_page_images(workdir.path(), PAGE_PREFIX)? {
            let bytes = tokio::fs::read(&path).await?;
            images.push(SlideImage {
                slide_number,
                file_name: format!("slide_{}.png", slide_number),
                bytes,
            });
        }

        if images.is_empty() {
            return Err(Error::ExternalTool {
                tool: "pdftoppm".to_string(),
                message: format!("no pages rendered from {}", pdf.display()),
            });
        }

        Ok(images)
    }
}

/// Find `pdftoppm` output pages (`slide-1.png`, `slide-01.png`, ...) in page order.
///
/// pdftoppm zero-pads page numbers to the width of the page count, so the
/// number is parsed rather than relying on name order.
pub fn collect_page_images(dir: &Path, prefix: &str) -> Result<Vec<(usize, PathBuf)>> {
    let mut pages = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let page = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix(".png"))
            .and_then(|digits| digits.parse::<usize>().ok());

        if let Some(page) = page {
            pages.push((page, path));
        }
    }

    pages.sort_by_key(|(page, _)| *page);
    Ok(pages)
}
