//! LayerInk command-line driver
//!
//! Opens an image through the LayerInk service, optionally imports its
//! segments, applies layer edits given on the command line, prints the layer
//! list and writes an export.

use clap::Parser;
use layerink_core::api::{ApiError, ExportService, SegmentationService, UploadService};
use layerink_core::{
    DecodingLoader, Editor, EditorConfig, EditorError, ExportFormat, HttpClient, ImageSource, Layer,
    LayerPatch,
};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "layerink", version, about = "Segment an image into editable layers")]
pub struct Cli {
    /// Image to open
    pub image: PathBuf,

    /// Root URL of the LayerInk service
    #[arg(long, default_value = "http://localhost:8000")]
    pub api: String,

    /// Import segments for the image
    #[arg(long)]
    pub segments: bool,

    /// Hide a layer (repeatable)
    #[arg(long = "hide", value_name = "ID")]
    pub hide: Vec<String>,

    /// Lock a layer (repeatable)
    #[arg(long = "lock", value_name = "ID")]
    pub lock: Vec<String>,

    /// Select a layer before printing
    #[arg(long, value_name = "ID")]
    pub select: Option<String>,

    /// Export the result (svg or psd)
    #[arg(long, value_name = "FORMAT")]
    pub export: Option<ExportFormat>,

    /// Directory the export is written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Editor(#[from] EditorError),
}

/// Run against the service named on the command line.
pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let config = EditorConfig::default().with_api_base_url(cli.api.clone());
    let client = HttpClient::new(&config.api_base_url)?;
    let mut editor = Editor::new(config);
    let mut stdout = std::io::stdout().lock();
    drive(cli, &mut editor, &client, &mut stdout).await?;
    Ok(())
}

/// Execute the command line against `editor` and `service`.
///
/// Returns the path of the written export, if any.
pub async fn drive<S>(
    cli: &Cli,
    editor: &mut Editor,
    service: &S,
    out: &mut impl Write,
) -> Result<Option<PathBuf>, CliError>
where
    S: UploadService + SegmentationService + ExportService,
{
    let source = ImageSource::from_path(&cli.image)?;
    let placement = editor.open_image(source, service, &DecodingLoader).await?;
    log::info!(
        "Opened {} at scale {:.3}",
        cli.image.display(),
        placement.scale
    );

    if cli.segments {
        let report = editor.import_segments(service).await?;
        writeln!(out, "Imported {} segments", report.imported.len())?;
        for skipped in &report.skipped {
            writeln!(out, "Skipped {}: {}", skipped.id, skipped.reason)?;
        }
    }

    for id in &cli.hide {
        editor.update_layer(id, &LayerPatch::new().visible(false))?;
    }
    for id in &cli.lock {
        editor.update_layer(id, &LayerPatch::new().locked(true))?;
    }
    if let Some(id) = &cli.select {
        if !editor.select_layer(id) && editor.selected_id() != Some(id.as_str()) {
            log::warn!("No layer {} to select", id);
        }
    }

    write!(out, "{}", render_layer_list(editor.layers(), editor.selected_id()))?;

    let Some(format) = cli.export else {
        return Ok(None);
    };
    let artifact = editor.export(format, service).await?;
    let path = artifact.save_in(&cli.out)?;
    writeln!(out, "Exported {}", path.display())?;
    Ok(Some(path))
}

/// Layer list, top-most layer first.
///
/// Columns: selection marker, visibility, lock, name, kind, opacity, id.
pub fn render_layer_list(layers: &[Layer], selected: Option<&str>) -> String {
    let mut text = String::new();
    for layer in layers.iter().rev() {
        let marker = if selected == Some(layer.id.as_str()) { '>' } else { ' ' };
        let visible = if layer.visible { 'V' } else { '-' };
        let locked = if layer.locked { 'L' } else { '-' };
        text.push_str(&format!(
            "{} {}{} {:<20} {:<5} {:>3}%  {}\n",
            marker,
            visible,
            locked,
            layer.name,
            layer.kind.as_str(),
            (layer.opacity * 100.0).round(),
            layer.id
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerink_core::MemoryService;
    use layerink_core::layer::SegmentDescriptor;
    use std::io::Cursor;

    fn write_png(dir: &std::path::Path) -> PathBuf {
        let image = image::RgbaImage::from_pixel(40, 30, image::Rgba([1, 2, 3, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let path = dir.join("photo.png");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn service() -> MemoryService {
        MemoryService::with_segments(vec![SegmentDescriptor {
            id: "segment-1".to_string(),
            name: "Person".to_string(),
            path: "M 0 0 L 10 0 L 10 10 Z".to_string(),
            color: "#ff6b6b".to_string(),
            bbox: None,
            confidence: Some(0.95),
        }])
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from([
            "layerink",
            "photo.png",
            "--segments",
            "--hide",
            "a",
            "--hide",
            "b",
            "--export",
            "psd",
        ])
        .unwrap();
        assert!(cli.segments);
        assert_eq!(cli.hide, vec!["a", "b"]);
        assert_eq!(cli.export, Some(ExportFormat::Psd));
        assert_eq!(cli.api, "http://localhost:8000");

        assert!(Cli::try_parse_from(["layerink", "photo.png", "--export", "gif"]).is_err());
    }

    #[tokio::test]
    async fn test_drive_imports_edits_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_png(dir.path());
        let out_dir = dir.path().join("out");
        let image = image.to_string_lossy().into_owned();
        let out = out_dir.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from([
            "layerink",
            image.as_str(),
            "--segments",
            "--lock",
            "segment-1",
            "--select",
            "segment-1",
            "--export",
            "svg",
            "--out",
            out.as_str(),
        ])
        .unwrap();

        let service = service();
        let mut editor = Editor::default();
        let mut output = Vec::new();
        let path = drive(&cli, &mut editor, &service, &mut output)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(path, out_dir.join("export.svg"));
        assert!(path.exists());
        assert!(editor.layer("segment-1").unwrap().locked);
        assert_eq!(editor.selected_id(), Some("segment-1"));

        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("Imported 1 segments\n"));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with("> VL Person"));
        assert!(lines[2].contains("Background Image"));
    }

    #[tokio::test]
    async fn test_drive_rejects_unknown_layer() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_png(dir.path());
        let image = image.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from(["layerink", image.as_str(), "--hide", "ghost"]).unwrap();

        let mut editor = Editor::default();
        let result = drive(&cli, &mut editor, &service(), &mut Vec::new()).await;
        assert!(matches!(result, Err(CliError::Editor(EditorError::Store(_)))));
    }

    #[test]
    fn test_render_layer_list() {
        let mut base = Layer::base_image("/uploads/x.png");
        base.visible = false;
        let text = render_layer_list(&[base], Some("image-base"));
        assert_eq!(
            text,
            "> -- Background Image     image 100%  image-base\n"
        );
    }
}
