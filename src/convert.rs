//! Document to workbook conversion
//!
//! One pass per input file: read the document, prepare the output location,
//! copy the template, fill it and dump the embedded images next to it. A
//! failing file never stops the files after it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::document::load_records;
use crate::error::{ConvertError, ConvertResult};
use crate::workbook::{write_extraction, SheetSummary, Workbook};

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub template: PathBuf,
    /// Write into `<dir>/<stem>/` instead of next to the input
    pub create_folder: bool,
    /// Also copy the input into that folder; ignored without `create_folder`
    pub copy_word_file: bool,
}

impl From<&Settings> for ConvertOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            template: settings.template.clone(),
            create_folder: settings.create_folder,
            copy_word_file: settings.copy_word_file,
        }
    }
}

/// Files produced for one input
#[derive(Debug, Clone)]
pub struct Conversion {
    pub workbook: PathBuf,
    pub sheets: Vec<SheetSummary>,
    pub images: Vec<PathBuf>,
}

/// Outcome of every input of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<(PathBuf, ConvertResult<Conversion>)>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, result)| result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Inputs named by a path: every `.docx` directly inside a directory,
/// sorted by name, or the path itself
pub fn collect_inputs(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut inputs = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        let is_docx = entry_path.extension().is_some_and(|ext| ext == "docx");
        if entry_path.is_file() && is_docx {
            inputs.push(entry_path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Convert every input, continuing past failures
pub fn convert_batch(inputs: &[PathBuf], options: &ConvertOptions) -> BatchReport {
    let mut report = BatchReport::default();

    for input in inputs {
        tracing::info!("Converting {}", input.display());
        let result = convert_file(input, options);
        match &result {
            Ok(conversion) => tracing::info!(
                "Wrote {} ({} sheets, {} images)",
                conversion.workbook.display(),
                conversion.sheets.len(),
                conversion.images.len()
            ),
            Err(err) => tracing::error!("{err}"),
        }
        report.results.push((input.clone(), result));
    }

    report
}

/// Convert one document into a workbook built from the template
pub fn convert_file(input: &Path, options: &ConvertOptions) -> ConvertResult<Conversion> {
    let (view, extraction) = load_records(input).map_err(|source| ConvertError::UnreadableDocument {
        path: input.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        "Extracted {} test and {} experiment specifications",
        extraction.test_specifications.len(),
        extraction.experiment_specifications.len()
    );

    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut output_dir = input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    if options.create_folder {
        let folder = output_dir.join(&stem);
        match fs::create_dir(&folder) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!("Folder {} already exists", folder.display());
            }
            Err(source) => return Err(ConvertError::CreateFolder { path: folder, source }),
        }
        output_dir = folder;

        if options.copy_word_file {
            if let Some(file_name) = input.file_name() {
                let destination = output_dir.join(file_name);
                fs::copy(input, &destination).map_err(|source| ConvertError::CopySource {
                    path: destination.clone(),
                    source,
                })?;
            }
        }
    } else if options.copy_word_file {
        tracing::debug!("Ignoring copy of the Word file without an output folder");
    }

    let workbook_path = output_dir.join(format!("{stem}.xlsx"));
    copy_template(&options.template, &workbook_path)?;

    let mut workbook = Workbook::open(&workbook_path).map_err(|source| {
        ConvertError::UnreadableWorkbook {
            path: workbook_path.clone(),
            source,
        }
    })?;
    let fill_error = |source| ConvertError::FillWorkbook {
        path: workbook_path.clone(),
        source,
    };
    let sheets = write_extraction(&mut workbook, &extraction).map_err(fill_error)?;
    workbook.save(&workbook_path).map_err(fill_error)?;

    let mut images = Vec::with_capacity(view.media().images().len());
    for graphic in view.media().images() {
        let path = output_dir.join(&graphic.name);
        fs::write(&path, &graphic.data).map_err(|source| ConvertError::WriteImage {
            path: path.clone(),
            source,
        })?;
        images.push(path);
    }

    Ok(Conversion {
        workbook: workbook_path,
        sheets,
        images,
    })
}

fn copy_template(template: &Path, destination: &Path) -> ConvertResult<()> {
    if !template.is_file() {
        return Err(ConvertError::MissingTemplate {
            path: template.to_path_buf(),
        });
    }
    fs::copy(template, destination)
        .map(|_| ())
        .map_err(|source| ConvertError::WriteOutput {
            path: destination.to_path_buf(),
            source,
        })
}
