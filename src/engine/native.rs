//! In-process engine backed by the grass compiler.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{EngineError, SourceSpan};
use crate::importer::ImportHook;
use crate::options::OutputStyle;

use super::legacy::{LegacyCompiler, LegacyOptions, LegacyOutput};

/// [`LegacyCompiler`] backed by grass.
///
/// grass performs the Sass-spec file lookup itself, honoring the include
/// paths passed through the options, so the import hook is not consulted by
/// this family. Every file grass touches is still recorded through the
/// filesystem shim and reported in `included_files`, which keeps dependency
/// registration complete.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrassCompiler;

/// Filesystem shim recording every file read during one compile.
#[derive(Debug, Default)]
struct RecordingFs {
    seen: Mutex<Vec<PathBuf>>,
}

impl RecordingFs {
    fn into_seen(self) -> Vec<String> {
        self.seen
            .into_inner()
            .unwrap_or_default()
            .into_iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect()
    }
}

impl grass::Fs for RecordingFs {
    fn is_dir(&self, path: &Path) -> bool {
        grass::StdFs.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        grass::StdFs.is_file(path)
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.seen.lock().unwrap().push(path.to_path_buf());
        grass::StdFs.read(path)
    }
}

impl LegacyCompiler for GrassCompiler {
    fn render(
        &self,
        options: &LegacyOptions,
        _importer: &dyn ImportHook,
    ) -> Result<LegacyOutput, EngineError> {
        let fs = RecordingFs::default();

        let grass_options = grass::Options::default()
            .style(match options.output_style {
                OutputStyle::Expanded => grass::OutputStyle::Expanded,
                OutputStyle::Compressed => grass::OutputStyle::Compressed,
            })
            .input_syntax(if options.indented_syntax {
                grass::InputSyntax::Sass
            } else {
                grass::InputSyntax::Scss
            })
            .load_paths(&options.include_paths)
            .fs(&fs);

        let css = grass::from_string(options.data.clone(), &grass_options).map_err(|err| {
            EngineError::Compile {
                message: err.to_string(),
                span: SourceSpan::default(),
            }
        })?;

        // grass does not emit source maps
        Ok(LegacyOutput {
            css: css.into_bytes(),
            map: None,
            included_files: fs.into_seen(),
        })
    }
}
