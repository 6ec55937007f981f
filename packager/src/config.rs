//! Resolution of a packaging run's settings.
//!
//! Every path the run will touch is resolved here, up front, from three
//! layers: the built-in [`PackageLayout`] defaults, an optional
//! `ctan-package.toml` in the source directory, and the command line. The
//! result is a plain [`PackagerConfig`] value; nothing downstream consults
//! the environment.

use crate::cli::Cli;
use crate::dirs::BaseDirs;
use crate::error::{PackagerError, Result};
use crate::layout::PackageLayout;
use crate::readme::ReadmeMode;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::time::Duration;

/// Extension appended to the archive base path.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Fully resolved settings for one packaging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagerConfig {
    /// Absolute directory holding the package sources.
    pub source_dir: Utf8PathBuf,
    /// File names, package folder name and readme markers.
    pub layout: PackageLayout,
    /// Absolute path of the archive to write, including `.zip`.
    pub archive_path: Utf8PathBuf,
    /// Whether the readme is filtered or copied verbatim.
    pub readme_mode: ReadmeMode,
    /// Upper bound for a single compiler pass.
    pub compile_timeout: Option<Duration>,
    /// Forward compiler output to the terminal.
    pub show_compiler_output: bool,
    /// Suppress progress lines.
    pub quiet: bool,
}

impl PackagerConfig {
    /// Resolve the run's settings from the command line and base directories.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::SourceDirUnavailable`] when the source
    /// directory cannot be determined or does not exist,
    /// [`PackagerError::OutputPathUnavailable`] when no `--dir` is given and
    /// the home directory is unknown, and layout errors from
    /// [`PackageLayout::load`].
    pub fn resolve(cli: &Cli, dirs: &dyn BaseDirs) -> Result<Self> {
        let source_dir = resolve_source_dir(cli.source_dir.as_deref(), dirs)?;
        let mut layout = PackageLayout::load(&source_dir)?;
        if let Some(compiler) = &cli.compiler {
            layout.compiler.clone_from(compiler);
            layout.validate()?;
        }

        let archive_base = match &cli.dir {
            Some(dir) => {
                let dir = expand_home(dir, dirs)?;
                absolutize(&dir).map_err(|e| PackagerError::OutputPathUnavailable {
                    reason: format!("cannot resolve {dir}: {e}"),
                })?
            }
            None => default_archive_base(dirs, &layout.package_name)?,
        };
        let archive_path = archive_path_for(&archive_base)?;

        let readme_mode = if cli.keep_readme {
            ReadmeMode::Verbatim
        } else {
            ReadmeMode::Filtered
        };

        let config = Self {
            source_dir,
            layout,
            archive_path,
            readme_mode,
            compile_timeout: cli.timeout.map(Duration::from_secs),
            show_compiler_output: cli.verbosity > 0,
            quiet: cli.quiet,
        };
        debug!("resolved configuration: {config:?}");
        Ok(config)
    }
}

/// Default archive base path: `<home>/<package_name>`.
///
/// # Errors
///
/// Returns [`PackagerError::OutputPathUnavailable`] when the home directory
/// cannot be determined or is not valid UTF-8.
pub fn default_archive_base(dirs: &dyn BaseDirs, package_name: &str) -> Result<Utf8PathBuf> {
    Ok(home_dir(dirs)?.join(package_name))
}

/// Replace a leading `~` component with the home directory.
///
/// Shells leave `~` alone inside `--dir=~/pkg`, so the packager expands it
/// itself. `~user` forms are left unchanged.
///
/// # Errors
///
/// Returns [`PackagerError::OutputPathUnavailable`] when the path starts with
/// `~` and the home directory cannot be determined.
pub fn expand_home(path: &Utf8Path, dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) if rest.as_str().is_empty() => home_dir(dirs),
        Ok(rest) => Ok(home_dir(dirs)?.join(rest)),
        Err(_) => Ok(path.to_owned()),
    }
}

fn home_dir(dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    let home = dirs
        .home_dir()
        .ok_or_else(|| PackagerError::OutputPathUnavailable {
            reason: "could not determine home directory; pass --dir".to_owned(),
        })?;
    Utf8PathBuf::from_path_buf(home).map_err(|path| PackagerError::OutputPathUnavailable {
        reason: format!("home directory is not valid UTF-8: {}", path.display()),
    })
}

/// Append `.zip` to an archive base path.
///
/// The extension is appended rather than substituted, so a base of
/// `twoxtwogame-1.2` yields `twoxtwogame-1.2.zip`.
///
/// # Errors
///
/// Returns [`PackagerError::OutputPathUnavailable`] when the base path has no
/// file name component (for example `/` or `..`).
pub fn archive_path_for(base: &Utf8Path) -> Result<Utf8PathBuf> {
    let Some(name) = base.file_name() else {
        return Err(PackagerError::OutputPathUnavailable {
            reason: format!("{base} does not name a file"),
        });
    };
    Ok(base.with_file_name(format!("{name}.{ARCHIVE_EXTENSION}")))
}

fn resolve_source_dir(explicit: Option<&Utf8Path>, dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    let candidate = match explicit {
        Some(dir) => dir.to_owned(),
        None => {
            let exe_dir =
                dirs.executable_dir()
                    .ok_or_else(|| PackagerError::SourceDirUnavailable {
                        reason: "could not locate the running executable; pass --source-dir"
                            .to_owned(),
                    })?;
            Utf8PathBuf::from_path_buf(exe_dir).map_err(|path| {
                PackagerError::SourceDirUnavailable {
                    reason: format!("executable directory is not valid UTF-8: {}", path.display()),
                }
            })?
        }
    };

    let resolved =
        candidate
            .canonicalize_utf8()
            .map_err(|e| PackagerError::SourceDirUnavailable {
                reason: format!("{candidate}: {e}"),
            })?;
    if !resolved.is_dir() {
        return Err(PackagerError::SourceDirUnavailable {
            reason: format!("{resolved} is not a directory"),
        });
    }
    Ok(resolved)
}

fn absolutize(path: &Utf8Path) -> std::io::Result<Utf8PathBuf> {
    let absolute = std::path::absolute(path)?;
    Utf8PathBuf::from_path_buf(absolute).map_err(|path| {
        std::io::Error::other(format!("path is not valid UTF-8: {}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirs::MockBaseDirs;
    use rstest::rstest;
    use std::path::PathBuf;

    fn utf8_temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf())
            .expect("utf8 temp dir")
            .canonicalize_utf8()
            .expect("canonical temp dir");
        (temp, dir)
    }

    fn cli_for(source_dir: &Utf8Path) -> Cli {
        Cli {
            source_dir: Some(source_dir.to_owned()),
            ..Cli::default()
        }
    }

    #[rstest]
    #[case::plain("/home/user/twoxtwogame", "/home/user/twoxtwogame.zip")]
    #[case::dotted("/tmp/twoxtwogame-1.2", "/tmp/twoxtwogame-1.2.zip")]
    #[case::already_zip("/tmp/pkg.zip", "/tmp/pkg.zip.zip")]
    fn archive_path_appends_extension(#[case] base: &str, #[case] expected: &str) {
        let path = archive_path_for(Utf8Path::new(base)).expect("base names a file");
        assert_eq!(path, Utf8PathBuf::from(expected));
    }

    #[test]
    fn archive_path_rejects_root() {
        let err = archive_path_for(Utf8Path::new("/")).expect_err("root has no file name");
        assert!(matches!(err, PackagerError::OutputPathUnavailable { .. }));
    }

    #[test]
    fn default_archive_lives_in_home() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/tex")));

        let base = default_archive_base(&dirs, "twoxtwogame").expect("home is known");
        assert_eq!(base, Utf8PathBuf::from("/home/tex/twoxtwogame"));
    }

    #[test]
    fn default_archive_requires_home() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir().returning(|| None);

        let err = default_archive_base(&dirs, "twoxtwogame").expect_err("no home");
        assert!(matches!(err, PackagerError::OutputPathUnavailable { .. }));
    }

    #[test]
    fn resolve_uses_explicit_dir_and_defaults() {
        let (_temp, source) = utf8_temp_dir();
        let cli = Cli {
            dir: Some(Utf8PathBuf::from("/srv/upload/twoxtwogame")),
            ..cli_for(&source)
        };
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir().never();

        let config = PackagerConfig::resolve(&cli, &dirs).expect("config resolves");
        assert_eq!(config.source_dir, source);
        assert_eq!(
            config.archive_path,
            Utf8PathBuf::from("/srv/upload/twoxtwogame.zip")
        );
        assert_eq!(config.readme_mode, ReadmeMode::Filtered);
        assert_eq!(config.layout, PackageLayout::default());
        assert!(config.compile_timeout.is_none());
    }

    #[test]
    fn resolve_falls_back_to_home_archive() {
        let (_temp, source) = utf8_temp_dir();
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/tex")));

        let config = PackagerConfig::resolve(&cli_for(&source), &dirs).expect("config resolves");
        assert_eq!(
            config.archive_path,
            Utf8PathBuf::from("/home/tex/twoxtwogame.zip")
        );
    }

    #[test]
    fn resolve_defaults_source_to_executable_dir() {
        let (_temp, source) = utf8_temp_dir();
        let exe_dir = source.clone().into_std_path_buf();
        let mut dirs = MockBaseDirs::new();
        dirs.expect_executable_dir()
            .return_once(move || Some(exe_dir));
        dirs.expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/tex")));

        let config = PackagerConfig::resolve(&Cli::default(), &dirs).expect("config resolves");
        assert_eq!(config.source_dir, source);
    }

    #[test]
    fn resolve_applies_cli_overrides() {
        let (_temp, source) = utf8_temp_dir();
        let cli = Cli {
            dir: Some(Utf8PathBuf::from("/out/pkg")),
            compiler: Some("lualatex".to_owned()),
            keep_readme: true,
            timeout: Some(90),
            verbosity: 1,
            ..cli_for(&source)
        };
        let dirs = MockBaseDirs::new();

        let config = PackagerConfig::resolve(&cli, &dirs).expect("config resolves");
        assert_eq!(config.layout.compiler, "lualatex");
        assert_eq!(config.readme_mode, ReadmeMode::Verbatim);
        assert_eq!(config.compile_timeout, Some(Duration::from_secs(90)));
        assert!(config.show_compiler_output);
    }

    #[test]
    fn resolve_reads_layout_file_from_source_dir() {
        let (_temp, source) = utf8_temp_dir();
        std::fs::write(
            source.join(crate::layout::LAYOUT_FILE_NAME),
            "package_name = \"fancybox\"\n",
        )
        .expect("write layout");
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/tex")));

        let config = PackagerConfig::resolve(&cli_for(&source), &dirs).expect("config resolves");
        assert_eq!(config.layout.package_name, "fancybox");
        assert_eq!(
            config.archive_path,
            Utf8PathBuf::from("/home/tex/fancybox.zip")
        );
    }

    #[test]
    fn resolve_rejects_missing_source_dir() {
        let cli = cli_for(Utf8Path::new("/nonexistent/twoxtwogame"));
        let dirs = MockBaseDirs::new();

        let err = PackagerConfig::resolve(&cli, &dirs).expect_err("missing source dir");
        assert!(matches!(err, PackagerError::SourceDirUnavailable { .. }));
    }

    #[rstest]
    #[case::home_only("~", "/home/tex")]
    #[case::under_home("~/twoxtwogame", "/home/tex/twoxtwogame")]
    #[case::nested("~/upload/twoxtwogame", "/home/tex/upload/twoxtwogame")]
    fn expand_home_replaces_leading_tilde(#[case] input: &str, #[case] expected: &str) {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/tex")));

        let path = expand_home(Utf8Path::new(input), &dirs).expect("home is known");
        assert_eq!(path, Utf8PathBuf::from(expected));
    }

    #[rstest]
    #[case::other_user("~alice/pkg")]
    #[case::inner_tilde("/srv/~/pkg")]
    #[case::relative("upload/pkg")]
    fn expand_home_leaves_other_paths(#[case] input: &str) {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir().never();

        let path = expand_home(Utf8Path::new(input), &dirs).expect("no expansion");
        assert_eq!(path, Utf8PathBuf::from(input));
    }

    #[test]
    fn resolve_expands_tilde_in_dir() {
        let (_temp, source) = utf8_temp_dir();
        let cli = Cli {
            dir: Some(Utf8PathBuf::from("~/twoxtwogame")),
            ..cli_for(&source)
        };
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/tex")));

        let config = PackagerConfig::resolve(&cli, &dirs).expect("config resolves");
        assert_eq!(
            config.archive_path,
            Utf8PathBuf::from("/home/tex/twoxtwogame.zip")
        );
    }

    #[test]
    fn resolve_makes_relative_dir_absolute() {
        let (_temp, source) = utf8_temp_dir();
        let cli = Cli {
            dir: Some(Utf8PathBuf::from("upload/twoxtwogame")),
            ..cli_for(&source)
        };
        let dirs = MockBaseDirs::new();

        let config = PackagerConfig::resolve(&cli, &dirs).expect("config resolves");
        assert!(config.archive_path.is_absolute());
        assert!(config.archive_path.ends_with("upload/twoxtwogame.zip"));
    }
}
