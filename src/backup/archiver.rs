use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::shell::{CommandExecutor, ShellRunner};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// tar + bzip2
pub static ARCHIVE_EXT: &str = "tbz";

/// Appends `.tbz` to `dest_base` without touching any dot already in the name
pub fn archive_path<P: AsRef<Path>>(dest_base: P) -> PathBuf {
    let mut path = OsString::from(dest_base.as_ref().as_os_str());
    path.push(".");
    path.push(ARCHIVE_EXT);
    PathBuf::from(path)
}

/// Compresses the contents of `source_dir` into `<dest_base>.tbz`
///
/// Entries are stored relative to `source_dir` with permissions and access
/// times preserved. Never overwrites an existing archive.
pub fn pack<E: CommandExecutor, P: AsRef<Path>, Q: AsRef<Path>>(
    shell: &ShellRunner<E>,
    source_dir: P,
    dest_base: Q,
) -> Result<PathBuf> {
    let archive = archive_path(dest_base);
    if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if archive.exists() {
        return Err(Error::already_exists(archive));
    }

    tracing::info!("Packing {:?} into {:?}", source_dir.as_ref(), &archive);
    shell.run([
        OsString::from("tar"),
        "--create".into(),
        "--bzip2".into(),
        "--preserve-permissions".into(),
        "--atime-preserve".into(),
        "--file".into(),
        archive.clone().into(),
        "--directory".into(),
        source_dir.as_ref().into(),
        ".".into(),
    ])?;

    Ok(archive)
}

/// Extracts `archive` into `dest_dir`, which must be empty or absent
///
/// `dest_dir` has to be absolute or start with `./`; the latter is resolved
/// against the current directory.
pub fn unpack<E: CommandExecutor, P: AsRef<Path>, Q: AsRef<Path>>(
    shell: &ShellRunner<E>,
    archive: P,
    dest_dir: Q,
) -> Result<PathBuf> {
    let archive = archive.as_ref();
    if !archive.exists() {
        return Err(Error::not_found(archive));
    }

    let dest_dir = normalize_output_dir(dest_dir.as_ref())?;
    std::fs::create_dir_all(&dest_dir)?;
    if std::fs::read_dir(&dest_dir)?.next().is_some() {
        return Err(Error::not_empty(dest_dir));
    }

    tracing::info!("Unpacking {:?} into {:?}", archive, &dest_dir);
    shell.run([
        OsString::from("tar"),
        "--extract".into(),
        "--bzip2".into(),
        "--preserve-permissions".into(),
        "--keep-old-files".into(),
        "--atime-preserve".into(),
        "--file".into(),
        archive.into(),
        "--directory".into(),
        dest_dir.clone().into(),
    ])?;

    Ok(dest_dir)
}

fn normalize_output_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    match dir.components().next() {
        Some(Component::CurDir) => Ok(std::path::absolute(dir)?),
        _ => Err(Error::invalid_path(dir)),
    }
}
