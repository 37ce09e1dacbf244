/*
 * file.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Loader that reads templates from the filesystem.

use super::{Loader, LoaderSettings, SharedSettings, TemplateReader, resolve_relative_path};
use crate::error::LoaderError;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

/// Reads `<base_dir>/<prefix>/<name><suffix>`.
///
/// Template names that are absolute paths are read as-is.
#[derive(Debug)]
pub struct FileLoader {
    base_dir: PathBuf,
    settings: SharedSettings,
}

impl FileLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            settings: SharedSettings::default(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Full path a template name maps to.
    pub fn path_for(&self, template_name: &str) -> PathBuf {
        self.base_dir
            .join(self.settings.get().qualified_name(template_name))
    }
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Loader for FileLoader {
    type CacheKey = String;

    fn create_cache_key(&self, template_name: &str) -> String {
        template_name.to_string()
    }

    fn reader(&self, key: &String) -> Result<TemplateReader, LoaderError> {
        self.settings.get().check_charset()?;

        let path = self.path_for(key);
        match File::open(&path) {
            Ok(file) if path.is_file() => Ok(Box::new(BufReader::new(file))),
            Ok(_) => Err(LoaderError::not_found(key.as_str())),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LoaderError::not_found(key.as_str())),
            Err(source) => Err(LoaderError::Io {
                name: key.clone(),
                source,
            }),
        }
    }

    fn resolve_relative_path(&self, relative_path: &str, anchor_path: &str) -> Option<String> {
        resolve_relative_path(relative_path, anchor_path)
    }

    fn settings(&self) -> LoaderSettings {
        self.settings.get()
    }

    fn set_prefix(&self, prefix: Option<String>) {
        self.settings.update(|s| s.prefix = prefix);
    }

    fn set_suffix(&self, suffix: Option<String>) {
        self.settings.update(|s| s.suffix = suffix);
    }

    fn set_charset(&self, charset: String) {
        self.settings.update(|s| s.charset = charset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read(loader: &FileLoader, name: &str) -> Result<String, LoaderError> {
        let mut text = String::new();
        loader
            .reader(&loader.create_cache_key(name))?
            .read_to_string(&mut text)
            .map_err(|source| LoaderError::Io {
                name: name.to_string(),
                source,
            })?;
        Ok(text)
    }

    #[test]
    fn test_reads_from_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "<p>{{ x }}</p>").unwrap();

        let loader = FileLoader::new(dir.path());
        assert_eq!(read(&loader, "page.html").unwrap(), "<p>{{ x }}</p>");
    }

    #[test]
    fn test_prefix_and_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("templates")).unwrap();
        std::fs::write(dir.path().join("templates/page.html"), "page").unwrap();

        let loader = FileLoader::new(dir.path());
        loader.set_prefix(Some("templates".to_string()));
        loader.set_suffix(Some(".html".to_string()));
        assert_eq!(read(&loader, "page").unwrap(), "page");
    }

    #[test]
    fn test_missing_file_and_directory_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let loader = FileLoader::new(dir.path());
        assert!(matches!(
            read(&loader, "missing.html"),
            Err(LoaderError::NotFound { .. })
        ));
        assert!(matches!(
            read(&loader, "sub"),
            Err(LoaderError::NotFound { .. })
        ));
    }

    #[test]
    fn test_rejects_other_charsets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "page").unwrap();

        let loader = FileLoader::new(dir.path());
        loader.set_charset("ISO-8859-1".to_string());
        assert!(matches!(
            read(&loader, "page.html"),
            Err(LoaderError::UnsupportedCharset { .. })
        ));
    }
}
