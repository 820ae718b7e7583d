use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Where the HDL of custom parts comes from.
///
/// Part of the compile cache key: the same text compiled under two
/// different contexts yields two distinct definitions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LookupContext {
    /// Only built-in parts.
    #[default]
    Empty,
    /// `<dir>/<Part>.hdl`.
    Directory(PathBuf),
    /// Sources by chip name, held in memory.
    Virtual(BTreeMap<String, String>),
}

impl LookupContext {
    pub fn directory(path: impl Into<PathBuf>) -> LookupContext {
        LookupContext::Directory(path.into())
    }

    pub fn virtual_dir<N, S>(sources: impl IntoIterator<Item = (N, S)>) -> LookupContext
    where
        N: Into<String>,
        S: Into<String>,
    {
        LookupContext::Virtual(
            sources
                .into_iter()
                .map(|(name, source)| (name.into(), source.into()))
                .collect(),
        )
    }

    /// The HDL source of the chip `name`, if this context has one.
    pub fn find(&self, name: &str) -> Result<Option<String>> {
        match self {
            LookupContext::Empty => Ok(None),
            LookupContext::Directory(dir) => {
                let path = dir.join(format!("{name}.hdl"));
                match fs::read_to_string(&path) {
                    Ok(source) => Ok(Some(source)),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                    Err(source) => Err(Error::Io { path, source }),
                }
            }
            LookupContext::Virtual(sources) => Ok(sources.get(name).cloned()),
        }
    }
}
