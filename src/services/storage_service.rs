//! 答案保存服务 - 业务能力层
//!
//! 只负责"把一道题的答案写到磁盘"能力：一个分区一个目录，一道题一个文件。
//! 内容相同时不写，保留原文件的修改时间。

use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::fs;
use tracing::debug;

use crate::config::Config;
use crate::error::PersistError;
use crate::models::{PersistOutcome, Section, Submission};

/// 文件名中不允许出现的字符
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Windows 保留的设备名
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// 答案保存服务
pub struct SolutionStore {
    root: PathBuf,
    extension: Option<String>,
}

impl SolutionStore {
    pub fn new(root: impl Into<PathBuf>, extension: Option<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.filter(|ext| !ext.is_empty()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.dest_dir.clone(), config.file_extension.clone())
    }

    /// 题目答案的保存路径
    pub fn path_for(&self, section: &Section, submission: &Submission) -> PathBuf {
        let mut file_name = sanitize_component(&submission.name);
        if let Some(ext) = &self.extension {
            file_name.push('.');
            file_name.push_str(ext);
        }
        self.root.join(sanitize_component(&section.name)).join(file_name)
    }

    /// 保存答案
    ///
    /// 先写到同目录下的临时文件再改名覆盖，失败时原文件保持不变
    pub async fn persist(
        &self,
        section: &Section,
        submission: &Submission,
        text: &str,
    ) -> Result<PersistOutcome, PersistError> {
        let path = self.path_for(section, submission);

        let existing = match fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(source) => return Err(PersistError::ReadFailed { path, source }),
        };

        if existing.as_deref() == Some(text.as_bytes()) {
            debug!("内容未变化，跳过: {}", path.display());
            return Ok(PersistOutcome::Unchanged);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| PersistError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        write_replacing(&path, text.as_bytes()).await?;
        debug!("已写入: {}", path.display());

        Ok(PersistOutcome::Written {
            replaced: existing.is_some(),
        })
    }
}

async fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let target = path.to_path_buf();
    let bytes = bytes.to_vec();

    let result = tokio::task::spawn_blocking(move || -> io::Result<()> {
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        // 临时文件在 persist 之前被丢弃时会自动删除，原文件保持不变
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&bytes)?;
        temp.flush()?;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .unwrap_or_else(|join_err| Err(io::Error::new(ErrorKind::Other, join_err.to_string())));

    result.map_err(|source| PersistError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// 把名称清理成可用作文件名 / 目录名的形式
pub fn sanitize_component(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if c.is_control() || UNSAFE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return "_".to_string();
    }

    let stem = trimmed.split('.').next().unwrap_or(trimmed);
    if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(stem)) {
        return format!("_{}", trimmed);
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str) -> Section {
        Section {
            name: name.to_string(),
            locator: "https://checkio.org/user/bob/list/".to_string(),
            position: 0,
        }
    }

    fn submission(section: &str, name: &str) -> Submission {
        Submission {
            section: section.to_string(),
            name: name.to_string(),
            title: name.to_string(),
            locator: format!("https://checkio.org/mission/{}/solve/", name),
        }
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("Easy"), "Easy");
        assert_eq!(sanitize_component("Ice Base"), "Ice Base");
        assert_eq!(sanitize_component("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_component("what?*"), "what__");
        assert_eq!(sanitize_component("  trailing dots... "), "trailing dots");
        assert_eq!(sanitize_component("tab\there"), "tab_here");
        assert_eq!(sanitize_component(""), "_");
        assert_eq!(sanitize_component(".."), "_");
        assert_eq!(sanitize_component("con"), "_con");
        assert_eq!(sanitize_component("NUL.txt"), "_NUL.txt");
        assert_eq!(sanitize_component("Console"), "Console");
    }

    #[test]
    fn test_path_for() {
        let store = SolutionStore::new("/out", Some("py".to_string()));
        assert_eq!(
            store.path_for(&section("Scientific Expedition"), &submission("Scientific Expedition", "fizz-buzz")),
            PathBuf::from("/out/Scientific Expedition/fizz-buzz.py")
        );

        let plain = SolutionStore::new("/out", Some(String::new()));
        assert_eq!(
            plain.path_for(&section("Easy"), &submission("Easy", "Add")),
            PathBuf::from("/out/Easy/Add")
        );
    }

    #[tokio::test]
    async fn test_persist_creates_then_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = SolutionStore::new(dir.path(), None);
        let (sec, sub) = (section("Easy"), submission("Easy", "Add"));
        let text = "def add(a,b): return a+b";

        let first = store.persist(&sec, &sub, text).await.unwrap();
        assert_eq!(first, PersistOutcome::Written { replaced: false });

        let path = dir.path().join("Easy").join("Add");
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

        let second = store.persist(&sec, &sub, text).await.unwrap();
        assert_eq!(second, PersistOutcome::Unchanged);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
    }

    #[tokio::test]
    async fn test_persist_replaces_changed_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = SolutionStore::new(dir.path(), None);
        let (sec, sub) = (section("Medium"), submission("Medium", "Parse"));

        store.persist(&sec, &sub, "old\n").await.unwrap();
        let outcome = store.persist(&sec, &sub, "new\n  indented\n").await.unwrap();

        assert_eq!(outcome, PersistOutcome::Written { replaced: true });
        let path = dir.path().join("Medium").join("Parse");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new\n  indented\n");

        // 没有残留的临时文件
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("Medium"))
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["Parse".to_string()]);
    }

    #[tokio::test]
    async fn test_persist_ignores_stale_sibling_entries() {
        let dir = tempfile::tempdir().unwrap();
        // 旧版本留下的同名临时目录不影响写入
        std::fs::create_dir_all(dir.path().join("Easy").join(".Add.partial")).unwrap();
        let store = SolutionStore::new(dir.path(), None);

        let outcome = store
            .persist(&section("Easy"), &submission("Easy", "Add"), "x")
            .await
            .unwrap();

        assert_eq!(outcome, PersistOutcome::Written { replaced: false });
        assert_eq!(std::fs::read_to_string(dir.path().join("Easy").join("Add")).unwrap(), "x");
        assert!(dir.path().join("Easy").join(".Add.partial").is_dir());
    }

    #[tokio::test]
    async fn test_persist_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // 用普通文件占住分区目录的位置，创建目录必然失败
        std::fs::write(dir.path().join("Blocked"), "not a directory").unwrap();
        let store = SolutionStore::new(dir.path(), None);

        let result = store
            .persist(&section("Blocked"), &submission("Blocked", "Add"), "x")
            .await;

        assert!(matches!(result, Err(PersistError::CreateDirFailed { .. })));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Blocked")).unwrap(),
            "not a directory"
        );
    }
}
