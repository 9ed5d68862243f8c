use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// descriptionが無い場合の代替文字列
pub const NO_DESCRIPTION: &str = "No description provided";

/// スキルの出所（探索ルート）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkillOrigin {
    /// ~/.claude/skills
    Global,
    /// ./.claude/skills
    Local,
}

impl SkillOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for SkillOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// マニフェストのヘッダ（YAML frontmatter）
///
/// 全フィールドが任意で、欠けている場合は [`Skill::from_manifest`] で補完される。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillHeader {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// スキル定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    /// スキル名
    pub name: String,
    /// 説明
    pub description: String,
    /// マニフェストファイルのパス
    pub location: PathBuf,
    /// 出所
    pub origin: SkillOrigin,
}

impl Skill {
    /// マニフェストファイルからスキルを読み込み
    pub async fn load_from_file(path: &Path, origin: SkillOrigin) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        let (header, _) = split_manifest(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;

        Ok(Self::from_manifest(header, path.to_path_buf(), origin))
    }

    /// ヘッダからスキルを組み立て（フォールバック規則を適用）
    pub fn from_manifest(header: SkillHeader, location: PathBuf, origin: SkillOrigin) -> Self {
        let name = header
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| directory_name(&location));

        let description = header
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        Self {
            name,
            description,
            location,
            origin,
        }
    }

    /// キャッシュのキー（`origin:name`）
    pub fn key(&self) -> String {
        format!("{}:{}", self.origin, self.name)
    }

    /// マニフェストを含むディレクトリ
    pub fn directory(&self) -> Option<&Path> {
        self.location.parent()
    }
}

/// マニフェストをヘッダと本文に分割
///
/// frontmatterが無い場合は全体を本文とし、空のヘッダを返す。
/// 本文は閉じの `---` 行の直後からそのまま返す（前後の空白も保持）。
pub fn split_manifest(content: &str) -> Result<(SkillHeader, String)> {
    let (opening, rest) = content.split_once('\n').unwrap_or((content, ""));
    if opening.trim_end() != "---" {
        return Ok((SkillHeader::default(), content.to_string()));
    }

    // 閉じの---は単独の行
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml_content = rest[..offset].trim();
            let body = &rest[offset + line.len()..];

            let header = if yaml_content.is_empty() {
                SkillHeader::default()
            } else {
                serde_yaml::from_str(yaml_content).context("Invalid frontmatter YAML")?
            };
            return Ok((header, body.to_string()));
        }
        offset += line.len();
    }

    anyhow::bail!("Invalid frontmatter: missing closing ---")
}

fn directory_name(location: &Path) -> String {
    location
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unnamed".to_string())
}
