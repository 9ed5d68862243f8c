use anyhow::{Context, Result};
use tokio::fs;

use super::loader::{split_manifest, Skill};

/// 選択されたスキルの本文と補助ファイル
#[derive(Debug, Clone)]
pub struct SkillBody {
    pub skill: Skill,
    /// マニフェスト本文（frontmatter除く）
    pub primary_text: String,
    /// 補助ファイル（ファイル名, 内容）をファイル名順に
    pub auxiliary_files: Vec<(String, String)>,
}

impl SkillBody {
    /// マニフェスト本文と `references_dir` 内のファイルを読み込む
    pub async fn load(skill: &Skill, references_dir: &str) -> Result<Self> {
        let content = fs::read_to_string(&skill.location)
            .await
            .with_context(|| format!("Failed to read manifest: {}", skill.location.display()))?;
        let (_, primary_text) = split_manifest(&content)
            .with_context(|| format!("Failed to parse manifest: {}", skill.location.display()))?;

        let auxiliary_files = load_auxiliary_files(skill, references_dir).await;

        Ok(Self {
            skill: skill.clone(),
            primary_text,
            auxiliary_files,
        })
    }
}

/// 補助ファイルを探索（読めないファイルは警告して飛ばす）
async fn load_auxiliary_files(skill: &Skill, references_dir: &str) -> Vec<(String, String)> {
    let mut files = Vec::new();

    let Some(dir) = skill.directory().map(|d| d.join(references_dir)) else {
        return files;
    };
    if !dir.is_dir() {
        return files;
    }

    let mut entries = match fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read references for {}: {}", skill.name, e);
            return files;
        }
    };

    let mut paths = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match fs::read_to_string(&path).await {
            Ok(content) => files.push((filename, content)),
            Err(e) => tracing::warn!("Skipping reference {}: {}", path.display(), e),
        }
    }

    files
}
