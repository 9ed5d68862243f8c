use std::path::PathBuf;

use super::loader::{Skill, SkillOrigin};
use super::scanner::scan_root;

/// 探索パス
#[derive(Debug, Clone)]
pub struct SkillSearchPath {
    pub path: PathBuf,
    pub origin: SkillOrigin,
}

/// スキルレジストリ - スキルの探索と管理
pub struct SkillRegistry {
    /// 読み込まれたスキル（探索順）
    skills: Vec<Skill>,
    /// スキル探索パス
    search_paths: Vec<SkillSearchPath>,
    /// マニフェストファイル名
    manifest_name: String,
}

impl SkillRegistry {
    /// 新しいレジストリを作成
    pub fn new(manifest_name: impl Into<String>) -> Self {
        Self {
            skills: Vec::new(),
            search_paths: Vec::new(),
            manifest_name: manifest_name.into(),
        }
    }

    /// 探索パスを追加
    pub fn add_search_path(&mut self, path: PathBuf, origin: SkillOrigin) {
        self.search_paths.push(SkillSearchPath { path, origin });
    }

    /// 全探索パスからスキルを読み込み
    ///
    /// 個々のマニフェストの失敗は警告して読み飛ばす。
    /// 同じキーのスキルは先に見つかった方を残す。
    pub async fn load_all(&mut self) {
        for entry in self.search_paths.clone() {
            for manifest in scan_root(&entry.path, &self.manifest_name).await {
                match Skill::load_from_file(&manifest, entry.origin).await {
                    Ok(skill) if self.contains_key(&skill.key()) => {
                        tracing::warn!(
                            "Skipping duplicate skill {} at {}",
                            skill.key(),
                            manifest.display()
                        );
                    }
                    Ok(skill) => {
                        tracing::info!("Loaded skill: {} from {}", skill.key(), manifest.display());
                        self.skills.push(skill);
                    }
                    Err(e) => {
                        tracing::warn!("Skipping skill at {}: {:#}", manifest.display(), e);
                    }
                }
            }
        }
    }

    fn contains_key(&self, key: &str) -> bool {
        self.skills.iter().any(|skill| skill.key() == key)
    }

    /// 全スキルのリストを取得
    pub fn list(&self) -> &[Skill] {
        &self.skills
    }

    /// スキル数を取得
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// スキルが空かチェック
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_registry_creation() {
        let registry = SkillRegistry::new("SKILL.md");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_both_roots() {
        let temp_dir = tempdir().unwrap();
        let global = temp_dir.path().join("global");
        let local = temp_dir.path().join("local");
        std::fs::create_dir_all(global.join("a")).unwrap();
        std::fs::create_dir_all(local.join("c")).unwrap();
        std::fs::write(global.join("a").join("SKILL.md"), "---\nname: A\n---\nbody a").unwrap();
        std::fs::write(local.join("c").join("SKILL.md"), "body c").unwrap();

        let mut registry = SkillRegistry::new("SKILL.md");
        registry.add_search_path(global, SkillOrigin::Global);
        registry.add_search_path(local, SkillOrigin::Local);
        registry.load_all().await;

        let keys: Vec<String> = registry.list().iter().map(Skill::key).collect();
        assert_eq!(keys, vec!["global:A", "local:c"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_keeps_first() {
        let temp_dir = tempdir().unwrap();
        let global = temp_dir.path().join("global");
        let local = temp_dir.path().join("local");
        for (root, dir) in [(&global, "one"), (&global, "two"), (&local, "three")] {
            std::fs::create_dir_all(root.join(dir)).unwrap();
            let manifest = format!("---\nname: same\n---\nfrom {}", dir);
            std::fs::write(root.join(dir).join("SKILL.md"), manifest).unwrap();
        }

        let mut registry = SkillRegistry::new("SKILL.md");
        registry.add_search_path(global, SkillOrigin::Global);
        registry.add_search_path(local, SkillOrigin::Local);
        registry.load_all().await;

        let skills = registry.list();
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[0].key(), "global:same");
        assert!(skills[0].location.ends_with("one/SKILL.md"));
        assert_eq!(skills[1].key(), "local:same");
    }

    #[tokio::test]
    async fn test_bad_manifest_is_dropped() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("good")).unwrap();
        std::fs::create_dir_all(root.join("bad")).unwrap();
        std::fs::write(root.join("good").join("SKILL.md"), "fine").unwrap();
        std::fs::write(root.join("bad").join("SKILL.md"), "---\nname: [oops\n---\n").unwrap();

        let mut registry = SkillRegistry::new("SKILL.md");
        registry.add_search_path(root.to_path_buf(), SkillOrigin::Global);
        registry.load_all().await;

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list()[0].name, "good");
    }

    #[tokio::test]
    async fn test_missing_roots() {
        let temp_dir = tempdir().unwrap();
        let mut registry = SkillRegistry::new("SKILL.md");
        registry.add_search_path(temp_dir.path().join("nope"), SkillOrigin::Global);
        registry.add_search_path(temp_dir.path().join("nada"), SkillOrigin::Local);
        registry.load_all().await;

        assert!(registry.is_empty());
        assert!(registry.list().is_empty());
    }
}
