//! 最近使ったスキルの永続化管理
//!
//! `origin:name` → 最終使用時刻（ミリ秒）のマップを JSON で保存する。
//! キャッシュは並び順のためだけのもので、読み書きの失敗は表に出さない。

use anyhow::{Context, Result};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::skills::Skill;

/// デフォルトの保持件数
pub const DEFAULT_CAPACITY: usize = 10;

/// 最近使ったスキルの記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentSkills {
    entries: HashMap<String, i64>,
    capacity: usize,
}

impl RecentSkills {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    /// 既存のエントリから作成（上限を超える分は切り詰める）
    pub fn from_entries(entries: HashMap<String, i64>, capacity: usize) -> Self {
        let mut recent = Self { entries, capacity };
        recent.evict();
        recent
    }

    /// キーの時刻を現在時刻に更新
    pub fn touch<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.touch_at(keys, chrono::Utc::now().timestamp_millis());
    }

    /// キーの時刻を `now_ms` に更新し、上限を超えたら古いものから捨てる
    pub fn touch_at<I, S>(&mut self, keys: I, now_ms: i64)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self.entries.insert(key.into(), now_ms);
        }
        self.evict();
    }

    fn evict(&mut self) {
        if self.entries.len() <= self.capacity {
            return;
        }

        let mut sorted: Vec<(String, i64)> = self.entries.drain().collect();
        // 新しい順、同時刻ならキー順
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.truncate(self.capacity);
        self.entries = sorted.into_iter().collect();
    }

    /// 最終使用時刻
    pub fn last_used(&self, key: &str) -> Option<i64> {
        self.entries.get(key).copied()
    }

    pub fn is_recent(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entries(&self) -> &HashMap<String, i64> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RecentSkills {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// スキルを最近使った順に並べる
///
/// 記録に無いスキルは時刻0として末尾へ。同じ時刻なら名前の昇順。
/// 安定ソートなので名前も同じ場合は探索順を保つ。
pub fn rank(skills: &mut [Skill], recent: &RecentSkills) {
    skills.sort_by_cached_key(|skill| {
        let last_used = recent.last_used(&skill.key()).unwrap_or(0);
        (Reverse(last_used), skill.name.clone())
    });
}

/// キャッシュファイルの読み書き
#[derive(Debug, Clone)]
pub struct RecentStore {
    path: PathBuf,
    capacity: usize,
}

impl RecentStore {
    pub fn new(path: PathBuf, capacity: usize) -> Self {
        Self { path, capacity }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 記録を読み込む（失敗時は空）
    pub fn load(&self) -> RecentSkills {
        match self.try_load() {
            Ok(recent) => recent,
            Err(e) => {
                if self.path.exists() {
                    tracing::warn!("Ignoring unreadable recent skills cache: {:#}", e);
                } else {
                    tracing::debug!("No recent skills cache at {}", self.path.display());
                }
                RecentSkills::new(self.capacity)
            }
        }
    }

    fn try_load(&self) -> Result<RecentSkills> {
        let json = std::fs::read_to_string(&self.path)
            .context("Failed to read recent skills cache")?;
        let entries: HashMap<String, i64> = serde_json::from_str(&json)
            .context("Failed to parse recent skills cache")?;

        Ok(RecentSkills::from_entries(entries, self.capacity))
    }

    /// 記録を保存する（失敗しても警告のみ）
    pub fn save(&self, recent: &RecentSkills) {
        if let Err(e) = self.try_save(recent) {
            tracing::warn!("Failed to save recent skills cache: {:#}", e);
        }
    }

    fn try_save(&self, recent: &RecentSkills) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .context("Failed to create cache directory")?;

        let json = serde_json::to_string_pretty(recent.entries())
            .context("Failed to serialize recent skills")?;

        // 同じディレクトリに書いてから置き換える
        let mut file = tempfile::NamedTempFile::new_in(&dir)
            .context("Failed to create temporary cache file")?;
        file.write_all(json.as_bytes())
            .context("Failed to write temporary cache file")?;
        file.persist(&self.path)
            .context("Failed to replace recent skills cache")?;

        Ok(())
    }

    /// キャッシュファイルを削除（無ければ何もしない）
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to delete recent skills cache: {}", self.path.display())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::SkillOrigin;
    use tempfile::tempdir;

    fn skill(name: &str, origin: SkillOrigin) -> Skill {
        Skill {
            name: name.to_string(),
            description: String::new(),
            location: PathBuf::from(format!("/skills/{}/SKILL.md", name)),
            origin,
        }
    }

    fn names(skills: &[Skill]) -> Vec<&str> {
        skills.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_touch_within_capacity() {
        let mut recent = RecentSkills::new(10);
        recent.touch_at(["global:a", "local:b"], 100);

        assert_eq!(recent.len(), 2);
        assert_eq!(recent.last_used("global:a"), Some(100));
        assert_eq!(recent.last_used("local:b"), Some(100));

        recent.touch_at(["global:a"], 200);
        assert_eq!(recent.last_used("global:a"), Some(200));
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_touch_evicts_least_recently_used() {
        let entries: HashMap<String, i64> = (0..10)
            .map(|i| (format!("global:s{}", i), 1_000 + i as i64))
            .collect();
        let mut recent = RecentSkills::from_entries(entries, 10);

        // s0 (1000) と s1 (1001) が押し出される
        recent.touch_at(["local:new1", "local:new2"], 5_000);

        assert_eq!(recent.len(), 10);
        assert!(!recent.is_recent("global:s0"));
        assert!(!recent.is_recent("global:s1"));
        assert!(recent.is_recent("global:s2"));
        assert!(recent.is_recent("global:s9"));
        assert_eq!(recent.last_used("local:new1"), Some(5_000));
        assert_eq!(recent.last_used("local:new2"), Some(5_000));
    }

    #[test]
    fn test_eviction_keeps_largest_timestamps() {
        let mut recent = RecentSkills::new(10);
        // 挿入順と時刻を逆にして、挿入順ではなく時刻で捨てることを確認
        for i in 0..10 {
            recent.touch_at([format!("global:k{}", i)], 10_000 - i as i64 * 100);
        }
        recent.touch_at(["global:fresh"], 20_000);

        assert_eq!(recent.len(), 10);
        assert!(recent.is_recent("global:k0"));
        assert!(!recent.is_recent("global:k9"));
        assert!(recent.is_recent("global:fresh"));
    }

    #[test]
    fn test_rank_recent_first_then_name() {
        let mut recent = RecentSkills::new(10);
        recent.touch_at(["global:zeta"], 10);
        recent.touch_at(["local:mid"], 20);

        let mut skills = vec![
            skill("beta", SkillOrigin::Global),
            skill("zeta", SkillOrigin::Global),
            skill("alpha", SkillOrigin::Global),
            skill("mid", SkillOrigin::Local),
        ];
        rank(&mut skills, &recent);

        assert_eq!(names(&skills), vec!["mid", "zeta", "alpha", "beta"]);
    }

    #[test]
    fn test_rank_is_stable_for_same_name() {
        let recent = RecentSkills::default();
        let mut skills = vec![
            skill("dup", SkillOrigin::Global),
            skill("dup", SkillOrigin::Local),
        ];
        rank(&mut skills, &recent);

        assert_eq!(skills[0].origin, SkillOrigin::Global);
        assert_eq!(skills[1].origin, SkillOrigin::Local);
    }

    #[test]
    fn test_scenario_list_and_touch() {
        let now = 1_700_000_000_000i64;
        let day = 24 * 60 * 60 * 1000;

        let mut entries = HashMap::new();
        entries.insert("global:A".to_string(), now - day);
        entries.insert("local:C".to_string(), now);
        let mut recent = RecentSkills::from_entries(entries, 10);

        let mut skills = vec![
            skill("A", SkillOrigin::Global),
            skill("B", SkillOrigin::Global),
            skill("C", SkillOrigin::Local),
        ];
        rank(&mut skills, &recent);
        assert_eq!(names(&skills), vec!["C", "A", "B"]);

        let later = now + 5_000;
        recent.touch_at(["global:A", "global:B"], later);
        assert!(recent.len() <= 10);
        assert_eq!(recent.last_used("global:A"), Some(later));
        assert_eq!(recent.last_used("global:B"), Some(later));
        assert_eq!(recent.last_used("local:C"), Some(now));
    }

    #[test]
    fn test_store_round_trip() {
        let temp_dir = tempdir().unwrap();
        let store = RecentStore::new(temp_dir.path().join("nested").join("recent.json"), 10);

        let mut recent = RecentSkills::new(10);
        recent.touch_at(["global:a"], 42);
        store.save(&recent);

        assert!(store.path().exists());
        assert_eq!(store.load(), recent);
    }

    #[test]
    fn test_store_missing_or_corrupt_is_empty() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("recent.json");
        let store = RecentStore::new(path.clone(), 10);

        assert!(store.load().is_empty());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(store.load().is_empty());

        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_store_load_truncates_oversized_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("recent.json");
        let entries: HashMap<String, i64> = (0..15)
            .map(|i| (format!("global:s{}", i), i as i64))
            .collect();
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let recent = RecentStore::new(path, 10).load();
        assert_eq!(recent.len(), 10);
        assert!(recent.is_recent("global:s14"));
        assert!(!recent.is_recent("global:s4"));
    }

    #[test]
    fn test_clear() {
        let temp_dir = tempdir().unwrap();
        let store = RecentStore::new(temp_dir.path().join("recent.json"), 10);

        let mut recent = RecentSkills::new(10);
        recent.touch_at(["local:x"], 1);
        store.save(&recent);

        assert!(store.clear().unwrap());
        assert!(!store.path().exists());
        assert!(store.load().is_empty());
        // 2回目は削除対象なし
        assert!(!store.clear().unwrap());
    }
}
