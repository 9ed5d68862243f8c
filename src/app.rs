//! 実行フロー
//!
//! 探索 → 並び替え → 選択 → 本文読み込み → キャッシュ更新 → プロンプト組み立て → 起動。

use anyhow::Result;
use std::path::PathBuf;

use crate::cli::{self, Args, SkillSelector};
use crate::config::Config;
use crate::launcher::{Launcher, ProcessRunner};
use crate::prompt::assemble;
use crate::recent::{rank, RecentStore};
use crate::skills::{Skill, SkillBody, SkillOrigin, SkillRegistry};

/// スキルが1つも無い場合の終了コード
pub const EXIT_NO_SKILLS: i32 = 1;

/// 選択を中止した場合の終了コード
pub const EXIT_CANCELLED: i32 = 130;

pub struct App<S: SkillSelector, R: ProcessRunner> {
    config: Config,
    cwd: PathBuf,
    store: RecentStore,
    selector: S,
    launcher: Launcher<R>,
}

impl<S: SkillSelector, R: ProcessRunner> App<S, R> {
    pub fn new(config: Config, cwd: PathBuf, selector: S, launcher: Launcher<R>) -> Self {
        let store = RecentStore::new(config.recent_path(), config.recent.capacity);
        Self {
            config,
            cwd,
            store,
            selector,
            launcher,
        }
    }

    pub fn store(&self) -> &RecentStore {
        &self.store
    }

    pub fn launcher(&self) -> &Launcher<R> {
        &self.launcher
    }

    fn global_dir(&self) -> PathBuf {
        self.config.global_skills_dir()
    }

    fn local_dir(&self) -> PathBuf {
        self.config.local_skills_dir(&self.cwd)
    }

    /// 両方のルートからスキルを探す
    pub async fn discover(&self) -> Vec<Skill> {
        let mut registry = SkillRegistry::new(self.config.skills.manifest_name.clone());
        registry.add_search_path(self.global_dir(), SkillOrigin::Global);
        registry.add_search_path(self.local_dir(), SkillOrigin::Local);
        registry.load_all().await;

        tracing::info!("Loaded {} skills", registry.len());
        registry.list().to_vec()
    }

    /// 引数に応じて実行し、終了コードを返す
    pub async fn run(&mut self, args: &Args) -> Result<i32> {
        if args.clear_recent {
            if self.store.clear()? {
                cli::print_info("Cleared recently used skills.");
            } else {
                cli::print_info("No recently used skills to clear.");
            }
            return Ok(0);
        }

        let mut skills = self.discover().await;
        if skills.is_empty() {
            cli::print_no_skills(
                &self.global_dir(),
                &self.local_dir(),
                &self.config.skills.manifest_name,
            );
            return Ok(EXIT_NO_SKILLS);
        }

        let mut recent = self.store.load();
        rank(&mut skills, &recent);

        if args.list {
            cli::print_skill_list(&skills, &recent);
            return Ok(0);
        }

        let Some(selected) = self.selector.select(&skills, &recent)? else {
            cli::print_info("Cancelled.");
            return Ok(EXIT_CANCELLED);
        };

        // 本文を読めたスキルだけを記録・注入する
        let mut bodies = Vec::with_capacity(selected.len());
        for skill in &selected {
            match SkillBody::load(skill, &self.config.skills.references_dir).await {
                Ok(body) => bodies.push(body),
                Err(e) => tracing::warn!("Skipping skill {}: {:#}", skill.name, e),
            }
        }

        let system_prompt = if bodies.is_empty() {
            None
        } else {
            recent.touch(bodies.iter().map(|body| body.skill.key()));
            self.store.save(&recent);

            let names: Vec<&str> = bodies.iter().map(|b| b.skill.name.as_str()).collect();
            cli::print_info(&format!("Loaded skills: {}", names.join(", ")));
            Some(assemble(&bodies))
        };

        let code = self
            .launcher
            .launch(system_prompt.as_deref(), &args.passthrough)
            .await?;
        Ok(code)
    }
}
