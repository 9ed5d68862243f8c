//! 設定ファイル管理モジュール
//!
//! ~/.skillpick/config.toml から設定を読み込み、スキル探索パス・
//! 最近使ったスキルのキャッシュ・起動コマンドの設定を提供します。

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 危険モードを有効にする環境変数
pub const DANGEROUS_ENV: &str = "SKILLPICK_DANGEROUS";

/// 設定ファイルパスを上書きする環境変数
pub const CONFIG_ENV: &str = "SKILLPICK_CONFIG";

/// アプリケーション全体の設定
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// スキル探索設定
    #[serde(default)]
    pub skills: SkillsConfig,
    /// 最近使ったスキルのキャッシュ設定
    #[serde(default)]
    pub recent: RecentConfig,
    /// 外部プロセス起動設定
    #[serde(default)]
    pub launcher: LauncherConfig,
}

/// スキル探索設定
#[derive(Debug, Clone, Deserialize)]
pub struct SkillsConfig {
    /// グローバルスキルディレクトリ
    #[serde(default = "default_global_dir")]
    pub global_dir: String,
    /// ローカルスキルディレクトリ（カレントディレクトリからの相対パス）
    #[serde(default = "default_local_dir")]
    pub local_dir: String,
    /// マニフェストファイル名
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,
    /// 補助ファイルを置くサブディレクトリ名
    #[serde(default = "default_references_dir")]
    pub references_dir: String,
}

/// キャッシュ設定
#[derive(Debug, Clone, Deserialize)]
pub struct RecentConfig {
    /// キャッシュファイルのパス
    #[serde(default = "default_recent_path")]
    pub path: String,
    /// 保持する最大エントリ数
    #[serde(default = "default_recent_capacity")]
    pub capacity: usize,
}

/// 起動設定
#[derive(Debug, Clone, Deserialize)]
pub struct LauncherConfig {
    /// 起動する実行ファイル
    #[serde(default = "default_command")]
    pub command: String,
    /// システムプロンプトを渡すフラグ
    #[serde(default = "default_system_prompt_flag")]
    pub system_prompt_flag: String,
    /// 危険モードで追加するフラグ
    #[serde(default = "default_dangerous_flag")]
    pub dangerous_flag: String,
}

fn default_global_dir() -> String {
    "~/.claude/skills".to_string()
}

fn default_local_dir() -> String {
    ".claude/skills".to_string()
}

fn default_manifest_name() -> String {
    "SKILL.md".to_string()
}

fn default_references_dir() -> String {
    "references".to_string()
}

fn default_recent_path() -> String {
    "~/.claude/skillpick-recent.json".to_string()
}

fn default_recent_capacity() -> usize {
    10
}

fn default_command() -> String {
    "claude".to_string()
}

fn default_system_prompt_flag() -> String {
    "--append-system-prompt".to_string()
}

fn default_dangerous_flag() -> String {
    "--dangerously-skip-permissions".to_string()
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            global_dir: default_global_dir(),
            local_dir: default_local_dir(),
            manifest_name: default_manifest_name(),
            references_dir: default_references_dir(),
        }
    }
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self {
            path: default_recent_path(),
            capacity: default_recent_capacity(),
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            system_prompt_flag: default_system_prompt_flag(),
            dangerous_flag: default_dangerous_flag(),
        }
    }
}

impl Config {
    /// TOMLファイルから設定を読み込む
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// TOML文字列から設定をパース
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .context("Failed to parse TOML config")
    }

    /// デフォルト設定ファイルパスを取得
    pub fn default_config_path() -> PathBuf {
        if let Ok(config_path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(config_path);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".skillpick")
            .join("config.toml")
    }

    /// デフォルト設定ファイルから読み込み（存在しない場合はデフォルト値）
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// グローバルスキルディレクトリ
    pub fn global_skills_dir(&self) -> PathBuf {
        expand_home(&self.skills.global_dir)
    }

    /// ローカルスキルディレクトリ（cwd基準）
    pub fn local_skills_dir(&self, cwd: &Path) -> PathBuf {
        let dir = expand_home(&self.skills.local_dir);
        if dir.is_absolute() {
            dir
        } else {
            cwd.join(dir)
        }
    }

    /// キャッシュファイルパス
    pub fn recent_path(&self) -> PathBuf {
        expand_home(&self.recent.path)
    }
}

/// `~/` で始まるパスをホームディレクトリに展開
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// 起動モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchMode {
    /// 通常起動
    #[default]
    Normal,
    /// 権限確認をスキップして起動
    Dangerous,
}

impl LaunchMode {
    /// 環境変数の値から起動モードを決定
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Self::Dangerous,
            _ => Self::Normal,
        }
    }

    /// プロセス環境から起動モードを読み込む（起動時に一度だけ呼ぶ）
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(DANGEROUS_ENV).ok().as_deref())
    }

    pub fn is_dangerous(self) -> bool {
        self == Self::Dangerous
    }
}
