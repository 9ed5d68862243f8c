//! skillpick: スキルを選んでアシスタントを起動するランチャー
//!
//! グローバル・ローカルのスキルディレクトリから SKILL.md を探し、
//! 選択されたスキルをシステムプロンプトとして外部プロセスに渡す。
//! 最近使ったスキルは一覧の先頭に表示される。

pub mod app;
pub mod cli;
pub mod config;
pub mod launcher;
pub mod prompt;
pub mod recent;
pub mod skills;

// 主要な型の再エクスポート
pub use cli::{Args, SkillSelector, TerminalPicker};
pub use config::{Config, LaunchMode, LauncherConfig, RecentConfig, SkillsConfig};
pub use launcher::{InheritRunner, LaunchError, Launcher, ProcessRunner};
pub use prompt::assemble;
pub use recent::{rank, RecentSkills, RecentStore};
pub use skills::{Skill, SkillBody, SkillOrigin, SkillRegistry};

/// バージョン情報
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
