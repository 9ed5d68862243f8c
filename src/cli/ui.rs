use crossterm::{
    execute,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};
use std::io;
use std::path::Path;

use crate::recent::RecentSkills;
use crate::skills::Skill;

/// 一覧表示での説明の最大文字数
pub const LIST_DESCRIPTION_WIDTH: usize = 60;

/// 文字数で切り詰める（超えた場合は末尾に...）
pub fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.lines().next().unwrap_or("");
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

/// スキル一覧の行を組み立てる
///
/// 最近使ったスキルには `*` を付ける。
pub fn format_skill_list(skills: &[Skill], recent: &RecentSkills) -> Vec<String> {
    let width = skills
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0);

    skills
        .iter()
        .map(|skill| {
            let marker = if recent.is_recent(&skill.key()) { '*' } else { ' ' };
            format!(
                "{} {:<width$}  [{:<6}] {}",
                marker,
                skill.name,
                skill.origin.as_str(),
                truncate(&skill.description, LIST_DESCRIPTION_WIDTH),
                width = width
            )
        })
        .collect()
}

/// スキル一覧を出力
pub fn print_skill_list(skills: &[Skill], recent: &RecentSkills) {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        SetAttribute(Attribute::Bold),
        Print(format!("Available skills ({}):\n", skills.len())),
        SetAttribute(Attribute::Reset),
        ResetColor
    );

    for line in format_skill_list(skills, recent) {
        println!("{}", line);
    }

    if skills.iter().any(|s| recent.is_recent(&s.key())) {
        let _ = execute!(
            stdout,
            SetForegroundColor(Color::DarkGrey),
            Print("\n* recently used\n"),
            ResetColor
        );
    }
}

/// スキルが見つからない場合の案内
pub fn print_no_skills(global_dir: &Path, local_dir: &Path, manifest_name: &str) {
    print_error("No skills found.");
    eprintln!("Create a skill as <name>/{} in one of:", manifest_name);
    eprintln!("  {} (global)", global_dir.display());
    eprintln!("  {} (local)", local_dir.display());
}

/// 情報メッセージを出力
pub fn print_info(message: &str) {
    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print(message),
        Print("\n"),
        ResetColor
    );
}

/// エラーメッセージを標準エラーに出力
pub fn print_error(message: &str) {
    let mut stderr = io::stderr();
    let _ = execute!(
        stderr,
        SetForegroundColor(Color::Red),
        SetAttribute(Attribute::Bold),
        Print("Error: "),
        SetAttribute(Attribute::Reset),
        ResetColor,
        Print(message),
        Print("\n")
    );
}
