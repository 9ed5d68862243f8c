//! スキル選択ダイアログ
//!
//! 絞り込み付きの複数選択。文字入力で絞り込み、上下で移動、
//! スペースで選択切り替え、Enterで確定、Esc / Ctrl+Cで中止。

use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, IsTerminal, Write};

use crate::recent::RecentSkills;
use crate::skills::Skill;
use super::ui::truncate;

/// スキル選択のインターフェース
pub trait SkillSelector {
    /// 選択されたスキルを選択順に返す。中止された場合は `None`
    fn select(&mut self, skills: &[Skill], recent: &RecentSkills) -> Result<Option<Vec<Skill>>>;
}

/// キー入力の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerAction {
    Continue,
    Confirm,
    Cancel,
}

/// 選択状態（端末から独立）
#[derive(Debug, Clone)]
pub struct PickerState {
    /// 絞り込み対象の文字列（小文字化済み）
    haystacks: Vec<String>,
    filter: String,
    /// 表示中リスト内のカーソル位置
    cursor: usize,
    /// 選択された項目のインデックス（選択順）
    selected: Vec<usize>,
}

impl PickerState {
    pub fn new(skills: &[Skill]) -> Self {
        let haystacks = skills
            .iter()
            .map(|s| format!("{} {} {}", s.name, s.description, s.origin).to_lowercase())
            .collect();

        Self {
            haystacks,
            filter: String::new(),
            cursor: 0,
            selected: Vec::new(),
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 絞り込みに一致する項目のインデックス
    pub fn visible(&self) -> Vec<usize> {
        let needle = self.filter.to_lowercase();
        self.haystacks
            .iter()
            .enumerate()
            .filter(|(_, hay)| needle.is_empty() || hay.contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let len = self.visible().len();
        if self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.filter.push(c);
        self.cursor = 0;
    }

    pub fn pop_char(&mut self) {
        self.filter.pop();
        self.cursor = 0;
    }

    /// カーソル位置の項目の選択を切り替える
    pub fn toggle(&mut self) {
        let Some(&index) = self.visible().get(self.cursor) else {
            return;
        };
        if let Some(pos) = self.selected.iter().position(|&i| i == index) {
            self.selected.remove(pos);
        } else {
            self.selected.push(index);
        }
    }

    /// キー入力を処理
    pub fn handle_key(&mut self, key: KeyEvent) -> PickerAction {
        if key.kind == KeyEventKind::Release {
            return PickerAction::Continue;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => PickerAction::Cancel,
            (KeyCode::Esc, _) => PickerAction::Cancel,
            (KeyCode::Enter, _) => PickerAction::Confirm,
            (KeyCode::Up, _) | (KeyCode::Char('p'), KeyModifiers::CONTROL) => {
                self.move_up();
                PickerAction::Continue
            }
            (KeyCode::Down, _) | (KeyCode::Char('n'), KeyModifiers::CONTROL) => {
                self.move_down();
                PickerAction::Continue
            }
            (KeyCode::Char(' '), _) | (KeyCode::Tab, _) => {
                self.toggle();
                PickerAction::Continue
            }
            (KeyCode::Backspace, _) => {
                self.pop_char();
                PickerAction::Continue
            }
            (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => {
                self.push_char(c);
                PickerAction::Continue
            }
            _ => PickerAction::Continue,
        }
    }
}

/// 端末上の選択ダイアログ
#[derive(Debug, Default)]
pub struct TerminalPicker;

impl TerminalPicker {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, skills: &[Skill], recent: &RecentSkills) -> Result<Option<Vec<usize>>> {
        let mut state = PickerState::new(skills);
        let mut stdout = io::stdout();

        loop {
            render(&mut stdout, &state, skills, recent)?;

            if let Event::Key(key) = event::read()? {
                match state.handle_key(key) {
                    PickerAction::Continue => {}
                    PickerAction::Confirm => return Ok(Some(state.selected().to_vec())),
                    PickerAction::Cancel => return Ok(None),
                }
            }
        }
    }
}

impl SkillSelector for TerminalPicker {
    fn select(&mut self, skills: &[Skill], recent: &RecentSkills) -> Result<Option<Vec<Skill>>> {
        if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
            anyhow::bail!(
                "Skill selection needs an interactive terminal (use --list to see skills)"
            );
        }

        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let result = self.run(skills, recent);

        // 失敗時も端末を元に戻す
        let _ = execute!(stdout, cursor::Show, LeaveAlternateScreen);
        terminal::disable_raw_mode()?;

        Ok(result?.map(|indices| indices.into_iter().map(|i| skills[i].clone()).collect()))
    }
}

fn render(
    stdout: &mut io::Stdout,
    state: &PickerState,
    skills: &[Skill],
    recent: &RecentSkills,
) -> Result<()> {
    let (cols, rows) = terminal::size().unwrap_or((80, 24));
    let cols = cols as usize;
    let list_height = (rows as usize).saturating_sub(4).max(1);
    let visible = state.visible();

    // カーソルが見える範囲でスクロール
    let start = state.cursor().saturating_sub(list_height - 1);

    queue!(stdout, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    queue!(
        stdout,
        SetForegroundColor(Color::Cyan),
        SetAttribute(Attribute::Bold),
        Print("Select skills"),
        SetAttribute(Attribute::Reset),
        ResetColor,
        SetForegroundColor(Color::DarkGrey),
        Print(format!(
            "  ({} selected, space: toggle, enter: launch, esc: cancel)\r\n",
            state.selected().len()
        )),
        ResetColor,
        Print(format!("Filter: {}\r\n", state.filter())),
        Print(format!("{}\r\n", "-".repeat(cols.max(1))))
    )?;

    if visible.is_empty() {
        queue!(
            stdout,
            SetForegroundColor(Color::DarkGrey),
            Print("  (no matching skills)\r\n"),
            ResetColor
        )?;
    }

    for (row, &index) in visible.iter().enumerate().skip(start).take(list_height) {
        let skill = &skills[index];
        let pointer = if row == state.cursor() { ">" } else { " " };
        let check = if state.is_selected(index) { "[x]" } else { "[ ]" };
        let marker = if recent.is_recent(&skill.key()) { "*" } else { " " };
        let head = format!("{} {} {}{} ({})", pointer, check, marker, skill.name, skill.origin);
        let room = cols.saturating_sub(head.chars().count() + 3);
        let line = format!("{} - {}", head, truncate(&skill.description, room));

        if row == state.cursor() {
            queue!(
                stdout,
                SetForegroundColor(Color::Yellow),
                Print(truncate(&line, cols)),
                ResetColor,
                Print("\r\n")
            )?;
        } else {
            queue!(stdout, Print(truncate(&line, cols)), Print("\r\n"))?;
        }
    }

    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::SkillOrigin;
    use std::path::PathBuf;

    fn skills() -> Vec<Skill> {
        [
            ("git-commit", "Write commit messages", SkillOrigin::Global),
            ("rust-style", "Rust conventions", SkillOrigin::Global),
            ("deploy", "Ship to production", SkillOrigin::Local),
        ]
        .iter()
        .map(|(name, desc, origin)| Skill {
            name: name.to_string(),
            description: desc.to_string(),
            location: PathBuf::from(format!("/s/{}/SKILL.md", name)),
            origin: *origin,
        })
        .collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_filter_matches_name_and_description() {
        let mut state = PickerState::new(&skills());
        assert_eq!(state.visible(), vec![0, 1, 2]);

        for c in "RUST".chars() {
            state.push_char(c);
        }
        assert_eq!(state.visible(), vec![1]);

        state.pop_char();
        state.pop_char();
        state.pop_char();
        state.pop_char();
        for c in "ship".chars() {
            state.push_char(c);
        }
        assert_eq!(state.visible(), vec![2]);
    }

    #[test]
    fn test_toggle_keeps_selection_order() {
        let mut state = PickerState::new(&skills());
        state.move_down();
        state.move_down();
        state.toggle(); // deploy
        state.move_up();
        state.move_up();
        state.toggle(); // git-commit
        assert_eq!(state.selected(), &[2, 0]);

        state.toggle();
        assert_eq!(state.selected(), &[2]);
    }

    #[test]
    fn test_toggle_applies_to_filtered_item() {
        let mut state = PickerState::new(&skills());
        for c in "deploy".chars() {
            state.push_char(c);
        }
        state.toggle();
        assert_eq!(state.selected(), &[2]);

        // 絞り込みを変えても選択は残る
        state.pop_char();
        state.push_char('x');
        assert!(state.visible().is_empty());
        state.toggle();
        assert_eq!(state.selected(), &[2]);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut state = PickerState::new(&skills());
        state.move_up();
        assert_eq!(state.cursor(), 0);
        for _ in 0..10 {
            state.move_down();
        }
        assert_eq!(state.cursor(), 2);
    }

    #[test]
    fn test_handle_key() {
        let mut state = PickerState::new(&skills());
        assert_eq!(state.handle_key(key(KeyCode::Down)), PickerAction::Continue);
        assert_eq!(state.handle_key(key(KeyCode::Char(' '))), PickerAction::Continue);
        assert_eq!(state.selected(), &[1]);
        assert_eq!(state.handle_key(key(KeyCode::Char('g'))), PickerAction::Continue);
        assert_eq!(state.filter(), "g");
        assert_eq!(state.handle_key(key(KeyCode::Enter)), PickerAction::Confirm);
        assert_eq!(state.handle_key(key(KeyCode::Esc)), PickerAction::Cancel);
        assert_eq!(
            state.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            PickerAction::Cancel
        );
    }
}
