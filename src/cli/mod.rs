pub mod args;
pub mod picker;
pub mod ui;

pub use args::Args;
pub use picker::{PickerAction, PickerState, SkillSelector, TerminalPicker};
pub use ui::{
    format_skill_list, print_error, print_info, print_no_skills, print_skill_list, truncate,
};
