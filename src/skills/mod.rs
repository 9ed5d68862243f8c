pub mod body;
pub mod loader;
pub mod registry;
pub mod scanner;

pub use body::SkillBody;
pub use loader::{Skill, SkillHeader, SkillOrigin, NO_DESCRIPTION};
pub use registry::{SkillRegistry, SkillSearchPath};
pub use scanner::{resolve_entry, scan_root, Resolved};
