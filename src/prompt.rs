//! 選択されたスキルを1つのシステムプロンプトにまとめる

use crate::skills::SkillBody;

/// プロンプト先頭の固定文
pub const PREAMBLE: &str = "# Preloaded Skills\n\n\
The user deliberately preloaded the following skills before starting this session. \
They are not suggestions: treat their instructions as active guidance and follow them \
for the rest of the conversation.";

const RULE: &str = "\n\n---\n\n";

/// スキル本文と補助ファイルを選択順に連結する
///
/// 内容はエスケープせずにそのまま埋め込む。
pub fn assemble(bodies: &[SkillBody]) -> String {
    let mut prompt = String::from(PREAMBLE);

    for body in bodies {
        prompt.push_str(RULE);
        prompt.push_str(&format!(
            "## Skill: {} ({})\n\n",
            body.skill.name, body.skill.origin
        ));
        prompt.push_str(&body.primary_text);

        for (filename, text) in &body.auxiliary_files {
            prompt.push_str(RULE);
            prompt.push_str(&format!("### Reference: {}\n\n", filename));
            prompt.push_str(text);
        }
    }

    prompt
}
