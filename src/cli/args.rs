use clap::Parser;

/// skillpick 自身が解釈するフラグ
const OWN_FLAGS: &[&str] = &["-h", "--help", "-V", "--version", "-l", "--list", "--clear-recent"];

/// コマンドライン引数
///
/// 知らないフラグは拒否せずに外部プロセスへ渡す。`--` 以降も同様。
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "skillpick")]
#[command(about = "Pick skills and launch the assistant with them preloaded")]
#[command(version)]
#[command(override_usage = "skillpick [OPTIONS] [ARGS]... [-- ARGS...]")]
#[command(after_help = "\
Unrecognized arguments, and everything after `--`, are passed to the assistant.
Set SKILLPICK_DANGEROUS=1 to launch with permission prompts disabled.")]
pub struct Args {
    /// 発見したスキルを一覧表示して終了
    #[arg(short, long)]
    pub list: bool,

    /// 最近使ったスキルの記録を削除して終了
    #[arg(long)]
    pub clear_recent: bool,

    /// 外部プロセスにそのまま渡す引数
    #[arg(skip)]
    pub passthrough: Vec<String>,
}

impl Args {
    /// プロセスの引数を解析する（エラー時はclapの表示で終了）
    pub fn parse_from_env() -> Self {
        let argv = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
        Self::try_parse_args(argv).unwrap_or_else(|e| e.exit())
    }

    /// 引数を自身のフラグと外部プロセス向けの引数に振り分けて解析する
    ///
    /// 自身のフラグは `--` までならどの位置でも認識する。
    /// 先頭要素はプログラム名として扱う。
    pub fn try_parse_args<I, S>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv.next().unwrap_or_else(|| "skillpick".to_string());

        let mut own = vec![program];
        let mut passthrough = Vec::new();
        while let Some(arg) = argv.next() {
            if arg == "--" {
                passthrough.extend(argv.by_ref());
                break;
            }
            if OWN_FLAGS.contains(&arg.as_str()) {
                own.push(arg);
            } else {
                passthrough.push(arg);
            }
        }

        let mut args = Self::try_parse_from(own)?;
        args.passthrough = passthrough;
        Ok(args)
    }
}
