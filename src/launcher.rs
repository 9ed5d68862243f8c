//! 外部アシスタントプロセスの起動
//!
//! 組み立てたシステムプロンプトと引数を渡して子プロセスを起動し、
//! 終了コードをそのまま返す。

use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

use crate::config::{LaunchMode, LauncherConfig};

/// 起動エラー
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to listen for interrupts: {source}")]
    Signal {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// プロセス実行トレイト
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// コマンドを実行して終了コードを返す
    async fn run(&self, program: &str, args: &[String]) -> Result<i32, LaunchError>;
}

/// 子プロセス実行中に親が受けた割り込み（Ctrl+C）
///
/// 端末の割り込みは同じプロセスグループの子にも届く。親は受け流して子の終了を待つ。
struct Interrupts {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
}

impl Interrupts {
    /// 子プロセスを起動する前に登録する
    fn listen() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                signal: signal(SignalKind::interrupt())?,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        let received = self.signal.recv().await.is_some();
        #[cfg(not(unix))]
        let received = tokio::signal::ctrl_c().await.is_ok();

        if !received {
            std::future::pending::<()>().await;
        }
    }
}

/// 標準入出力を引き継いで子プロセスを実行する
#[derive(Debug, Default)]
pub struct InheritRunner;

#[async_trait]
impl ProcessRunner for InheritRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<i32, LaunchError> {
        let mut interrupts =
            Interrupts::listen().map_err(|source| LaunchError::Signal { source })?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: program.to_string(),
                source,
            })?;

        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                _ = interrupts.recv() => {
                    tracing::debug!("Interrupt received, waiting for {} to exit", program);
                }
            }
        };
        let status = status.map_err(|source| LaunchError::Wait {
            command: program.to_string(),
            source,
        })?;

        // シグナル終了などコードが無い場合は失敗扱い
        Ok(status.code().unwrap_or(1))
    }
}

/// ランチャー
pub struct Launcher<R: ProcessRunner = InheritRunner> {
    config: LauncherConfig,
    mode: LaunchMode,
    runner: R,
}

impl Launcher<InheritRunner> {
    pub fn new(config: LauncherConfig, mode: LaunchMode) -> Self {
        Self::with_runner(config, mode, InheritRunner)
    }
}

impl<R: ProcessRunner> Launcher<R> {
    pub fn with_runner(config: LauncherConfig, mode: LaunchMode, runner: R) -> Self {
        Self {
            config,
            mode,
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// 子プロセスに渡す引数を組み立てる
    pub fn build_args(&self, system_prompt: Option<&str>, passthrough: &[String]) -> Vec<String> {
        let mut args = Vec::with_capacity(passthrough.len() + 3);

        if self.mode.is_dangerous() {
            args.push(self.config.dangerous_flag.clone());
        }
        if let Some(prompt) = system_prompt {
            args.push(self.config.system_prompt_flag.clone());
            args.push(prompt.to_string());
        }
        args.extend(passthrough.iter().cloned());

        args
    }

    /// 子プロセスを起動して終了を待つ
    pub async fn launch(
        &self,
        system_prompt: Option<&str>,
        passthrough: &[String],
    ) -> Result<i32, LaunchError> {
        let args = self.build_args(system_prompt, passthrough);
        tracing::info!(
            "Launching {} with {} argument(s) (mode: {:?})",
            self.config.command,
            args.len(),
            self.mode
        );

        self.runner.run(&self.config.command, &args).await
    }
}
