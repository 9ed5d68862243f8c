//! スキルディレクトリの走査
//!
//! ルート直下のエントリだけを見て、マニフェストファイルの位置を列挙する。
//! シンボリックリンクは解決してから判定し、解決できないリンクは黙って飛ばす。

use std::path::{Path, PathBuf};
use tokio::fs;

/// シンボリックリンク解決の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// 実体のパス
    Path(PathBuf),
    /// リンク切れなど
    Unresolvable,
}

/// エントリを解決（リンクでなければそのまま返す）
pub async fn resolve_entry(path: &Path) -> Resolved {
    let is_symlink = match fs::symlink_metadata(path).await {
        Ok(meta) => meta.file_type().is_symlink(),
        Err(_) => return Resolved::Unresolvable,
    };

    if !is_symlink {
        return Resolved::Path(path.to_path_buf());
    }

    match fs::canonicalize(path).await {
        Ok(target) => Resolved::Path(target),
        Err(e) => {
            tracing::debug!("Skipping unresolvable link {}: {}", path.display(), e);
            Resolved::Unresolvable
        }
    }
}

/// ルートディレクトリ直下からマニフェストを探す
///
/// ルートが存在しない・読めない場合は空を返す。結果はファイル名順。
pub async fn scan_root(root: &Path, manifest_name: &str) -> Vec<PathBuf> {
    let mut manifests = Vec::new();

    let mut entries = match fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read skill directory {}: {}", root.display(), e);
            }
            return manifests;
        }
    };

    let mut children = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => children.push(entry.path()),
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Error while listing {}: {}", root.display(), e);
                break;
            }
        }
    }
    children.sort();

    for path in children {
        let target = match resolve_entry(&path).await {
            Resolved::Path(target) => target,
            Resolved::Unresolvable => continue,
        };

        if target.is_dir() {
            // リンク名のまま辿ることでディレクトリ名をスキル名に使える
            let manifest = path.join(manifest_name);
            if manifest.is_file() {
                manifests.push(manifest);
            }
        } else if target.is_file()
            && path.file_name().and_then(|n| n.to_str()) == Some(manifest_name)
        {
            manifests.push(path);
        }
    }

    manifests
}
