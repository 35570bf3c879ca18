// src/resolver.rs
use log::debug;
use path_absolutize::Absolutize;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;

/// 探索しないディレクトリ
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", "target", "coverage"];

/// ルーター定義として扱う拡張子
const SOURCE_EXTENSIONS: &[&str] = &["ts", "js", "mts", "mjs"];

/// プロジェクトルートを絶対パス化する。ディレクトリでなければ NotFound
pub fn absolutize_root(project_root: &Path) -> Result<PathBuf> {
    let abs = project_root.absolutize()?.to_path_buf();
    if !abs.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("project root is not a directory: {}", abs.display()),
        )
        .into());
    }
    Ok(abs)
}

/// `project_root` 以下からルーター定義ファイルを探す
///
/// 対象になるファイル名:
/// - `router.ts`, `routes.ts`
/// - `admin.routes.ts`, `admin-routes.ts`
/// - `router/index.ts`
///
/// 戻り値はソート・重複除去済みの絶対パス。
pub fn resolve_router_files(project_root: &Path) -> Result<Vec<PathBuf>> {
    let root = absolutize_root(project_root)?;
    let mut found = Vec::new();

    let walker = WalkDir::new(&root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && is_router_file(entry.path()) {
            debug!("ルーター定義ファイル候補: {}", entry.path().display());
            found.push(entry.into_path());
        }
    }

    found.sort();
    found.dedup();
    Ok(found)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn is_router_file(path: &Path) -> bool {
    let has_source_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
    if !has_source_ext {
        return false;
    }

    // 型定義・テストファイルは除外
    let Some(fname) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if fname.ends_with(".d.ts") || fname.contains(".spec.") || fname.contains(".test.") {
        return false;
    }

    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };

    if stem == "router" || stem == "routes" || stem.ends_with(".routes") || stem.ends_with("-routes") {
        return true;
    }

    // router/index.ts
    stem == "index"
        && path
            .parent()
            .and_then(|p| p.file_name())
            .is_some_and(|dir| dir == "router")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_file_names() {
        assert!(is_router_file(Path::new("/p/src/router.ts")));
        assert!(is_router_file(Path::new("/p/src/routes.js")));
        assert!(is_router_file(Path::new("/p/src/admin.routes.ts")));
        assert!(is_router_file(Path::new("/p/src/admin-routes.mjs")));
        assert!(is_router_file(Path::new("/p/src/router/index.ts")));

        assert!(!is_router_file(Path::new("/p/src/index.ts")));
        assert!(!is_router_file(Path::new("/p/src/router.d.ts")));
        assert!(!is_router_file(Path::new("/p/src/router.spec.ts")));
        assert!(!is_router_file(Path::new("/p/src/routes.json")));
        assert!(!is_router_file(Path::new("/p/src/router.vue")));
    }
}
