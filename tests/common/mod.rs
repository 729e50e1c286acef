#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub use assetdag_test_utils::{init_tracing, with_timeout};

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Every file below `root`, keyed by forward-slash relative path.
pub fn snapshot_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    if !root.exists() {
        return out;
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    out
}

/// A small front-end project: one script, two styles (one partial), a view
/// and two resources.
pub fn sample_project(root: &Path) {
    write_file(root, "src/scripts/main.js", "console.log('app');\n");
    write_file(root, "src/styles/main.styl", "body\n  color red\n");
    write_file(root, "src/styles/_vars.styl", "primary = red\n");
    write_file(root, "src/views/index.jade", "html\n  body\n");
    write_file(root, "src/resources/logo.svg", "<svg/>");
    write_file(root, "src/resources/robots.txt", "User-agent: *\n");
    write_file(root, "test/app.test.js", "test('ok', () => {});\n");
}
