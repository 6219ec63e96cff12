use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}

/// `{commit count}.{short sha}` plus `.dirty` when the worktree has changes.
fn build_ref() -> String {
    let Some(sha) = git(&["rev-parse", "--short", "HEAD"]) else {
        return "0.nogit".to_string();
    };
    let count = git(&["rev-list", "--count", "HEAD"]).unwrap_or_else(|| "0".to_string());
    let dirty = git(&["status", "--porcelain"]).map_or(false, |changes| !changes.is_empty());
    format!("{}.{}{}", count, sha, if dirty { ".dirty" } else { "" })
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rustc-env=TASKS_BUILD_REF={}", build_ref());
}
