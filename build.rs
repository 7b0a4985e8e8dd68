use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    // `--dirty=+` appends a plus sign when the worktree has local edits
    let stamp = Command::new("git")
        .args(["describe", "--always", "--dirty=+"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .unwrap_or_else(|| "untracked".to_string());

    println!("cargo:rustc-env=BUILD_REV={stamp}");
}
