// Embed git hash and compiler version for run metadata. Both optional;
// missing tools just leave the fields at "unknown".
fn main() {
    if let Ok(output) = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
    {
        if output.status.success() {
            if let Ok(s) = String::from_utf8(output.stdout) {
                let hash = s.trim();
                println!("cargo:rustc-env=VGBENCH_GIT_HASH={hash}");
            }
        }
    }

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_owned());
    if let Ok(output) = std::process::Command::new(rustc).arg("--version").output() {
        if output.status.success() {
            if let Ok(s) = String::from_utf8(output.stdout) {
                let version = s.trim();
                println!("cargo:rustc-env=VGBENCH_RUSTC_VERSION={version}");
            }
        }
    }
}
