// Stamps the binary with a version derived from `git describe`.
//
// A release tag `vX.Y.Z` is used as is. Any other checkout reports the crate
// version plus the describe output as build metadata. Without git the crate
// version is used alone.

use std::process::Command;

fn main() {
    let package = env!("CARGO_PKG_VERSION");
    let version = match describe() {
        Some(desc) => version_from_describe(package, &desc),
        None => package.to_string(),
    };

    println!("cargo:rustc-env=BLOCKTRACE_VERSION={}", version);
    for path in [".git/HEAD", ".git/refs/heads", ".git/refs/tags"] {
        println!("cargo:rerun-if-changed={}", path);
    }
}

fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn version_from_describe(package: &str, desc: &str) -> String {
    match desc.strip_prefix('v') {
        Some(tag) if !tag.contains('-') => tag.to_string(),
        // vX.Y.Z-N-gHASH[-dirty]
        Some(tagged) => {
            let (tag, rest) = tagged.split_once('-').unwrap_or((tagged, ""));
            format!("{}+{}", tag, rest.replace('-', "."))
        }
        None => format!("{}+{}", package, desc.replace('-', ".")),
    }
}
