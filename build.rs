//! Build script: embeds the git hash and pre-checks GPU toolkits.
//!
//! When a GPU feature is enabled, verify the toolkit exists before
//! whisper-rs-sys starts compiling, so the failure is readable.

use std::process::Command;

fn main() {
    // Embed git short hash for version string
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=GIT_HASH={}", hash);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");

    if cfg!(feature = "cuda") {
        require_tool("nvcc", "CUDA toolkit", "https://developer.nvidia.com/cuda-downloads");
    }
    if cfg!(feature = "vulkan") {
        require_tool("vulkaninfo", "Vulkan SDK", "https://vulkan.lunarg.com/");
    }
    if cfg!(feature = "hipblas") {
        require_tool("rocminfo", "ROCm", "https://rocm.docs.amd.com/");
    }
    if cfg!(feature = "openblas") {
        check_openblas();
    }
}

fn require_tool(binary: &str, toolkit: &str, url: &str) {
    if Command::new(binary).arg("--version").output().is_err() {
        panic!(
            "\n`{}` not found — {} is not installed.\n\
             Install: {}\n\
             Or build without it: cargo build --release\n",
            binary, toolkit, url
        );
    }
    println!("cargo::warning={} detected", toolkit);
}

fn check_openblas() {
    let pkg_config_ok = Command::new("pkg-config")
        .args(["--exists", "openblas"])
        .status()
        .is_ok_and(|s| s.success());

    if !pkg_config_ok {
        let lib_exists = std::path::Path::new("/usr/lib/x86_64-linux-gnu/libopenblas.so").exists()
            || std::path::Path::new("/usr/lib/libopenblas.so").exists()
            || std::path::Path::new("/usr/lib64/libopenblas.so").exists();

        if !lib_exists {
            panic!(
                "\nOpenBLAS not found.\n\
                 Install: sudo apt install libopenblas-dev\n\
                 Or build without it: cargo build --release\n",
            );
        }
    }
    println!("cargo::warning=OpenBLAS detected");
}
