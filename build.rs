//! Build script: embeds the git hash and checks GPU toolkits.
//!
//! whisper-rs-sys fails deep inside its cmake build when a GPU toolkit is
//! missing; a warning here points at the cause first.

use std::process::Command;

fn main() {
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

    let checks: [(&str, bool, &str, &[&str], &str); 4] = [
        (
            "cuda",
            cfg!(feature = "cuda"),
            "nvcc",
            &["--version"],
            "install the CUDA toolkit: https://developer.nvidia.com/cuda-downloads",
        ),
        (
            "vulkan",
            cfg!(feature = "vulkan"),
            "glslc",
            &["--version"],
            "install the Vulkan SDK (glslc is required by whisper.cpp)",
        ),
        (
            "hipblas",
            cfg!(feature = "hipblas"),
            "hipconfig",
            &["--version"],
            "install ROCm: https://rocm.docs.amd.com",
        ),
        (
            "openblas",
            cfg!(feature = "openblas"),
            "pkg-config",
            &["--exists", "openblas"],
            "install OpenBLAS (e.g. libopenblas-dev)",
        ),
    ];

    for (feature, enabled, program, args, hint) in checks {
        if enabled && !tool_succeeds(program, args) {
            println!("cargo::warning=feature `{feature}` enabled but `{program}` check failed");
            println!("cargo::warning={hint}");
        }
    }
}

fn tool_succeeds(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}
