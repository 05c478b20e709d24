use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=ROCM_PATH");
    println!("cargo:rustc-check-cfg=cfg(hip_channel_bindings)");

    // Host-only builds (dummy runtime) never touch the ROCm toolchain
    if env::var_os("CARGO_FEATURE_ROCM").is_none() {
        return;
    }

    let rocm_root = env::var("ROCM_PATH").unwrap_or_else(|_| "/opt/rocm".to_string());
    println!("cargo:rustc-link-search=native={}/lib", rocm_root);
    println!("cargo:rustc-link-lib=dylib=amdhip64");

    #[cfg(feature = "rocm")]
    generate_hip_bindings(&rocm_root);
}

#[cfg(feature = "rocm")]
fn generate_hip_bindings(rocm_root: &str) {
    use std::path::PathBuf;

    let hip_header = format!("{}/include/hip/hip_runtime_api.h", rocm_root);
    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());

    if !PathBuf::from(&hip_header).exists() {
        println!(
            "cargo:warning=HIP header not found at {}, skipping FFI layout bindings",
            hip_header
        );
        return;
    }

    let bindings = bindgen::Builder::default()
        .header(&hip_header)
        .clang_arg("-D__HIP_PLATFORM_AMD__")
        .clang_arg(format!("-I{}/include", rocm_root))
        // Only the descriptor layout is checked against the C header
        .allowlist_type("hipChannelFormatDesc")
        .allowlist_type("hipChannelFormatKind")
        .use_core()
        .derive_debug(true)
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .generate()
        .expect("Unable to generate HIP bindings");

    bindings
        .write_to_file(out_path.join("hip_channel_bindings.rs"))
        .expect("Couldn't write HIP bindings!");
    println!("cargo:rustc-cfg=hip_channel_bindings");
}
