use std::env;
use std::path::PathBuf;

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

/// Where vcpkg would have installed FFmpeg, if `VCPKG_ROOT` is set.
fn vcpkg_ffmpeg_dir() -> Option<PathBuf> {
    let root = env::var_os("VCPKG_ROOT")?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    Some(PathBuf::from(root).join("installed").join(triplet))
}

/// Point Windows builds at a vcpkg FFmpeg install when one can be found.
fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(ffmpeg_dir) = vcpkg_ffmpeg_dir() else {
        println!(
            "cargo:warning=vidsplit needs FFmpeg development libraries. On Windows, install them with vcpkg and set VCPKG_ROOT and FFMPEG_DIR."
        );
        return;
    };

    if !ffmpeg_dir.exists() {
        println!(
            "cargo:warning=No FFmpeg under {}; run `vcpkg install ffmpeg` for this triplet.",
            ffmpeg_dir.display(),
        );
        return;
    }

    println!(
        "cargo:warning=Found vcpkg FFmpeg at {}. Export FFMPEG_DIR={} so ffmpeg-sys-next links against it.",
        ffmpeg_dir.display(),
        ffmpeg_dir.display(),
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!("cargo:warning=Set VCPKGRS_DYNAMIC=1 if the vcpkg FFmpeg was built as DLLs.");
    }
}
